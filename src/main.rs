//! morph - preprocess templates, turning control attributes into control-flow.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use morpher::cli::{Cli, Commands, rules::run_rules, transform::run_transform};
use morpher::config::MorphConfig;
use morpher::{debug, log, logger};

fn main() {
    if let Err(err) = run() {
        log!("error"; "{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = MorphConfig::load(&cli.config)?;
    if !config.config_path.as_os_str().is_empty() {
        debug!("config"; "loaded {}", config.config_path.display());
    }

    match &cli.command {
        Commands::Transform { args } => run_transform(args, &config),
        Commands::Rules { json } => run_rules(*json, &config),
    }
}
