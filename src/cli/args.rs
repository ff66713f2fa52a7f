//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Template morphing CLI
#[derive(Parser, Debug, Clone)]
#[command(name = "morph", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: morph.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = crate::config::CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Morph control attributes in template files
    #[command(visible_alias = "t")]
    Transform {
        #[command(flatten)]
        args: TransformArgs,
    },

    /// List the active morph rules in registry order
    #[command(visible_alias = "r")]
    Rules {
        /// Print rules as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Transform command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct TransformArgs {
    /// Template files or directories. Directories are walked for files
    /// with a configured template extension.
    #[arg(value_name = "PATH", required = true, value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Write results into this directory, mirroring the input layout.
    /// Without it, a single input file is printed to stdout.
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Only report templates that would change; exit with an error if any would
    #[arg(short, long, conflicts_with = "output")]
    pub check: bool,
}
