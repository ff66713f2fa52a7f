//! `morph rules`: print the active rule registry.

use anyhow::Result;

use crate::config::MorphConfig;
use crate::morph::MorphRule;

/// Render rules as aligned `name  pattern` lines.
pub fn format_rules<'a>(rules: impl IntoIterator<Item = &'a MorphRule>) -> String {
    let rules: Vec<_> = rules.into_iter().collect();
    let width = rules.iter().map(|r| r.name.len()).max().unwrap_or(0);

    rules
        .iter()
        .map(|r| format!("{:<width$}  {}", r.name, r.pattern))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Entry point for `morph rules`.
pub fn run_rules(json: bool, config: &MorphConfig) -> Result<()> {
    let morpher = config.morpher();
    let rules = morpher.rules();

    if json {
        let list: Vec<_> = rules.iter().collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else if rules.is_empty() {
        println!("no morph rules configured");
    } else {
        println!("{}", format_rules(rules));
    }
    Ok(())
}
