//! Configuration management for `morph.toml`.
//!
//! # Sections
//!
//! | Section           | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | `[morph]`         | enable flag, merge mode, template extensions   |
//! | `[[morph.rules]]` | custom rules (`name`, `pattern`)               |
//!
//! ```toml
//! [morph]
//! mode = "merge"
//! extensions = ["xhtml", "html"]
//!
//! [[morph.rules]]
//! name = "with"
//! pattern = "<?r %expression.tap do |_w| ?>%content<?r end ?>"
//! ```
//!
//! A missing config file is not an error: the built-in rules apply.

mod error;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use util::{find_config_file, find_config_file_from};

use crate::morph::{ConfigureMode, MorphRule, Morpher};
use crate::pipeline::Pipeline;
use crate::{debug, log};
use anyhow::Result;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "morph.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing morph.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MorphConfig {
    /// Absolute path to the config file, empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Morph stage settings
    #[serde(default)]
    pub morph: MorphSection,
}

/// `[morph]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphSection {
    /// Run the morph stage at all
    pub enable: bool,

    /// How `rules` combine with the built-in rules
    pub mode: ConfigureMode,

    /// File extensions treated as templates when walking directories
    pub extensions: Vec<String>,

    /// Custom rules, in registry order
    pub rules: Vec<MorphRule>,
}

impl Default for MorphSection {
    fn default() -> Self {
        Self {
            enable: true,
            mode: ConfigureMode::Merge,
            extensions: vec!["xhtml".into(), "html".into()],
            rules: Vec::new(),
        }
    }
}

impl MorphConfig {
    /// Load configuration, searching upward from cwd for `config_name`.
    ///
    /// Falls back to the default configuration when no file is found.
    pub fn load(config_name: &Path) -> Result<Self> {
        match find_config_file(config_name) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                Ok(config)
            }
            None => {
                debug!("config"; "{} not found, using built-in rules", config_name.display());
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Check rule names: non-empty, no whitespace or `=`, unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        let mut seen = FxHashSet::default();

        for (i, rule) in self.morph.rules.iter().enumerate() {
            let field = format!("morph.rules[{i}].name");
            if rule.name.is_empty() {
                diag.error_with_hint(field, "rule name is empty", "set it to the attribute name, e.g. `if`");
            } else if rule.name.contains(|c: char| c.is_whitespace() || c == '=') {
                diag.error(field, format!("invalid attribute name `{}`", rule.name));
            } else if !seen.insert(rule.name.as_str()) {
                diag.error(field, format!("duplicate rule `{}`", rule.name));
            }
        }

        diag.into_result()
    }

    /// Morpher with the built-in rules adjusted by this configuration.
    pub fn morpher(&self) -> Morpher {
        let mut morpher = Morpher::new();
        morpher.configure(self.morph.rules.iter().cloned(), self.morph.mode);
        morpher
    }

    /// Transform pipeline; empty when the morph stage is disabled.
    pub fn pipeline(&self) -> Pipeline {
        if self.morph.enable {
            Pipeline::standard(self.morpher())
        } else {
            Pipeline::new()
        }
    }

    /// Whether `path` has one of the configured template extensions.
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.morph.extensions.iter().any(|e| e == ext))
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule_names(config: &MorphConfig) -> Vec<String> {
        config
            .morpher()
            .rules()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = MorphConfig::from_str("").unwrap();
        assert!(config.morph.enable);
        assert_eq!(config.morph.mode, ConfigureMode::Merge);
        assert_eq!(rule_names(&config), ["if", "unless", "for", "each", "times"]);
    }

    #[test]
    fn test_merge_rules() {
        let config = MorphConfig::from_str(
            r#"
            [[morph.rules]]
            name = "with"
            pattern = "<?r %expression.tap do |_w| ?>%content<?r end ?>"

            [[morph.rules]]
            name = "if"
            pattern = "{% if %expression %}%content{% endif %}"
            "#,
        )
        .unwrap();

        assert_eq!(
            rule_names(&config),
            ["if", "unless", "for", "each", "times", "with"]
        );
        let morpher = config.morpher();
        assert_eq!(
            morpher.rules().get("if").unwrap().pattern,
            "{% if %expression %}%content{% endif %}"
        );
    }

    #[test]
    fn test_replace_rules() {
        let config = MorphConfig::from_str(
            r#"
            [morph]
            mode = "replace"

            [[morph.rules]]
            name = "show"
            pattern = "<?r if %expression ?>%content<?r end ?>"
            "#,
        )
        .unwrap();
        assert_eq!(rule_names(&config), ["show"]);
    }

    #[test]
    fn test_empty_replace_disables_rules() {
        let config = MorphConfig::from_str("[morph]\nmode = \"replace\"\n").unwrap();
        assert!(config.morpher().rules().is_empty());
    }

    #[test]
    fn test_disabled_pipeline() {
        let config = MorphConfig::from_str("[morph]\nenable = false\n").unwrap();
        assert!(config.pipeline().is_empty());
        assert!(!MorphConfig::default().pipeline().is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let err = MorphConfig::from_str(
            r#"
            [[morph.rules]]
            name = ""
            pattern = "%content"

            [[morph.rules]]
            name = "data if"
            pattern = "%content"

            [[morph.rules]]
            name = "x"
            pattern = "%content"

            [[morph.rules]]
            name = "x"
            pattern = "%content"
            "#,
        )
        .unwrap_err();

        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err:?}");
        };
        let fields: Vec<_> = diag.errors().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            ["morph.rules[0].name", "morph.rules[1].name", "morph.rules[3].name"]
        );
    }

    #[test]
    fn test_bad_toml() {
        assert!(MorphConfig::from_str("[morph\n").is_err());
        assert!(MorphConfig::from_str("[morph]\nmode = \"sideways\"\n").is_err());
    }

    #[test]
    fn test_from_path_with_unknown_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[morph]\nextensions = [\"rhtml\"]\ncolour = \"blue\"\n",
        )
        .unwrap();

        let config = MorphConfig::from_path(&path).unwrap();
        assert_eq!(config.morph.extensions, ["rhtml"]);
        assert!(config.is_template(Path::new("views/index.rhtml")));
        assert!(!config.is_template(Path::new("views/index.xhtml")));
    }

    #[test]
    fn test_from_path_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = MorphConfig::from_path(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Io(..))
        ));
    }

    #[test]
    fn test_is_template_default_extensions() {
        let config = MorphConfig::default();
        assert!(config.is_template(Path::new("view/index.xhtml")));
        assert!(config.is_template(Path::new("layout.html")));
        assert!(!config.is_template(Path::new("style.css")));
        assert!(!config.is_template(Path::new("README")));
    }
}
