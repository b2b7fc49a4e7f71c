use std::path::Path;

use serde::Deserialize;

/// How diagnostics that share a line are reduced after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Keep only the first diagnostic (by column) on each line.
    #[default]
    FirstPerLine,
    /// Keep every diagnostic.
    KeepAll,
}

/// Immutable analysis settings, fixed for the lifetime of an `Analyzer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Width of one block indentation level.
    pub indent_width: u32,
    /// Names treated as defined in addition to the Python builtins.
    pub extra_builtins: Vec<String>,
    pub dedup: DedupPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            extra_builtins: Vec::new(),
            dedup: DedupPolicy::default(),
        }
    }
}

pub const DEFAULT_INDENT_WIDTH: u32 = 4;

fn default_indent_width() -> u32 {
    DEFAULT_INDENT_WIDTH
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_indent_width")]
    indent_width: u32,
    #[serde(default)]
    extra_builtins: Vec<String>,
    #[serde(default)]
    dedup: DedupPolicy,
}

/// Errors that can occur when loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    ParseError(String),
    #[error("invalid config: 'indent_width' must be greater than zero")]
    ZeroIndentWidth,
    #[error("invalid config: '{0}' in 'extra_builtins' is not a valid identifier")]
    InvalidBuiltin(String),
}

impl AnalyzerConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if raw.indent_width == 0 {
            return Err(ConfigError::ZeroIndentWidth);
        }
        if let Some(bad) = raw.extra_builtins.iter().find(|name| !is_identifier(name)) {
            return Err(ConfigError::InvalidBuiltin(bad.clone()));
        }

        Ok(Self {
            indent_width: raw.indent_width,
            extra_builtins: raw.extra_builtins,
            dedup: raw.dedup,
        })
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AnalyzerConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.dedup, DedupPolicy::FirstPerLine);
    }

    #[test]
    fn full_config() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
indent_width = 2
extra_builtins = ["app", "request"]
dedup = "keep-all"
"#,
        )
        .unwrap();
        assert_eq!(config.indent_width, 2);
        assert_eq!(config.extra_builtins, vec!["app", "request"]);
        assert_eq!(config.dedup, DedupPolicy::KeepAll);
    }

    #[test]
    fn zero_indent_width_rejected() {
        let err = AnalyzerConfig::from_toml_str("indent_width = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroIndentWidth));
    }

    #[test]
    fn invalid_builtin_rejected() {
        let err = AnalyzerConfig::from_toml_str(r#"extra_builtins = ["not-a-name"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBuiltin(ref name) if name == "not-a-name"));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = AnalyzerConfig::from_toml_str("tab_width = 8").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_dedup_policy_rejected() {
        let err = AnalyzerConfig::from_toml_str(r#"dedup = "sometimes""#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pydiag.toml");
        std::fs::write(&path, "indent_width = 8\n").unwrap();
        let config = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(config.indent_width, 8);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalyzerConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
