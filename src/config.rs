use crate::cache::CacheOptions;
use crate::errors::{CompilerError, Result};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compiler configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Cache tuning
    pub cache: CacheOptions,

    /// Reject duplicate explicit rule names instead of replacing
    pub strict_rule_names: bool,

    /// Active theme scales
    pub theme: Theme,
}

impl CompilerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CompilerError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        serde_yaml::from_str(&content).map_err(|e| CompilerError::ConfigError {
            message: format!("Failed to parse YAML config: {}", e),
        })
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CompilerError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| CompilerError::ConfigError {
            message: format!("Failed to parse JSON config: {}", e),
        })
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CompilerError::ConfigError {
                message: format!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }

    /// Merge with another configuration; `other`'s scalar settings win
    /// and its theme scales overlay this one's.
    pub fn merge(mut self, other: Self) -> Self {
        self.cache = other.cache;
        self.strict_rule_names = self.strict_rule_names || other.strict_rule_names;

        self.theme.colors.extend(other.theme.colors);
        self.theme.spacing.extend(other.theme.spacing);
        self.theme.font_family.extend(other.theme.font_family);

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_size, 1000);
        assert!(config.cache.ttl_ms.is_none());
        assert!(!config.strict_rule_names);
    }

    #[test]
    fn test_yaml_config_loading() {
        let yaml_content = r##"
cache:
  max_size: 50
  ttl_ms: 60000
strict_rule_names: true
theme:
  colors:
    primary: "#1a73e8"
  spacing:
    "4": "1rem"
"##;

        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(yaml_content.as_bytes()).unwrap();

        let config = CompilerConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.cache.max_size, 50);
        assert_eq!(config.cache.ttl_ms, Some(60000));
        assert!(config.strict_rule_names);
        assert_eq!(config.theme.color("primary"), Some("#1a73e8"));
    }

    #[test]
    fn test_json_config_loading() {
        let json_content = r##"{
  "cache": { "max_size": 10, "enabled": false },
  "theme": { "colors": { "brand": "#0066cc" } }
}"##;

        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let config = CompilerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.cache.max_size, 10);
        assert!(!config.cache.enabled);
        assert_eq!(config.theme.color("brand"), Some("#0066cc"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = NamedTempFile::with_suffix(".toml").unwrap();
        let err = CompilerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CompilerError::ConfigError { .. }));
    }

    #[test]
    fn test_config_merge() {
        let mut base = CompilerConfig::default();
        base.theme
            .colors
            .insert("primary".to_string(), "#111".to_string());

        let mut other = CompilerConfig::default();
        other.cache.max_size = 5;
        other
            .theme
            .colors
            .insert("primary".to_string(), "#222".to_string());
        other
            .theme
            .colors
            .insert("secondary".to_string(), "#333".to_string());

        let merged = base.merge(other);
        assert_eq!(merged.cache.max_size, 5);
        assert_eq!(merged.theme.color("primary"), Some("#222"));
        assert_eq!(merged.theme.color("secondary"), Some("#333"));
    }
}
