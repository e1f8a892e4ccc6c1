// File: src/config.rs
// Purpose: Validator configuration parsing from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Validator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Field tag key holding the rule string (default: "validate")
    #[serde(default = "default_tag_name")]
    pub tag_name: String,

    /// Apply a leading `required` to non-optional record fields
    #[serde(default)]
    pub required_struct_enabled: bool,

    /// Skip records already on the traversal stack
    #[serde(default)]
    pub detect_cycles: bool,

    /// Idle scratch buffers kept for reuse
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Alias name to tag string, registered at construction
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn default_tag_name() -> String {
    "validate".to_string()
}

fn default_pool_capacity() -> usize {
    16
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tag_name: default_tag_name(),
            required_struct_enabled: false,
            detect_cycles: false,
            pool_capacity: default_pool_capacity(),
            aliases: BTreeMap::new(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read validator config: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse validator config: {:?}", path))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ValidatorConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidatorConfig::default();
        assert_eq!(config.tag_name, "validate");
        assert!(!config.required_struct_enabled);
        assert!(!config.detect_cycles);
        assert_eq!(config.pool_capacity, 16);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_empty_config() {
        let config = ValidatorConfig::from_toml_str("  \n").unwrap();
        assert_eq!(config, ValidatorConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            tag_name = "binding"
            detect_cycles = true

            [aliases]
            username = "required,min=3,max=32"
        "#;
        let config = ValidatorConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.tag_name, "binding");
        assert!(config.detect_cycles);
        assert_eq!(config.pool_capacity, 16);
        assert_eq!(config.aliases["username"], "required,min=3,max=32");
    }

    #[test]
    fn test_invalid_config() {
        assert!(ValidatorConfig::from_toml_str("pool_capacity = \"many\"").is_err());
    }
}
