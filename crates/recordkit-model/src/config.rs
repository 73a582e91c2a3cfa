//! Builder configuration

use serde::{Deserialize, Serialize};

/// Options applied when compiling a model type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Check values against declared field kinds on create and derive
    pub check_kinds: bool,
    /// Maximum number of fields per model type
    pub max_fields: usize,
}

impl BuilderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With kind checking enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_check_kinds(mut self, check_kinds: bool) -> Self {
        self.check_kinds = check_kinds;
        self
    }

    /// With field limit
    #[inline]
    #[must_use]
    pub fn with_max_fields(mut self, max_fields: usize) -> Self {
        self.max_fields = max_fields;
        self
    }

    /// Parse from a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the document is not valid TOML or has mistyped keys
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            check_kinds: true,
            max_fields: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuilderConfig::new();
        assert!(config.check_kinds);
        assert_eq!(config.max_fields, 256);
    }

    #[test]
    fn toml_partial_override() {
        let config = BuilderConfig::from_toml_str("check_kinds = false").unwrap();
        assert!(!config.check_kinds);
        assert_eq!(config.max_fields, 256);
    }

    #[test]
    fn toml_rejects_mistyped_key() {
        assert!(BuilderConfig::from_toml_str("max_fields = \"many\"").is_err());
    }

    #[test]
    fn builder_methods() {
        let config = BuilderConfig::new().with_check_kinds(false).with_max_fields(4);
        assert_eq!(
            config,
            BuilderConfig {
                check_kinds: false,
                max_fields: 4
            }
        );
    }
}
