//! Engine configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest node nesting the compiler accepts.
    pub max_depth: usize,
    /// Turn panics during evaluation into a logged null result.
    pub catch_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            catch_panics: true,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn from_json_str(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EngineConfig::from_yaml_str("max_depth: 16").unwrap();
        assert_eq!(config.max_depth, 16);
        assert!(config.catch_panics);
    }

    #[test]
    fn test_json() {
        let config = EngineConfig::from_json_str(r#"{"catch_panics": false}"#).unwrap();
        assert_eq!(
            config,
            EngineConfig {
                max_depth: 256,
                catch_panics: false
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(EngineConfig::from_yaml_str("max_depth: deep").is_err());
    }
}
