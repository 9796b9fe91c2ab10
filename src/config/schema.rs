//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use crate::analysis::retain::DEFAULT_MAX_DEPTH;
use crate::report::OutputFormat;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Predecessor explorer settings
    #[serde(default)]
    pub explore: ExploreConfig,

    /// Retainer analyzer settings
    #[serde(default)]
    pub retain: RetainConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Predecessor explorer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExploreConfig {
    /// Kind whose retainers are explored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_kind: Option<String>,

    /// Predecessor levels below each target closure
    #[serde(default = "default_depth")]
    pub depth: usize,
}

/// Retainer analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetainConfig {
    /// Kind counted as retained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel_kind: Option<String>,

    /// Reachable sentinel count at which a closure is flagged
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Longest traversal path before the run is aborted
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Report format (text or json)
    #[serde(default)]
    pub format: OutputFormat,
}

// Default value functions
fn default_depth() -> usize {
    3
}

fn default_threshold() -> usize {
    32
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            target_kind: None,
            depth: default_depth(),
        }
    }
}

impl Default for RetainConfig {
    fn default() -> Self {
        Self {
            sentinel_kind: None,
            threshold: default_threshold(),
            max_depth: default_max_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.explore.depth, 3);
        assert_eq!(config.retain.threshold, 32);
        assert_eq!(config.retain.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.explore.target_kind.is_none());
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("maxDepth"));
        assert!(yaml.contains("threshold"));
        assert!(!yaml.contains("sentinelKind"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
explore:
  targetKind: PersistentTCSt_con_info
retain:
  sentinelKind: PragmaOptions_con_info
  threshold: 8
output:
  format: json
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.explore.target_kind.as_deref(),
            Some("PersistentTCSt_con_info")
        );
        assert_eq!(config.explore.depth, 3);
        assert_eq!(config.retain.threshold, 8);
        assert_eq!(config.retain.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.output.format, OutputFormat::Json);
    }
}
