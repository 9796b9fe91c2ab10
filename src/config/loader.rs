//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::schema::Config;
use super::{defaults, paths};
use crate::analysis::MAX_EXPLORE_DEPTH;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Explicit config file (`--config`)
    /// 3. Root config
    /// 4. Built-in defaults
    ///
    /// Command-line flags are applied on top by the caller.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let config = Self::load_layers(&paths::root_config_path(), explicit)?;
        let config = Self::apply_env_overrides(config);

        tracing::debug!(
            "Configuration loaded: depth={}, threshold={}, maxDepth={}",
            config.explore.depth,
            config.retain.threshold,
            config.retain.max_depth
        );

        Ok(config)
    }

    /// Merge the defaults, the root file and the explicit file
    ///
    /// Only keys a file actually sets override the layers below it.
    fn load_layers(root_path: &Path, explicit: Option<&Path>) -> Result<Config> {
        let mut merged = serde_yaml::to_value(Self::load_defaults())
            .context("Failed to serialize default configuration")?;

        if root_path.exists() {
            match Self::load_layer(root_path) {
                Ok(layer) => merge_values(&mut merged, layer),
                Err(e) => tracing::warn!("Ignoring root config: {:#}", e),
            }
        }

        // An explicitly requested file must load
        if let Some(path) = explicit {
            merge_values(&mut merged, Self::load_layer(path)?);
        }

        serde_yaml::from_value(merged).context("Failed to merge configuration layers")
    }

    /// Read one file as a raw layer, checking that it fits the schema
    fn load_layer(path: &Path) -> Result<Value> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let layer: Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if layer.is_null() {
            return Ok(layer);
        }

        serde_yaml::from_value::<Config>(layer.clone())
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(layer)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration by loading and checking for errors
    ///
    /// This performs strict validation - it will fail on:
    /// - Invalid YAML syntax or value types in the root or explicit file
    /// - Out-of-range depth, zero threshold or zero maximum traversal depth
    /// - File read errors
    pub fn validate(explicit: Option<&Path>) -> Result<()> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            let config = Self::load_file(&root_path)?;
            Self::check_values(&config)
                .with_context(|| format!("Invalid config file: {}", root_path.display()))?;
        }

        let config = Self::load(explicit).context("Failed to load merged configuration")?;
        Self::check_values(&config)
    }

    /// Check that numeric settings are in range
    pub fn check_values(config: &Config) -> Result<()> {
        if config.explore.depth == 0 || config.explore.depth > MAX_EXPLORE_DEPTH {
            return Err(anyhow::anyhow!(
                "explore.depth must be between 1 and {}",
                MAX_EXPLORE_DEPTH
            ));
        }
        if config.retain.threshold == 0 {
            return Err(anyhow::anyhow!("retain.threshold must be at least 1"));
        }
        if config.retain.max_depth == 0 {
            return Err(anyhow::anyhow!("retain.maxDepth must be at least 1"));
        }
        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        // HEAPTRACE_TARGET_KIND override
        if let Ok(kind) = std::env::var("HEAPTRACE_TARGET_KIND") {
            config.explore.target_kind = Some(kind);
        }

        // HEAPTRACE_SENTINEL_KIND override
        if let Ok(kind) = std::env::var("HEAPTRACE_SENTINEL_KIND") {
            config.retain.sentinel_kind = Some(kind);
        }

        // HEAPTRACE_DEPTH override
        if let Ok(depth) = std::env::var("HEAPTRACE_DEPTH") {
            match depth.parse::<usize>() {
                Ok(val) => config.explore.depth = val,
                Err(_) => tracing::warn!("Ignoring HEAPTRACE_DEPTH={}: not a number", depth),
            }
        }

        // HEAPTRACE_THRESHOLD override
        if let Ok(threshold) = std::env::var("HEAPTRACE_THRESHOLD") {
            match threshold.parse::<usize>() {
                Ok(val) => config.retain.threshold = val,
                Err(_) => {
                    tracing::warn!("Ignoring HEAPTRACE_THRESHOLD={}: not a number", threshold)
                }
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

/// Overlay `layer` onto `base`, key by key
///
/// Mappings merge recursively; null values leave `base` untouched.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Mapping(base), Value::Mapping(layer)) => {
            for (key, value) in layer {
                if value.is_null() {
                    continue;
                }
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}
