//! Configuration system for heaptrace
//!
//! Layered YAML configuration: built-in defaults, the root config file, an
//! explicit `--config` file, and environment overrides.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, ExploreConfig, OutputConfig, RetainConfig};

/// Configuration keys accepted by `config get` and `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "explore.targetKind",
    "explore.depth",
    "retain.sentinelKind",
    "retain.threshold",
    "retain.maxDepth",
    "output.format",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "explore.targetKind" => Ok(config.explore.target_kind.clone().unwrap_or_default()),
        "explore.depth" => Ok(config.explore.depth.to_string()),
        "retain.sentinelKind" => Ok(config.retain.sentinel_kind.clone().unwrap_or_default()),
        "retain.threshold" => Ok(config.retain.threshold.to_string()),
        "retain.maxDepth" => Ok(config.retain.max_depth.to_string()),
        "output.format" => Ok(config.output.format.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
///
/// An empty value clears the optional kind settings.
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "explore.targetKind" => {
            config.explore.target_kind = (!value.is_empty()).then(|| value.to_string());
        }
        "explore.depth" => {
            config.explore.depth = value.parse().context("explore.depth must be a number")?;
        }
        "retain.sentinelKind" => {
            config.retain.sentinel_kind = (!value.is_empty()).then(|| value.to_string());
        }
        "retain.threshold" => {
            config.retain.threshold = value
                .parse()
                .context("retain.threshold must be a number")?;
        }
        "retain.maxDepth" => {
            config.retain.max_depth = value.parse().context("retain.maxDepth must be a number")?;
        }
        "output.format" => {
            config.output.format = value.parse()?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    loader::ConfigLoader::check_values(config)
}
