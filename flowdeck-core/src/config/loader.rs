use std::path::Path;

use crate::config::schema::Config;
use crate::config::validation::validate_config;
use crate::error::{Error, Result};

pub const ENV_DESIGNATED_DIR: &str = "FLOWDECK_DESIGNATED_DIR";
pub const ENV_DEFAULT_PROGRAM: &str = "FLOWDECK_DEFAULT_PROGRAM";
pub const ENV_POLL_INTERVAL_MS: &str = "FLOWDECK_POLL_INTERVAL_MS";
pub const ENV_LOG_LEVEL: &str = "FLOWDECK_LOG_LEVEL";

pub fn load_from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::Config(format!("failed to read config '{}': {err}", path.display()))
    })?;

    toml::from_str(&content).map_err(|err| {
        Error::Config(format!(
            "failed to parse config '{}': {err}",
            path.display()
        ))
    })
}

/// Loads the config file when one is given, applies environment overrides and
/// validates the result.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let base = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };
    let config = load_from_env(base)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_from_env(config: Config) -> Result<Config> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    };

    if let Some(value) = read(ENV_DESIGNATED_DIR) {
        config.registry.designated_dir = value;
    }
    if let Some(value) = read(ENV_DEFAULT_PROGRAM) {
        config.launch.default_program = value;
    }
    if let Some(value) = read(ENV_POLL_INTERVAL_MS) {
        config.watch.poll_interval_ms = value.parse().map_err(|err| {
            Error::Config(format!(
                "{ENV_POLL_INTERVAL_MS} must be an integer, got '{value}': {err}"
            ))
        })?;
    }
    if let Some(value) = read(ENV_LOG_LEVEL) {
        config.logging.level = value;
    }

    Ok(config)
}

/// Every field of `overlay` that differs from the default replaces the one in `base`.
pub fn merge(base: Config, overlay: Config) -> Config {
    let defaults = Config::default();
    let mut merged = base;

    if overlay.registry.designated_dir != defaults.registry.designated_dir {
        merged.registry.designated_dir = overlay.registry.designated_dir;
    }
    if overlay.registry.extensions != defaults.registry.extensions {
        merged.registry.extensions = overlay.registry.extensions;
    }
    if overlay.registry.json_extensions != defaults.registry.json_extensions {
        merged.registry.json_extensions = overlay.registry.json_extensions;
    }
    if overlay.watch.enabled != defaults.watch.enabled {
        merged.watch.enabled = overlay.watch.enabled;
    }
    if overlay.watch.poll_interval_ms != defaults.watch.poll_interval_ms {
        merged.watch.poll_interval_ms = overlay.watch.poll_interval_ms;
    }
    if overlay.launch.default_program != defaults.launch.default_program {
        merged.launch.default_program = overlay.launch.default_program;
    }
    if overlay.launch.title_prefix != defaults.launch.title_prefix {
        merged.launch.title_prefix = overlay.launch.title_prefix;
    }
    if overlay.launch.wait_for_exit != defaults.launch.wait_for_exit {
        merged.launch.wait_for_exit = overlay.launch.wait_for_exit;
    }
    if overlay.logging.level != defaults.logging.level {
        merged.logging.level = overlay.logging.level;
    }

    merged
}
