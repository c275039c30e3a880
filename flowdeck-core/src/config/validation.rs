use std::collections::HashSet;
use std::path::{Component, Path};

use crate::config::schema::Config;
use crate::error::{Error, Result};

pub fn validate_config(config: &Config) -> Result<()> {
    let designated = config.registry.designated_dir.trim();
    if designated.is_empty() {
        return Err(Error::Validation(
            "registry.designated_dir cannot be empty".to_owned(),
        ));
    }
    let mut components = Path::new(designated).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(Error::Validation(format!(
            "registry.designated_dir '{designated}' must be a single directory name"
        )));
    }

    if config.registry.extensions.is_empty() {
        return Err(Error::Validation(
            "registry.extensions must list at least one extension".to_owned(),
        ));
    }

    let mut seen = HashSet::new();
    for ext in &config.registry.extensions {
        let ext = ext.trim();
        if ext.is_empty() || ext.contains('.') {
            return Err(Error::Validation(format!(
                "registry.extensions entry '{ext}' must be a bare extension without dots"
            )));
        }
        if !seen.insert(ext.to_ascii_lowercase()) {
            return Err(Error::Validation(format!(
                "duplicate registry.extensions entry '{ext}'"
            )));
        }
    }

    for ext in &config.registry.json_extensions {
        if !config.registry.accepts_extension(ext) {
            return Err(Error::Validation(format!(
                "registry.json_extensions entry '{ext}' is not listed in registry.extensions"
            )));
        }
    }

    if config.watch.poll_interval_ms == 0 {
        return Err(Error::Validation(
            "watch.poll_interval_ms must be greater than 0".to_owned(),
        ));
    }

    if config.launch.default_program.trim().is_empty() {
        return Err(Error::Validation(
            "launch.default_program cannot be empty".to_owned(),
        ));
    }

    Ok(())
}
