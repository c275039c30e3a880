use serde::{Deserialize, Serialize};

pub const DEFAULT_DESIGNATED_DIR: &str = ".flowdeck";
pub const DEFAULT_PROGRAM: &str = "flowdeck";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub watch: WatchConfig,
    pub launch: LaunchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory name looked up under every root.
    pub designated_dir: String,
    /// Accepted definition file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Subset of `extensions` decoded as JSON; everything else is YAML.
    pub json_extensions: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            designated_dir: DEFAULT_DESIGNATED_DIR.to_owned(),
            extensions: vec!["json".to_owned(), "yaml".to_owned(), "yml".to_owned()],
            json_extensions: vec!["json".to_owned()],
        }
    }
}

impl RegistryConfig {
    pub fn accepts_extension(&self, ext: &str) -> bool {
        contains_extension(&self.extensions, ext)
    }

    pub fn is_json_extension(&self, ext: &str) -> bool {
        contains_extension(&self.json_extensions, ext)
    }
}

// Configured extensions may carry stray whitespace; matching ignores it and case.
fn contains_extension(list: &[String], ext: &str) -> bool {
    let ext = ext.trim();
    list.iter()
        .any(|accepted| accepted.trim().eq_ignore_ascii_case(ext))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LaunchConfig {
    /// Program invoked with the definition path when a record has no `command`.
    pub default_program: String,
    pub title_prefix: String,
    pub wait_for_exit: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            default_program: DEFAULT_PROGRAM.to_owned(),
            title_prefix: DEFAULT_PROGRAM.to_owned(),
            wait_for_exit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}
