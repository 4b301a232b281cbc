//! Configuration for the analyzer driver.
//!
//! Layered: defaults, then a `joosc.toml` in the working directory, then
//! `JOOSC_*` environment variables. Nested keys use double underscores:
//! `JOOSC_LOGGING__DEFAULT=debug` sets `logging.default`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "joosc.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Directory holding the standard-library sources, analyzed before any
    /// user input.
    #[serde(default = "default_stdlib_path")]
    pub stdlib_path: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level; `RUST_LOG` takes precedence at runtime.
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `link = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_stdlib_path() -> PathBuf {
    PathBuf::from("stdlib")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stdlib_path: default_stdlib_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("JOOSC_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.stdlib_path, PathBuf::from("stdlib"));
        assert_eq!(settings.logging.default, "warn");
        assert!(settings.logging.modules.is_empty());
    }

    #[test]
    fn serializes_to_toml() {
        let rendered = toml::to_string(&Settings::default()).unwrap();
        assert!(rendered.contains("stdlib_path"));
        assert!(rendered.contains("[logging]"));
    }
}
