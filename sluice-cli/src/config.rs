//! Configuration module
//!
//! Combines the global flags with the engine settings from the environment.

use anyhow::{Context, Result};
use sluice_engine::EngineConfig;
use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the data collector
    pub collector_url: String,
    /// Engine settings, flags taking precedence over the environment
    pub engine: EngineConfig,
    /// File the list preferences are kept in
    pub preferences_path: PathBuf,
}

impl Config {
    pub fn new(
        collector_url: String,
        page_size: Option<usize>,
        timeout_secs: Option<u64>,
        preferences_path: Option<PathBuf>,
    ) -> Result<Self> {
        let mut engine = EngineConfig::from_env();
        if let Some(page_size) = page_size {
            engine = engine.with_page_size(page_size);
        }
        if let Some(secs) = timeout_secs {
            engine = engine.with_request_timeout(Duration::from_secs(secs));
        }
        engine.validate().context("Invalid engine configuration")?;

        let preferences_path = match preferences_path {
            Some(path) => path,
            None => default_preferences_path()?,
        };

        Ok(Self {
            collector_url,
            engine,
            preferences_path,
        })
    }
}

/// `<config dir>/sluice/preferences.json`, falling back to the home directory
fn default_preferences_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .context("Could not determine the user configuration directory")?;

    path.push("sluice");
    path.push("preferences.json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_engine_defaults() {
        let config = Config::new(
            "http://collector:18630".to_string(),
            Some(20),
            Some(3),
            Some(PathBuf::from("/tmp/prefs.json")),
        )
        .unwrap();

        assert_eq!(config.engine.page_size, 20);
        assert_eq!(config.engine.request_timeout, Duration::from_secs(3));
        assert_eq!(config.preferences_path, PathBuf::from("/tmp/prefs.json"));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let result = Config::new(
            "http://collector:18630".to_string(),
            Some(0),
            None,
            Some(PathBuf::from("/tmp/prefs.json")),
        );

        assert!(result.is_err());
    }
}
