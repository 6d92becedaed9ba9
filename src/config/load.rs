use std::{env, path::PathBuf};

use crate::error::ConfigError;

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `CADENZA__`) on top, and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CADENZA")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let volume = self.playback.volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(ConfigError::Invalid(format!(
                "playback.volume must be within 0.0..=1.0, got {volume}"
            )));
        }
        if self.navigation.window_size < 3 {
            return Err(ConfigError::Invalid(
                "navigation.window_size must be >= 3".to_string(),
            ));
        }
        if self.continuation.limit == 0 {
            return Err(ConfigError::Invalid(
                "continuation.limit must be >= 1".to_string(),
            ));
        }
        if self.continuation.resume_limit_factor == 0 {
            return Err(ConfigError::Invalid(
                "continuation.resume_limit_factor must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate settings; any failure falls back to defaults.
    ///
    /// Configuration is optional, so a broken file must not keep playback
    /// from starting.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(s) => match s.validate() {
                Ok(()) => s,
                Err(e) => {
                    tracing::warn!("invalid config, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to load config, using defaults: {e}");
                Self::default()
            }
        }
    }
}

/// Resolve the config path from `CADENZA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CADENZA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/cadenza/config.toml`
/// or `~/.config/cadenza/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("cadenza").join("config.toml"))
}
