//! Configuration management for marketo-client.
//!
//! This module handles loading, saving, and validating the TOML configuration
//! file holding instance profiles and application settings.

mod profile;
mod settings;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use profile::Profile;
pub use settings::Settings;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "MARKETO_CLIENT_CONFIG";

/// Application directory name under the platform config directory.
const APP_DIR: &str = "marketo-client";

/// Configuration file name.
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while handling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The configuration directory could not be created.
    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The configuration file could not be written.
    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The configuration is well-formed but invalid.
    #[error("invalid configuration: {0}")]
    ValidationError(String),

    /// The requested profile does not exist.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The full configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Application settings.
    #[serde(default)]
    pub settings: Settings,
    /// Configured instances.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// The configuration file path.
    ///
    /// Honors `MARKETO_CLIENT_CONFIG`, otherwise
    /// `<config dir>/marketo-client/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if no config directory is available.
    pub fn path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load and validate the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a specific file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(ConfigError::WriteError)?;
        debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Validate all profiles and their relationships.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for invalid or duplicate
    /// profiles, or a default profile that does not exist.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !names.insert(profile.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(default) = &self.settings.default_profile {
            if !names.contains(default.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "default profile '{}' is not defined",
                    default
                )));
            }
        }

        Ok(())
    }

    /// Resolve a profile by name, falling back to the default, then to the
    /// only profile when exactly one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ProfileNotFound` if no profile matches.
    pub fn profile(&self, name: Option<&str>) -> Result<&Profile> {
        let wanted = name.or(self.settings.default_profile.as_deref());

        match wanted {
            Some(wanted) => self
                .profiles
                .iter()
                .find(|p| p.name == wanted)
                .ok_or_else(|| ConfigError::ProfileNotFound(wanted.to_string())),
            None => match self.profiles.as_slice() {
                [only] => Ok(only),
                _ => Err(ConfigError::ProfileNotFound("<default>".to_string())),
            },
        }
    }
}
