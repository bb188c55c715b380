//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML configuration files (`quill.toml`)
//! - `yaml-config`: enables YAML configuration files (`quill.yaml`, `quill.yml`)
//!
//! Both can be enabled at once; both formats are then searched.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides passed to [`ConfigLoader::merge`]
//! 3. Main config file (`quill.toml` / `quill.yaml`), or the file given to
//!    [`ConfigLoader::file`]
//! 4. Profile variant next to the main file (`quill.{profile}.toml`)
//! 5. Environment variables (`QUILL_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `QUILL_` prefix with `__` as the separator:
//!
//! - `QUILL_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `QUILL_COMMANDS__FALLBACK_PREFIX=srv` → `commands.fallback_prefix = "srv"`
//! - `QUILL_MESSAGES__NO_PERMISSION="Nope."` → `messages.no_permission = "Nope."`
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::QuillConfig;
use super::validation::validate_config;

/// Environment variable prefix.
const ENV_PREFIX: &str = "QUILL_";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the usual short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `QUILL_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("QUILL_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides.
    figment: Figment,
    profile: Profile,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files. Without any, the current
    /// directory and the user config directory are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: QuillConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<QuillConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: QuillConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            files = config.commands.files.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(QuillConfig::default()));

        let overrides = std::mem::take(&mut self.figment);
        figment = figment.merge(overrides);

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment)?;
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Merges a single config file, dispatching on its extension. Only
    /// extensions enabled via feature flags are accepted.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("quill"));
        }
        paths
    }

    /// The first `base_names` match on the search paths, followed by its
    /// `{stem}.{profile}.{ext}` variant when one sits next to it.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn find_files(&self, search_paths: &[PathBuf], base_names: &[&str]) -> Vec<PathBuf> {
        for dir in search_paths {
            for base_name in base_names {
                let mut files = Vec::new();
                let base = dir.join(base_name);
                if base.is_file() {
                    files.push(base);
                }
                if let Some((stem, ext)) = base_name.rsplit_once('.') {
                    let profiled = dir.join(format!("{stem}.{}.{ext}", self.profile));
                    if profiled.is_file() {
                        files.push(profiled);
                    }
                }
                if !files.is_empty() {
                    return files;
                }
            }
        }
        Vec::new()
    }

    fn load_config_files(&self, mut figment: Figment) -> ConfigResult<Figment> {
        let search_paths = self.resolve_search_paths();
        #[allow(unused_mut)]
        let mut found: Vec<PathBuf> = Vec::new();

        #[cfg(feature = "toml-config")]
        found.extend(self.find_files(&search_paths, &["quill.toml"]));
        #[cfg(feature = "yaml-config")]
        found.extend(self.find_files(&search_paths, &["quill.yaml", "quill.yml"]));

        if found.is_empty() {
            warn!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        for path in &found {
            debug!(path = %path.display(), "Merging configuration file");
            figment = Self::merge_config_file(figment, path)?;
        }
        Ok(figment)
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<QuillConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<QuillConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config, QuillConfig::default());
            assert_eq!(config.commands.fallback_prefix, "quill");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("QUILL_LOGGING__LEVEL", "debug");
            jail.set_env("QUILL_COMMANDS__FALLBACK_PREFIX", "srv");
            jail.set_env("QUILL_MESSAGES__NO_PERMISSION", "Nope.");
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.commands.fallback_prefix, "srv");
            assert_eq!(config.messages.no_permission, "Nope.");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("QUILL_COMMANDS__FALLBACK_PREFIX", "has space");
            let result = ConfigLoader::new().search_path(jail.directory()).load();
            assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/definitely/not/here/quill.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_and_profile() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "quill.toml",
                r#"
                    [logging]
                    level = "debug"

                    [commands]
                    fallback_prefix = "srv"
                    files = ["commands.txt"]

                    [messages]
                    help_header = "-- Help --"
                "#,
            )?;
            jail.create_file(
                "quill.production.toml",
                r#"
                    [logging]
                    level = "warn"
                "#,
            )?;
            let config = ConfigLoader::new()
                .profile("production")
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.commands.fallback_prefix, "srv");
            assert_eq!(config.commands.files, vec![PathBuf::from("commands.txt")]);
            assert_eq!(config.messages.help_header.as_deref(), Some("-- Help --"));
            assert_eq!(config.logging.level, LogLevel::Warn);
            Ok(())
        });
    }
}
