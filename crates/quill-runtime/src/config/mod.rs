//! Configuration for the Quill runtime.
//!
//! Layered loading through figment: built-in defaults, then TOML/YAML files,
//! then `QUILL_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CommandsConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, QuillConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
