//! Quill Runtime - the embedding layer of the Quill command framework.
//!
//! This crate provides:
//! - The [`CommandManager`], which owns the type and context registries and
//!   the registered command roots
//! - Layered configuration ([`QuillConfig`]) loaded through figment
//! - Logging setup over `tracing-subscriber`
//!
//! # Quick Start
//!
//! ```ignore
//! use quill_runtime::{CommandManager, load_config, logging};
//! use quill_framework::HookTable;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let manager = CommandManager::from_config(&config);
//!     let hooks = HookTable::new().hook("ping", |_: &dyn Actor| "Pong!");
//!     manager.load_files(&config.commands.files, &[&hooks])?;
//!
//!     manager.execute_line(&console, "/ping");
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `toml-config`: read `quill.toml`
//! - `yaml-config`: read `quill.yaml` / `quill.yml`
//! - `json-log`: the `json` log format

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;

// Re-exports
pub use config::{
    CommandsConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, Profile, QuillConfig,
    load_config, load_config_from_file,
};
pub use error::{ManagerError, ManagerResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use manager::{CommandManager, PREFIX_SEPARATOR};

pub use tracing;
pub use tracing_subscriber;
