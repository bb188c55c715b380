//! Runtime error types.

use std::path::PathBuf;

use quill_core::RegistryError;
use quill_framework::{DefinitionError, RegistrationError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while loading and registering commands.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// A definition file could not be read.
    #[error("Failed to read command definitions from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition source is malformed.
    #[error("Invalid command definition in {origin}, {source}")]
    Definition {
        /// File path, or `<inline>` for string sources.
        origin: String,
        #[source]
        source: DefinitionError,
    },

    /// A hook could not be bound.
    #[error("Failed to register commands: {0}")]
    Registration(#[from] RegistrationError),

    /// A type or context provider name clash.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
