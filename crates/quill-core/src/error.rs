//! Error types for the Quill core.
//!
//! Errors raised while parsing definitions or dispatching commands live in
//! `quill-framework`; this module only covers the registries and value
//! extraction.

use thiserror::Error;

/// Errors raised while populating a [`TypeRegistry`](crate::TypeRegistry) or
/// [`ContextProviders`](crate::ContextProviders).
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// An argument type with the same name is already registered.
    #[error("argument type '{0}' is already registered")]
    DuplicateType(String),

    /// A context provider with the same name is already registered.
    #[error("context provider '{0}' is already registered")]
    DuplicateProvider(String),

    /// The name is empty or contains characters the definition language
    /// cannot express.
    #[error("invalid {what} name '{name}'")]
    InvalidName {
        /// What was being named ("type" or "context provider").
        what: &'static str,
        /// The rejected name.
        name: String,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised when a matched [`Value`](crate::Value) cannot be handed to a
/// handler parameter.
#[derive(Debug, Clone, Error)]
pub enum ValueError {
    /// A required parameter received no value.
    #[error("missing value")]
    Missing,

    /// The value has a different type than the parameter expects.
    #[error("type mismatch: expected {expected}, got {got}")]
    Mismatch {
        /// Expected parameter type.
        expected: &'static str,
        /// Label of the value that was provided.
        got: &'static str,
    },
}
