//! # Quill Core
//!
//! The core building blocks shared by every layer of the Quill command
//! framework.
//!
//! This crate knows nothing about the definition language or the command tree.
//! It provides:
//!
//! - **Actors**: the [`Actor`] trait through which the framework talks to
//!   whoever invoked a command, and the [`SenderKind`] restriction model
//! - **Values**: the dynamically typed [`Value`] produced by argument
//!   conversion and the [`FromValue`] trait used to hand values to handlers
//! - **Types**: the [`TypeRegistry`] mapping type names to converters and
//!   completion suppliers
//! - **Context providers**: named [`ContextProvider`]s that derive a value from
//!   the acting entity
//! - **Tokenizer**: quote and escape aware splitting of raw input lines
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_core::{ArgType, TypeRegistry, Value};
//!
//! let mut types = TypeRegistry::new();
//! types.register(
//!     ArgType::new("color", |_, token| match token {
//!         "red" | "green" | "blue" => Some(Value::from(token)),
//!         _ => None,
//!     })
//!     .with_completions(|_| vec!["red".into(), "green".into(), "blue".into()]),
//! )?;
//! ```

pub mod actor;
pub mod context;
pub mod error;
pub mod tokenizer;
pub mod types;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use actor::{Actor, SenderKind};
pub use context::{ContextProvider, ContextProviders, SupplyFn};
pub use error::{RegistryError, RegistryResult, ValueError};
pub use tokenizer::{quote_if_needed, tokenize, tokenize_for_completion};
pub use types::{ArgType, CompleteFn, ConvertFn, TypeRegistry};
pub use value::{FromValue, Value};
