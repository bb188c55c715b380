//! # Quill
//!
//! A declarative command framework. Commands are written in a small
//! brace-nested DSL and bound by name to plain Rust functions.
//!
//! ## Overview
//!
//! ```text
//! give int:amount player:target?(context self) {
//!     permission example.give
//!     help Gives items
//!     hook give
//! }
//! ```
//!
//! The definition above declares `/give`, its arguments, who may run it and
//! which function handles it. Quill parses it into a command tree, matches
//! incoming tokens against the declared arguments, converts them through the
//! registered argument types and calls the bound function.
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌─────────┐     ┌─────────────┐
//! │ input line  │────▶│ CommandManager │────▶│ Matcher │────▶│ hook "give" │
//! │ "/give 5 x" │     │ (roots)        │     │ (types) │     │ fn give(..) │
//! └─────────────┘     └────────────────┘     └─────────┘     └─────────────┘
//! ```
//!
//! - **Core**: actors, values, argument types, context providers, tokenizer
//! - **Framework**: parser, matcher, dispatcher, help and completion
//! - **Runtime**: command manager, configuration, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quill::prelude::*;
//!
//! fn give(actor: &dyn Actor, amount: i32, target: Option<String>) -> String {
//!     format!("Gave {amount} to {}", target.as_deref().unwrap_or("yourself"))
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let manager = CommandManager::new("example");
//!     let hooks = HookTable::new().hook("give", give);
//!     manager.load_file("commands.txt", &[&hooks])?;
//!
//!     manager.execute_line(&my_actor, "/give 5 Steve");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `testing`: the recording actor from `quill_core::testing`

pub use quill_core as core;
pub use quill_framework as framework;
pub use quill_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use quill::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use quill_runtime::{CommandManager, QuillConfig, load_config};

    // Actors and values
    pub use quill_core::{Actor, FromValue, SenderKind, Value};

    // Application types and context
    pub use quill_core::{ArgType, ContextProvider};

    // Handlers
    pub use quill_framework::{CommandResponse, HandlerError, HandlerResult, HookTable};

    // Custom dispatch
    pub use quill_framework::{CommandNode, Dispatcher, Messages};
}
