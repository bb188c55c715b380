//! # Quill Framework
//!
//! The command pipeline of the Quill command framework.
//!
//! This layer provides:
//! - Definition parser turning the brace-nested DSL into [`CommandNode`] trees
//! - Argument and flag model attached to each node
//! - Matcher resolving tokens against declared arguments, including the choice
//!   of which optional arguments a short input fills
//! - Handler trait and [`HookTable`] for binding hook names to functions
//! - Dispatcher walking the tree with permission, sender-kind and help
//!   fallbacks, plus the completion walker over the same tree
//!
//! The framework is synchronous and holds no per-invocation state outside the
//! call stack; registered trees are shared read-only.

pub mod argument;
pub mod completion;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod help;
pub mod matcher;
pub mod messages;
pub mod node;
pub mod parser;
pub mod registration;

pub use argument::{Argument, DefaultValue, FLAG_MARKER, Flag};
pub use completion::complete;
pub use dispatcher::{Dispatcher, HELP_LITERAL};
pub use error::{
    DefinitionError, DefinitionErrorKind, DefinitionResult, HandlerError, HandlerResult,
    RegistrationError, RegistrationResult,
};
pub use handler::{BoxedHandler, CommandResponse, ErasedHandler, Handler, HookTable, into_handler};
pub use help::help_lines;
pub use matcher::{MatchOutcome, match_arguments};
pub use messages::Messages;
pub use node::CommandNode;
pub use parser::{DefinitionParser, parse};
pub use registration::bind_hooks;
