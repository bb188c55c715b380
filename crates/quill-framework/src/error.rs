//! Error types for the Quill framework.

use quill_core::ValueError;
use thiserror::Error;

/// A malformed command definition.
///
/// Always carries the one-based line of the offending text. The first error
/// aborts the whole parse; no partial tree is returned.
#[derive(Debug, Clone, Error)]
#[error("line {line}: {kind}")]
pub struct DefinitionError {
    /// One-based line number.
    pub line: usize,
    /// What went wrong.
    pub kind: DefinitionErrorKind,
}

impl DefinitionError {
    pub(crate) fn new(line: usize, kind: DefinitionErrorKind) -> Self {
        Self { line, kind }
    }
}

/// The reason a definition was rejected.
#[derive(Debug, Clone, Error)]
pub enum DefinitionErrorKind {
    /// A `type:name` token names a type that is not registered.
    #[error("unknown argument type '{0}'")]
    UnknownType(String),

    /// A token that is not a valid `type:name` pair.
    #[error("malformed argument '{0}'")]
    MalformedArgument(String),

    /// A default value with unbalanced parentheses.
    #[error("unbalanced parenthesis in '{0}'")]
    UnbalancedParenthesis(String),

    /// A literal default the argument's type cannot convert.
    #[error("default value '{value}' is not a valid {type_name}")]
    InvalidDefault {
        /// The literal.
        value: String,
        /// The argument's type.
        type_name: String,
    },

    /// A `context`, `assert` or `(context ...)` name with no provider.
    #[error("unknown context provider '{0}'")]
    UnknownProvider(String),

    /// A variadic argument followed by further positional arguments.
    #[error("variadic argument '{0}' must be the last argument")]
    VariadicNotLast(String),

    /// A flag carrying `?` or `...`.
    #[error("flag '{0}' cannot be marked optional or variadic")]
    DecoratedFlag(String),

    /// A block header without a command name.
    #[error("command block has no name")]
    MissingName,

    /// A tag that requires a value was given none.
    #[error("tag '{0}' requires a value")]
    MissingValue(String),

    /// An unrecognised tag inside a block.
    #[error("unknown tag '{0}'")]
    UnknownTag(String),

    /// A `users` value other than player, console or everyone.
    #[error("unknown sender kind '{0}'")]
    UnknownSenderKind(String),

    /// A `}` with no open block.
    #[error("unexpected '}}'")]
    UnexpectedClose,

    /// End of input inside a block.
    #[error("block opened here is never closed")]
    UnclosedBlock,

    /// A block was requested past the end of the input.
    #[error("expected a command block, found end of input")]
    MissingBlock,

    /// Text outside any command block.
    #[error("expected a command block, found '{0}'")]
    OutsideBlock(String),
}

/// Result type for definition parsing.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// A hook that could not be bound while registering a command tree.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    /// No hook table supplies the named hook.
    #[error("command '{command}' (line {line}) uses hook '{hook}', which no handler table provides")]
    MissingHook {
        /// Expanded name of the node.
        command: String,
        /// The hook name.
        hook: String,
        /// Line of the node's block header.
        line: usize,
    },

    /// The handler takes a different number of parameters than the node
    /// supplies.
    #[error(
        "hook '{hook}' for command '{command}' takes {found} parameters, but the definition supplies {expected}"
    )]
    ArityMismatch {
        /// Expanded name of the node.
        command: String,
        /// The hook name.
        hook: String,
        /// Actor + arguments + flags + context values.
        expected: usize,
        /// The handler's parameter count.
        found: usize,
    },
}

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// A failure raised while running a bound handler.
///
/// These never propagate out of the dispatcher: they are logged and the actor
/// receives a generic failure message.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// A matched value could not be converted to the parameter type.
    #[error("parameter {index}: {source}")]
    Parameter {
        /// Zero-based parameter index, not counting the actor.
        index: usize,
        /// The conversion failure.
        source: ValueError,
    },

    /// The handler returned an error.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Creates a failure with the given message.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Result type for handler invocation.
pub type HandlerResult<T> = Result<T, HandlerError>;
