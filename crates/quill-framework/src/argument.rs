//! The argument model attached to each command node.
//!
//! - [`Argument`]: a typed, ordered positional slot
//! - [`Flag`]: an order-independent `-f`/`--flag` option
//! - [`DefaultValue`]: what an omitted optional argument or flag receives

use std::fmt;

use quill_core::{Actor, ArgType, ContextProvider, Value};

/// Prefix that marks a token as a flag.
pub const FLAG_MARKER: char = '-';

/// The value an omitted optional argument or flag receives.
#[derive(Clone)]
pub enum DefaultValue {
    /// A literal converted once, when the definition was parsed.
    Literal(Value),
    /// A context provider evaluated against the actor at match time.
    Context(ContextProvider),
}

impl DefaultValue {
    /// Resolves the default for `actor`. A context default may be absent.
    pub fn resolve(&self, actor: &dyn Actor) -> Option<Value> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Context(provider) => provider.supply(actor),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Context(provider) => f.debug_tuple("Context").field(&provider.name()).finish(),
        }
    }
}

/// A positional argument declaration.
#[derive(Clone, Debug)]
pub struct Argument {
    pub(crate) ty: ArgType,
    pub(crate) name: String,
    pub(crate) position: usize,
    pub(crate) optional: bool,
    pub(crate) variadic: bool,
    pub(crate) hide_type: bool,
    pub(crate) default: Option<DefaultValue>,
}

impl Argument {
    pub fn ty(&self) -> &ArgType {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based index among the node's positional arguments.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns `true` if the argument absorbs all remaining tokens.
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn hides_type(&self) -> bool {
        self.hide_type
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Value for an omitted optional argument.
    pub fn default_for(&self, actor: &dyn Actor) -> Option<Value> {
        self.default.as_ref().and_then(|d| d.resolve(actor))
    }

    /// Signature fragment used in usage and help lines: `<amount:int>`,
    /// `[target:player]`, `<message:string...>`.
    pub fn display(&self) -> String {
        let mut label = if self.hide_type {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, self.ty.name())
        };
        if self.variadic {
            label.push_str("...");
        }
        if self.optional {
            format!("[{label}]")
        } else {
            format!("<{label}>")
        }
    }
}

/// A flag declaration. Flags are always optional and never variadic.
#[derive(Clone, Debug)]
pub struct Flag {
    pub(crate) ty: ArgType,
    pub(crate) names: Vec<String>,
    pub(crate) position: usize,
    pub(crate) hide_type: bool,
    pub(crate) default: Option<DefaultValue>,
}

impl Flag {
    pub fn ty(&self) -> &ArgType {
        &self.ty
    }

    /// The primary name, including its marker (`--force`).
    pub fn name(&self) -> &str {
        &self.names[0]
    }

    /// The primary name followed by its aliases.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Zero-based index among the node's flags.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` for boolean flags, which take no value token and are
    /// `true` when present.
    pub fn is_switch(&self) -> bool {
        self.ty.is_boolean()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn matches(&self, token: &str) -> bool {
        self.names.iter().any(|name| name == token)
    }

    /// Value for an absent flag: its declared default, `false` for a switch,
    /// otherwise absent.
    pub fn default_for(&self, actor: &dyn Actor) -> Option<Value> {
        match &self.default {
            Some(default) => default.resolve(actor),
            None if self.is_switch() => Some(Value::Bool(false)),
            None => None,
        }
    }

    /// Signature fragment: `[--force]` or `[--amount:int]`.
    pub fn display(&self) -> String {
        if self.is_switch() || self.hide_type {
            format!("[{}]", self.name())
        } else {
            format!("[{}:{}]", self.name(), self.ty.name())
        }
    }
}
