//! Argument types and the type registry.
//!
//! Every typed token in a command definition (`int:amount`, `player:target`)
//! names an [`ArgType`]. The [`TypeRegistry`] is built once at startup with
//! the built-in types pre-registered, extended with application types, and
//! then shared read-only while definitions are parsed and commands run.
//!
//! Registering a name twice is an error rather than an override.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::actor::Actor;
use crate::error::{RegistryError, RegistryResult};
use crate::value::Value;

/// Names of the built-in argument types.
pub mod builtin {
    pub const INT: &str = "int";
    pub const DOUBLE: &str = "double";
    pub const LONG: &str = "long";
    pub const STRING: &str = "string";
    pub const BOOLEAN: &str = "boolean";
}

/// A type-erased token converter.
///
/// The actor is `None` when a literal default value is converted while the
/// definition is parsed. Returning `None` means the token does not convert.
pub type ConvertFn = Arc<dyn Fn(Option<&dyn Actor>, &str) -> Option<Value> + Send + Sync>;

/// A type-erased supplier of completion candidates.
pub type CompleteFn = Arc<dyn Fn(&dyn Actor) -> Vec<String> + Send + Sync>;

/// A named argument type: a converter plus an optional completion supplier.
#[derive(Clone)]
pub struct ArgType {
    name: String,
    convert: ConvertFn,
    complete: Option<CompleteFn>,
}

impl ArgType {
    /// Creates a type with the given name and converter.
    pub fn new<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(Option<&dyn Actor>, &str) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            convert: Arc::new(convert),
            complete: None,
        }
    }

    /// Attaches a completion supplier.
    pub fn with_completions<F>(mut self, complete: F) -> Self
    where
        F: Fn(&dyn Actor) -> Vec<String> + Send + Sync + 'static,
    {
        self.complete = Some(Arc::new(complete));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for the built-in `string` type, which loses ties when
    /// several optional arguments could take the same token.
    pub fn is_string(&self) -> bool {
        self.name == builtin::STRING
    }

    /// Returns `true` for the built-in `boolean` type.
    pub fn is_boolean(&self) -> bool {
        self.name == builtin::BOOLEAN
    }

    /// Converts `token`, treating a panicking converter as a failed
    /// conversion.
    pub fn convert(&self, actor: Option<&dyn Actor>, token: &str) -> Option<Value> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.convert)(actor, token))) {
            Ok(value) => value,
            Err(_) => {
                warn!(type_name = %self.name, token, "Argument converter panicked");
                None
            }
        }
    }

    /// Returns completion candidates for `actor`, or nothing if the type has
    /// no supplier.
    pub fn complete(&self, actor: &dyn Actor) -> Vec<String> {
        let Some(complete) = &self.complete else {
            return Vec::new();
        };
        match panic::catch_unwind(AssertUnwindSafe(|| complete(actor))) {
            Ok(candidates) => candidates,
            Err(_) => {
                warn!(type_name = %self.name, "Completion supplier panicked");
                Vec::new()
            }
        }
    }
}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgType")
            .field("name", &self.name)
            .field("completes", &self.complete.is_some())
            .finish_non_exhaustive()
    }
}

/// Returns `true` if `name` can appear on the left of `type:name`.
fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | ',' | '(' | ')' | '{' | '}'))
}

/// Lookup table from type names to [`ArgType`]s.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    types: HashMap<String, ArgType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry holding the built-in types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for ty in builtin_types() {
            registry.types.insert(ty.name.clone(), ty);
        }
        registry
    }

    /// Creates a registry without any types.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Adds an application type.
    ///
    /// Fails if the name is already taken (including by a built-in) or cannot
    /// be written in a definition.
    pub fn register(&mut self, ty: ArgType) -> RegistryResult<()> {
        if !is_valid_type_name(&ty.name) {
            return Err(RegistryError::InvalidName {
                what: "type",
                name: ty.name,
            });
        }
        if self.types.contains_key(&ty.name) {
            return Err(RegistryError::DuplicateType(ty.name));
        }
        debug!(type_name = %ty.name, "Registered argument type");
        self.types.insert(ty.name.clone(), ty);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, ty: ArgType) -> RegistryResult<Self> {
        self.register(ty)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ArgType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn builtin_types() -> Vec<ArgType> {
    vec![
        ArgType::new(builtin::INT, |_, token| token.parse::<i32>().ok().map(Value::Int)),
        ArgType::new(builtin::LONG, |_, token| {
            token.parse::<i64>().ok().map(Value::Long)
        }),
        ArgType::new(builtin::DOUBLE, |_, token| {
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Double)
        }),
        ArgType::new(builtin::STRING, |_, token| Some(Value::from(token))),
        ArgType::new(builtin::BOOLEAN, |_, token| {
            if token.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if token.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        })
        .with_completions(|_| vec!["true".to_string(), "false".to_string()]),
    ]
}
