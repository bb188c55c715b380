//! Handler system for the Quill framework.
//!
//! Definitions name handlers through `hook <name>` tags. The embedder supplies
//! the functions in a [`HookTable`], and registration binds each hook and
//! checks that the function takes exactly as many parameters as the node
//! supplies.
//!
//! # The Handler Trait
//!
//! [`Handler`] is implemented for every function or closure whose first
//! parameter is `&dyn Actor`, whose remaining 0-16 parameters implement
//! [`FromValue`], and whose return type implements [`CommandResponse`]:
//!
//! ```rust,ignore
//! use quill_framework::HookTable;
//!
//! fn give(actor: &dyn Actor, amount: i32, target: Option<Arc<Player>>) -> String {
//!     format!("Gave {amount} to {}", target.map_or("yourself", |p| p.name()))
//! }
//!
//! let hooks = HookTable::new()
//!     .hook("give", give)
//!     .hook("ping", |_actor: &dyn Actor| "Pong!");
//! ```
//!
//! Parameters are filled in order: positional arguments, then flags, then
//! context values.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use quill_core::{Actor, FromValue, Value};

use crate::error::{HandlerError, HandlerResult};

// ============================================================================
// CommandResponse - Handle handler return values
// ============================================================================

/// A trait for types that can be returned from handlers.
pub trait CommandResponse {
    /// Performs the response's side effects, such as messaging the actor.
    fn respond(self, actor: &dyn Actor) -> HandlerResult<()>;
}

/// Implementation for `()` - no response needed.
impl CommandResponse for () {
    fn respond(self, _actor: &dyn Actor) -> HandlerResult<()> {
        Ok(())
    }
}

/// Implementation for `String` - sends the text to the actor. An empty
/// string sends nothing.
impl CommandResponse for String {
    fn respond(self, actor: &dyn Actor) -> HandlerResult<()> {
        self.as_str().respond(actor)
    }
}

impl CommandResponse for &str {
    fn respond(self, actor: &dyn Actor) -> HandlerResult<()> {
        if !self.is_empty() {
            actor.send_message(self);
        }
        Ok(())
    }
}

/// Implementation for `Option<T>` where T implements CommandResponse.
///
/// On Some, the inner value's response is handled. On None, no action is taken.
impl<T: CommandResponse> CommandResponse for Option<T> {
    fn respond(self, actor: &dyn Actor) -> HandlerResult<()> {
        match self {
            Some(t) => t.respond(actor),
            None => Ok(()),
        }
    }
}

/// Implementation for `Result<T, E>` where T implements CommandResponse.
///
/// On Ok, the inner value's response is handled. On Err, the error becomes a
/// [`HandlerError::Failed`], which the dispatcher logs.
impl<T: CommandResponse, E: fmt::Display> CommandResponse for Result<T, E> {
    fn respond(self, actor: &dyn Actor) -> HandlerResult<()> {
        match self {
            Ok(t) => t.respond(actor),
            Err(e) => Err(HandlerError::Failed(e.to_string())),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for command handlers.
///
/// `T` is a marker tuple of the parameter types after the actor; it only
/// exists to keep the blanket implementations for different arities apart.
pub trait Handler<T>: Send + Sync + 'static {
    /// Parameter count, including the actor.
    const ARITY: usize;

    /// Calls the handler with the matched values.
    fn call(&self, actor: &dyn Actor, args: Vec<Option<Value>>) -> HandlerResult<()>;
}

/// Object-safe view of a [`Handler`], stored on bound nodes.
pub trait ErasedHandler: Send + Sync {
    /// Parameter count, including the actor.
    fn arity(&self) -> usize;

    /// Calls the handler with the matched values.
    fn invoke(&self, actor: &dyn Actor, args: Vec<Option<Value>>) -> HandlerResult<()>;
}

/// A type-erased handler that can be stored in hook tables and nodes.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

struct HandlerFn<H, T> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<H, T> ErasedHandler for HandlerFn<H, T>
where
    H: Handler<T>,
    T: 'static,
{
    fn arity(&self) -> usize {
        H::ARITY
    }

    fn invoke(&self, actor: &dyn Actor, args: Vec<Option<Value>>) -> HandlerResult<()> {
        self.handler.call(actor, args)
    }
}

/// Convert a handler function into a boxed handler.
pub fn into_handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(HandlerFn {
        handler,
        _marker: PhantomData,
    })
}

// ============================================================================
// Handler implementations for functions
// ============================================================================

/// Macro to generate Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<F, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn(&dyn Actor, $($ty,)*) -> Res + Send + Sync + 'static,
            Res: CommandResponse,
            $( $ty: FromValue, )*
        {
            const ARITY: usize = 1 + <[&str]>::len(&[$(stringify!($ty)),*]);

            fn call(&self, actor: &dyn Actor, args: Vec<Option<Value>>) -> HandlerResult<()> {
                let mut args = args.into_iter();
                let mut index = 0usize;
                $(
                    let $ty = <$ty as FromValue>::from_value(args.next().flatten())
                        .map_err(|source| HandlerError::Parameter { index, source })?;
                    index += 1;
                )*

                (self)(actor, $($ty,)*).respond(actor)
            }
        }
    };
}

// Generate implementations for 0-16 parameters after the actor
impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15
);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16
);

// ============================================================================
// HookTable
// ============================================================================

/// An explicit mapping from hook names to handlers.
#[derive(Clone, Default)]
pub struct HookTable {
    hooks: HashMap<String, BoxedHandler>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler under `name` (builder pattern). A later entry with the
    /// same name replaces the earlier one.
    pub fn hook<H, T>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.insert(name, into_handler(handler));
        self
    }

    /// Adds a pre-built boxed handler.
    pub fn insert(&mut self, name: impl Into<String>, handler: BoxedHandler) {
        let name = name.into();
        debug!(hook = %name, arity = handler.arity(), "Added hook");
        self.hooks.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<&BoxedHandler> {
        self.hooks.get(name)
    }

    /// Returns all hook names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookTable")
            .field("hooks", &self.names())
            .finish()
    }
}
