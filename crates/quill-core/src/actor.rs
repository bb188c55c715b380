//! The invoker abstraction.
//!
//! An [`Actor`] is whoever typed the command: a player, the console, a bot
//! account. The framework needs four things from it: a permission check, its
//! [`SenderKind`], a way to send it text, and a name for log lines. Everything
//! else about the host's session model stays outside the framework.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

/// Classification of command invokers.
///
/// Actors report either [`SenderKind::Player`] or [`SenderKind::Console`].
/// Command nodes use the same enum as a restriction, where
/// [`SenderKind::Everyone`] means "no restriction".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SenderKind {
    /// Any invoker is accepted.
    #[default]
    Everyone,
    /// An interactive user.
    Player,
    /// The host console or another non-interactive caller.
    Console,
}

impl SenderKind {
    /// Returns `true` if an actor of kind `actor_kind` satisfies this
    /// restriction.
    pub fn accepts(self, actor_kind: SenderKind) -> bool {
        self == SenderKind::Everyone || self == actor_kind
    }

    /// Returns the name used in definitions and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::Player => "player",
            Self::Console => "console",
        }
    }
}

impl FromStr for SenderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "player" | "players" => Ok(Self::Player),
            "console" => Ok(Self::Console),
            "everyone" | "all" | "any" => Ok(Self::Everyone),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity invoking a command.
///
/// Implementations must be safe to share between threads: the same actor may
/// be handed to converters, context providers and handlers.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct ConsoleActor;
///
/// impl Actor for ConsoleActor {
///     fn name(&self) -> &str { "console" }
///     fn has_permission(&self, _permission: &str) -> bool { true }
///     fn kind(&self) -> SenderKind { SenderKind::Console }
///     fn send_message(&self, text: &str) { println!("{text}") }
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Actor: Send + Sync {
    /// Returns a display name used in log output.
    fn name(&self) -> &str;

    /// Returns `true` if the actor holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;

    /// Returns the kind of this actor.
    fn kind(&self) -> SenderKind;

    /// Delivers a (possibly multi-line) message to the actor.
    fn send_message(&self, text: &str);

    /// Returns self as `&dyn Any` for downcasting to the host's concrete type.
    ///
    /// Implementors should simply return `self`.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Actor {
    /// Attempts to view this actor as the concrete host type `T`.
    pub fn downcast_ref<T: Actor + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}
