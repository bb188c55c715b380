//! Context providers.
//!
//! A [`ContextProvider`] derives a value from the acting entity instead of
//! from typed input: "the player's current world", "the actor's selected
//! region". Definitions reference providers by name in `context` and `assert`
//! tags and in `(context <name>)` default values; the parser resolves those
//! names against a [`ContextProviders`] set.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::actor::Actor;
use crate::error::{RegistryError, RegistryResult};
use crate::value::Value;

/// A type-erased supplier. Returning `None` signals that the value is absent
/// for this actor.
pub type SupplyFn = Arc<dyn Fn(&dyn Actor) -> Option<Value> + Send + Sync>;

/// A named function supplying a value derived from the actor.
#[derive(Clone)]
pub struct ContextProvider {
    name: String,
    supply: SupplyFn,
    error_message: Option<String>,
}

impl ContextProvider {
    pub fn new<F>(name: impl Into<String>, supply: F) -> Self
    where
        F: Fn(&dyn Actor) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            supply: Arc::new(supply),
            error_message: None,
        }
    }

    /// Sets the message shown to the actor when the value is absent.
    ///
    /// Without one, the command's help is shown instead.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Resolves the value for `actor`. A panicking supplier counts as absent.
    pub fn supply(&self, actor: &dyn Actor) -> Option<Value> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.supply)(actor))) {
            Ok(value) => value,
            Err(_) => {
                warn!(provider = %self.name, actor = actor.name(), "Context provider panicked");
                None
            }
        }
    }
}

impl fmt::Debug for ContextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextProvider")
            .field("name", &self.name)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

/// The set of providers definitions may reference.
#[derive(Clone, Debug, Default)]
pub struct ContextProviders {
    providers: HashMap<String, ContextProvider>,
}

impl ContextProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider. Names must be unique and free of whitespace.
    pub fn register(&mut self, provider: ContextProvider) -> RegistryResult<()> {
        if provider.name.is_empty() || provider.name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName {
                what: "context provider",
                name: provider.name,
            });
        }
        if self.providers.contains_key(&provider.name) {
            return Err(RegistryError::DuplicateProvider(provider.name));
        }
        debug!(provider = %provider.name, "Registered context provider");
        self.providers.insert(provider.name.clone(), provider);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, provider: ContextProvider) -> RegistryResult<Self> {
        self.register(provider)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ContextProvider> {
        self.providers.get(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SenderKind;
    use crate::testing::RecordingActor;

    fn player_only() -> ContextProvider {
        ContextProvider::new("self", |actor| {
            (actor.kind() == SenderKind::Player).then(|| Value::from(actor.name()))
        })
        .with_error("You must be a player to do this")
    }

    #[test]
    fn test_supply_present_and_absent() {
        let provider = player_only();
        assert_eq!(
            provider.supply(&RecordingActor::player("Steve")),
            Some(Value::from("Steve"))
        );
        assert_eq!(provider.supply(&RecordingActor::console()), None);
        assert_eq!(
            provider.error_message(),
            Some("You must be a player to do this")
        );
    }

    #[test]
    fn test_duplicate_provider_rejected() {
        let providers = ContextProviders::new().with(player_only()).unwrap();
        assert!(matches!(
            providers.with(player_only()),
            Err(RegistryError::DuplicateProvider(_))
        ));
    }

    #[test]
    fn test_invalid_provider_name_rejected() {
        let mut providers = ContextProviders::new();
        let err = providers
            .register(ContextProvider::new("my world", |_| None))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName { .. }));
    }

    #[test]
    fn test_panicking_provider_counts_as_absent() {
        let provider = ContextProvider::new("broken", |_| panic!("no world"));
        assert_eq!(provider.supply(&RecordingActor::console()), None);
    }
}
