//! Test support: an [`Actor`] that records everything sent to it.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! downstream crates' dev-dependencies.

use std::any::Any;
use std::collections::HashSet;

use parking_lot::Mutex;

use crate::actor::{Actor, SenderKind};

/// An actor with a fixed permission set that records its messages.
#[derive(Debug)]
pub struct RecordingActor {
    name: String,
    kind: SenderKind,
    permissions: HashSet<String>,
    all_permissions: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingActor {
    /// A player with no permissions.
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SenderKind::Player,
            permissions: HashSet::new(),
            all_permissions: false,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// The console, which holds every permission.
    pub fn console() -> Self {
        Self {
            name: "console".to_string(),
            kind: SenderKind::Console,
            permissions: HashSet::new(),
            all_permissions: true,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Returns every message received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Actor for RecordingActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.all_permissions || self.permissions.contains(permission)
    }

    fn kind(&self) -> SenderKind {
        self.kind
    }

    fn send_message(&self, text: &str) {
        self.messages.lock().push(text.to_string());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
