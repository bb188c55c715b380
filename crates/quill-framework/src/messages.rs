//! User-facing texts sent by the dispatcher.

use serde::{Deserialize, Serialize};

/// Messages the dispatcher sends on its own behalf.
///
/// Loaded from the `messages` section of the runtime configuration, so every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Sent when the actor lacks a node's permission.
    pub no_permission: String,

    /// Sent when the actor's kind is not accepted. `{kind}` is replaced with
    /// the required kind.
    pub wrong_sender: String,

    /// Sent when a handler fails or panics.
    pub handler_failure: String,

    /// Label of the collapsed line shown in place of hidden subcommands.
    pub hidden_subcommands: String,

    /// Optional first line of every help listing.
    pub help_header: Option<String>,
}

impl Messages {
    /// `wrong_sender` with the placeholder filled in.
    pub fn wrong_sender_for(&self, kind: impl std::fmt::Display) -> String {
        self.wrong_sender.replace("{kind}", &kind.to_string())
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_permission: "You do not have permission to use this command.".to_string(),
            wrong_sender: "This command can only be used by the {kind}.".to_string(),
            handler_failure: "An error occurred while executing this command.".to_string(),
            hidden_subcommands: "[hidden subcommands]".to_string(),
            help_header: None,
        }
    }
}
