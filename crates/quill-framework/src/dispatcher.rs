//! Recursive command execution.
//!
//! Each node an invocation reaches runs the same sequence of checks:
//!
//! 1. **Permission**: a node whose permission the actor lacks answers with the
//!    denial message. Nothing below it is ever reached.
//! 2. **Help literal**: a first token of `help` prints the node's help.
//! 3. **Sender kind**: a restricted node answers other kinds with the
//!    wrong-sender message.
//! 4. **Match and invoke**: if a handler is bound and the tokens match, the
//!    handler runs. A missing context value ends the call with the provider's
//!    message (or help); a structural mismatch falls through.
//! 5. **Children**: the first token selects every child carrying it as an
//!    alias; the first child that handles the rest of the tokens wins.
//! 6. **Fallback**: a node whose sibling shares its primary alias reports the
//!    call as unhandled so the sibling can try; otherwise it prints help.
//!
//! Every path except the sibling fallback ends with the actor receiving
//! something, and handler failures never escape [`Dispatcher::dispatch`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use tracing::{debug, debug_span, error, trace};

use quill_core::{Actor, Value};

use crate::error::HandlerError;
use crate::handler::BoxedHandler;
use crate::help::help_lines;
use crate::matcher::{MatchOutcome, match_arguments};
use crate::messages::Messages;
use crate::node::CommandNode;

/// The literal first token that requests help at any level.
pub const HELP_LITERAL: &str = "help";

/// Walks command trees for incoming invocations.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    messages: Messages,
}

impl Dispatcher {
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Runs `tokens` against a single root. Returns whether the call was
    /// handled.
    pub fn execute(&self, node: &CommandNode, actor: &dyn Actor, tokens: &[String]) -> bool {
        self.dispatch(&[node], actor, tokens)
    }

    /// Runs `tokens` against every root the actor's label selected, in order.
    ///
    /// Roots sharing a primary alias are siblings: each may decline so the
    /// next can try. If none handles the call, the first root's help is
    /// shown. Returns `false` only when `candidates` is empty.
    pub fn dispatch(&self, candidates: &[&CommandNode], actor: &dyn Actor, tokens: &[String]) -> bool {
        let Some(first) = candidates.first() else {
            return false;
        };
        let span = debug_span!("dispatch", command = %first.primary_alias(), actor = %actor.name());
        let _enter = span.enter();

        for (index, node) in candidates.iter().enumerate() {
            let has_twin = candidates.iter().enumerate().any(|(other, candidate)| {
                other != index && candidate.primary_alias().eq_ignore_ascii_case(node.primary_alias())
            });
            if self.run(node, actor, tokens, has_twin) {
                return true;
            }
        }

        trace!("No candidate handled the call");
        self.send_help(first, actor);
        true
    }

    fn run(&self, node: &CommandNode, actor: &dyn Actor, tokens: &[String], has_twin: bool) -> bool {
        if !node.is_permitted(actor) {
            trace!(command = %node.expanded_name(), "Permission denied");
            actor.send_message(&self.messages.no_permission);
            return true;
        }

        if tokens.first().is_some_and(|t| t.eq_ignore_ascii_case(HELP_LITERAL)) {
            self.send_help(node, actor);
            return true;
        }

        if !node.sender_kind().accepts(actor.kind()) {
            trace!(
                command = %node.expanded_name(),
                required = %node.sender_kind(),
                "Sender kind rejected"
            );
            actor.send_message(&self.messages.wrong_sender_for(node.sender_kind()));
            return true;
        }

        if let Some(handler) = node.handler() {
            match match_arguments(node, actor, tokens) {
                MatchOutcome::Matched(values) => {
                    self.invoke(node, handler, actor, values);
                    return true;
                }
                MatchOutcome::ContextFailure(Some(message)) => {
                    actor.send_message(&message);
                    return true;
                }
                MatchOutcome::ContextFailure(None) => {
                    self.send_help(node, actor);
                    return true;
                }
                MatchOutcome::NoMatch => {}
            }
        }

        if let Some((first, rest)) = tokens.split_first() {
            let children = node.children();
            for child in children.iter().filter(|child| child.has_alias(first)) {
                let twin = children.iter().any(|other| {
                    !ptr::eq(other, child)
                        && other.primary_alias().eq_ignore_ascii_case(child.primary_alias())
                });
                if self.run(child, actor, rest, twin) {
                    return true;
                }
            }
        }

        if has_twin {
            trace!(command = %node.expanded_name(), "Deferring to sibling");
            return false;
        }

        self.send_help(node, actor);
        true
    }

    fn invoke(
        &self,
        node: &CommandNode,
        handler: &BoxedHandler,
        actor: &dyn Actor,
        values: Vec<Option<Value>>,
    ) {
        debug!(command = %node.expanded_name(), actor = %actor.name(), "Invoking handler");

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(actor, values)))
            .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));

        if let Err(err) = result {
            error!(
                command = %node.expanded_name(),
                actor = %actor.name(),
                error = %err,
                "Command handler failed"
            );
            actor.send_message(&self.messages.handler_failure);
        }
    }

    /// Sends the help listing for `node` as one message. Falls back to the
    /// node's usage line when nothing in the subtree is listable.
    pub fn send_help(&self, node: &CommandNode, actor: &dyn Actor) {
        let mut lines = help_lines(node, actor, &self.messages.hidden_subcommands);
        if lines.is_empty() {
            lines.push(node.usage());
        }
        if let Some(header) = &self.messages.help_header {
            lines.insert(0, header.clone());
        }
        actor.send_message(&lines.join("\n"));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::handler::HookTable;
    use crate::parser::parse;
    use crate::registration::bind_hooks;
    use quill_core::testing::RecordingActor;
    use quill_core::{ArgType, ContextProvider, ContextProviders, TypeRegistry};

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with(ArgType::new("player", |_, token| {
                token
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase)
                    .then(|| Value::from(token))
            }))
            .unwrap()
    }

    fn providers() -> ContextProviders {
        ContextProviders::new()
            .with(
                ContextProvider::new("world", |actor| {
                    actor.has_permission("in.world").then(|| Value::from("overworld"))
                })
                .with_error("You are not in a world."),
            )
            .unwrap()
            .with(ContextProvider::new("never", |_| None))
            .unwrap()
    }

    fn load(source: &str, hooks: &HookTable) -> Vec<CommandNode> {
        let mut roots = parse(source, &types(), &providers()).unwrap();
        bind_hooks(&mut roots, &[hooks]).unwrap();
        roots
    }

    fn tokens(line: &str) -> Vec<String> {
        quill_core::tokenize(line)
    }

    fn counter() -> (Arc<AtomicUsize>, HookTable) {
        let count = Arc::new(AtomicUsize::new(0));
        let hit = Arc::clone(&count);
        let hooks = HookTable::new()
            .hook("secret", move |_: &dyn Actor| {
                hit.fetch_add(1, Ordering::SeqCst);
            });
        (count, hooks)
    }

    #[test]
    fn test_permission_gating_is_total() {
        let (count, hooks) = counter();
        let roots = load(
            "vault {\n  permission vault.use\n  hook secret\n  open {\n    hook secret\n  }\n}",
            &hooks,
        );
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        for line in ["", "open", "help", "open extra tokens"] {
            assert!(dispatcher.execute(&roots[0], &actor, &tokens(line)));
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(
            actor
                .messages()
                .iter()
                .all(|m| m == &Messages::default().no_permission)
        );
    }

    #[test]
    fn test_root_help_with_no_tokens() {
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        let roots = load("empty {\n}", &HookTable::new());
        assert!(dispatcher.execute(&roots[0], &actor, &[]));
        assert_eq!(actor.last_message().as_deref(), Some("/empty"));

        let roots = load(
            "warp {\n  help Warps\n  set string:name {\n    help Sets a warp\n  }\n}",
            &HookTable::new(),
        );
        assert!(dispatcher.execute(&roots[0], &actor, &[]));
        assert!(dispatcher.execute(&roots[0], &actor, &[]));
        let messages = actor.messages();
        assert_eq!(messages[1], messages[2]);
        assert_eq!(messages[2], "/warp - Warps\n/warp set <name:string> - Sets a warp");
    }

    #[test]
    fn test_give_scenario() {
        let hooks = HookTable::new().hook(
            "give",
            |_: &dyn Actor, amount: i32, target: Option<String>| {
                format!("{amount} -> {}", target.as_deref().unwrap_or("self"))
            },
        );
        let roots = load("give,g int:amount player:target? {\n  hook give\n}", &hooks);
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        assert!(dispatcher.execute(&roots[0], &actor, &tokens("5")));
        assert_eq!(actor.last_message().as_deref(), Some("5 -> self"));
        assert!(dispatcher.execute(&roots[0], &actor, &tokens("5 Steve")));
        assert_eq!(actor.last_message().as_deref(), Some("5 -> Steve"));

        // no match: usage is shown instead
        assert!(dispatcher.execute(&roots[0], &actor, &tokens("five")));
        assert_eq!(
            actor.last_message().as_deref(),
            Some("/give <amount:int> [target:player]")
        );
    }

    #[test]
    fn test_subcommand_recursion() {
        let hooks = HookTable::new()
            .hook("set", |_: &dyn Actor, name: String| format!("set {name}"))
            .hook("list", |_: &dyn Actor| "list");
        let roots = load(
            "warp {\n  set string:name {\n    hook set\n  }\n  list,ls {\n    hook list\n  }\n}",
            &hooks,
        );
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        assert!(dispatcher.execute(&roots[0], &actor, &tokens("SET home")));
        assert_eq!(actor.last_message().as_deref(), Some("set home"));
        assert!(dispatcher.execute(&roots[0], &actor, &tokens("ls")));
        assert_eq!(actor.last_message().as_deref(), Some("list"));
    }

    #[test]
    fn test_help_literal() {
        let roots = load(
            "warp {\n  set string:name {\n    help Sets a warp\n  }\n}",
            &HookTable::new(),
        );
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");
        assert!(dispatcher.execute(&roots[0], &actor, &tokens("set HELP")));
        assert_eq!(
            actor.last_message().as_deref(),
            Some("/warp set <name:string> - Sets a warp")
        );
    }

    #[test]
    fn test_sender_kind() {
        let (count, hooks) = counter();
        let roots = load("stop {\n  users console\n  hook secret\n}", &hooks);
        let dispatcher = Dispatcher::default();

        let player = RecordingActor::player("Alex");
        assert!(dispatcher.execute(&roots[0], &player, &[]));
        assert_eq!(
            player.last_message().as_deref(),
            Some("This command can only be used by the console.")
        );
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let console = RecordingActor::console();
        assert!(dispatcher.execute(&roots[0], &console, &[]));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_twin_siblings_fall_through() {
        let hooks = HookTable::new()
            .hook("one", |_: &dyn Actor, a: i32| format!("one {a}"))
            .hook("two", |_: &dyn Actor, a: i32, b: i32| format!("two {a} {b}"));
        let roots = load(
            "math {\n  add int:a {\n    hook one\n  }\n  add int:a int:b {\n    hook two\n  }\n}",
            &hooks,
        );
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        assert!(dispatcher.execute(&roots[0], &actor, &tokens("add 1 2")));
        assert_eq!(actor.last_message().as_deref(), Some("two 1 2"));
        assert!(dispatcher.execute(&roots[0], &actor, &tokens("add 1")));
        assert_eq!(actor.last_message().as_deref(), Some("one 1"));

        // neither twin matches, so the parent answers with its help
        assert!(dispatcher.execute(&roots[0], &actor, &tokens("add x")));
        assert_eq!(
            actor.last_message().as_deref(),
            Some("/math")
        );
    }

    #[test]
    fn test_twin_roots() {
        let hooks = HookTable::new()
            .hook("one", |_: &dyn Actor, a: i32| format!("one {a}"))
            .hook("two", |_: &dyn Actor, a: String| format!("two {a}"));
        let roots = load(
            "pick int:a {\n  hook one\n}\npick string:a {\n  hook two\n}",
            &hooks,
        );
        let candidates: Vec<&CommandNode> = roots.iter().collect();
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        assert!(dispatcher.dispatch(&candidates, &actor, &tokens("3")));
        assert_eq!(actor.last_message().as_deref(), Some("one 3"));
        assert!(dispatcher.dispatch(&candidates, &actor, &tokens("x")));
        assert_eq!(actor.last_message().as_deref(), Some("two x"));
        assert!(dispatcher.dispatch(&candidates, &actor, &tokens("x y")));
        assert_eq!(actor.last_message().as_deref(), Some("/pick <a:int>"));
        assert!(!dispatcher.dispatch(&[], &actor, &[]));
    }

    #[test]
    fn test_twin_roots_without_tokens() {
        let hooks = HookTable::new()
            .hook("one", |_: &dyn Actor, a: i32| format!("one {a}"))
            .hook("zero", |_: &dyn Actor| "zero");
        let roots = load("pick int:a {\n  hook one\n}\npick {\n  hook zero\n}", &hooks);
        let candidates: Vec<&CommandNode> = roots.iter().collect();
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        assert!(dispatcher.dispatch(&candidates, &actor, &[]));
        assert_eq!(actor.last_message().as_deref(), Some("zero"));
        assert!(dispatcher.dispatch(&candidates, &actor, &tokens("4")));
        assert_eq!(actor.last_message().as_deref(), Some("one 4"));

        // both decline: the first root answers with its help
        assert!(dispatcher.dispatch(&candidates, &actor, &tokens("x")));
        assert_eq!(actor.last_message().as_deref(), Some("/pick <a:int>"));
        assert_eq!(actor.messages().len(), 3);
    }

    #[test]
    fn test_handler_failures_are_contained() {
        let hooks = HookTable::new()
            .hook("boom", |_: &dyn Actor| -> String { panic!("kaboom") })
            .hook("fail", |_: &dyn Actor| -> Result<(), String> { Err("nope".into()) });
        let roots = load(
            "boom {\n  hook boom\n}\nfail {\n  hook fail\n}",
            &hooks,
        );
        let dispatcher = Dispatcher::default();
        let actor = RecordingActor::player("Alex");

        assert!(dispatcher.execute(&roots[0], &actor, &[]));
        assert_eq!(
            actor.last_message(),
            Some(Messages::default().handler_failure)
        );
        actor.clear();
        assert!(dispatcher.execute(&roots[1], &actor, &[]));
        assert_eq!(
            actor.last_message(),
            Some(Messages::default().handler_failure)
        );
    }

    #[test]
    fn test_context_failure() {
        let hooks = HookTable::new()
            .hook("build", |_: &dyn Actor, world: String| format!("built in {world}"))
            .hook("probe", |_: &dyn Actor| "probed");
        let roots = load(
            "build {\n  context world\n  hook build\n}\nprobe {\n  help Probes\n  assert never\n  hook probe\n}",
            &hooks,
        );
        let dispatcher = Dispatcher::default();

        let outside = RecordingActor::player("Alex");
        assert!(dispatcher.execute(&roots[0], &outside, &[]));
        assert_eq!(outside.last_message().as_deref(), Some("You are not in a world."));

        let inside = RecordingActor::player("Alex").with_permission("in.world");
        assert!(dispatcher.execute(&roots[0], &inside, &[]));
        assert_eq!(inside.last_message().as_deref(), Some("built in overworld"));

        assert!(dispatcher.execute(&roots[1], &inside, &[]));
        assert_eq!(inside.last_message().as_deref(), Some("/probe - Probes"));
    }

    #[test]
    fn test_help_header() {
        let dispatcher = Dispatcher::new(Messages {
            help_header: Some("-- Help --".to_string()),
            ..Messages::default()
        });
        let roots = load("ping {\n  help Pong\n}", &HookTable::new());
        let actor = RecordingActor::player("Alex");
        dispatcher.send_help(&roots[0], &actor);
        assert_eq!(actor.last_message().as_deref(), Some("-- Help --\n/ping - Pong"));
    }
}
