//! Binding hook names to handlers.

use tracing::{debug, trace};

use crate::error::{RegistrationError, RegistrationResult};
use crate::handler::HookTable;
use crate::node::CommandNode;

/// Binds every `hook` in the given trees to a handler from `tables`.
///
/// Tables are searched in order and the first one providing the name wins.
/// Each handler's arity must equal [`CommandNode::expected_arity`]. The first
/// missing hook or arity mismatch aborts registration; nodes already visited
/// keep their binding, so callers should discard the trees on error.
pub fn bind_hooks(nodes: &mut [CommandNode], tables: &[&HookTable]) -> RegistrationResult<()> {
    for node in nodes {
        bind_node(node, tables)?;
    }
    Ok(())
}

fn bind_node(node: &mut CommandNode, tables: &[&HookTable]) -> RegistrationResult<()> {
    if let Some(hook) = node.hook.as_deref() {
        let handler = tables
            .iter()
            .find_map(|table| table.get(hook))
            .ok_or_else(|| RegistrationError::MissingHook {
                command: node.expanded_name.clone(),
                hook: hook.to_string(),
                line: node.line,
            })?;

        let expected = node.expected_arity();
        if handler.arity() != expected {
            return Err(RegistrationError::ArityMismatch {
                command: node.expanded_name.clone(),
                hook: hook.to_string(),
                expected,
                found: handler.arity(),
            });
        }

        debug!(command = %node.expanded_name, hook, "Bound hook");
        node.handler = Some(handler.clone());
    } else {
        trace!(command = %node.expanded_name, "No hook declared");
    }

    bind_hooks(&mut node.children, tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use quill_core::{Actor, ContextProvider, ContextProviders, TypeRegistry, Value};

    fn nodes(source: &str) -> Vec<CommandNode> {
        let providers = ContextProviders::new()
            .with(ContextProvider::new("self", |actor| Some(Value::from(actor.name()))))
            .unwrap();
        parse(source, &TypeRegistry::new(), &providers).unwrap()
    }

    #[test]
    fn test_binds_nested_hooks() {
        let mut roots = nodes("warp {\n  set string:name {\n    hook warp_set\n  }\n}");
        let hooks = HookTable::new().hook("warp_set", |_: &dyn Actor, _name: String| {});
        bind_hooks(&mut roots, &[&hooks]).unwrap();
        assert!(roots[0].handler().is_none());
        assert!(roots[0].children()[0].handler().is_some());
    }

    #[test]
    fn test_first_table_wins() {
        let mut roots = nodes("ping {\n  hook ping\n}");
        let first = HookTable::new().hook("ping", |_: &dyn Actor| "first");
        let second = HookTable::new().hook("ping", |_: &dyn Actor, _x: i32| "second");
        bind_hooks(&mut roots, &[&first, &second]).unwrap();
        assert_eq!(roots[0].handler().unwrap().arity(), 1);
    }

    #[test]
    fn test_missing_hook() {
        let mut roots = nodes("\nwarp {\n  set {\n    hook warp_set\n  }\n}");
        let err = bind_hooks(&mut roots, &[&HookTable::new()]).unwrap_err();
        match err {
            RegistrationError::MissingHook { command, hook, line } => {
                assert_eq!(command, "warp set");
                assert_eq!(hook, "warp_set");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_arity_counts_flags_and_context() {
        let mut roots = nodes("fly int:speed --force {\n  context self\n  hook fly\n}");
        let wrong = HookTable::new().hook("fly", |_: &dyn Actor, _speed: i32| {});
        let err = bind_hooks(&mut roots, &[&wrong]).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::ArityMismatch { expected: 4, found: 2, .. }
        ));

        let right = HookTable::new().hook(
            "fly",
            |_: &dyn Actor, _speed: i32, _force: bool, _who: String| {},
        );
        bind_hooks(&mut roots, &[&right]).unwrap();
    }
}
