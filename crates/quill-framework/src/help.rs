//! Help listings.

use quill_core::Actor;

use crate::node::CommandNode;

/// Continuation lines of multi-line help are indented by this much.
const CONTINUATION_INDENT: &str = "    ";

/// Builds the help listing for `node` and its subtree, as `actor` sees it.
///
/// Walks depth first. A node contributes `/<name> <signature> - <help>` when it
/// declares help; subtrees whose permission the actor lacks are skipped
/// entirely. A descendant marked `hidesub` lists its own entry and then one
/// `/<name> <hidden_label>` line instead of its children.
pub fn help_lines(node: &CommandNode, actor: &dyn Actor, hidden_label: &str) -> Vec<String> {
    let mut lines = Vec::new();
    collect(node, actor, 0, hidden_label, &mut lines);
    lines
}

fn collect(
    node: &CommandNode,
    actor: &dyn Actor,
    depth: usize,
    hidden_label: &str,
    lines: &mut Vec<String>,
) {
    if !node.is_permitted(actor) {
        return;
    }

    if let Some(help) = node.help() {
        let mut text = help.lines();
        let first = text.next().unwrap_or_default();
        lines.push(format!("{} - {first}", node.usage()));
        lines.extend(text.map(|line| format!("{CONTINUATION_INDENT}{line}")));
    }

    if depth > 0 && node.hides_child_help() && !node.children().is_empty() {
        lines.push(format!("/{} {hidden_label}", node.expanded_name()));
        return;
    }

    for child in node.children() {
        collect(child, actor, depth + 1, hidden_label, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use quill_core::testing::RecordingActor;
    use quill_core::{ContextProviders, TypeRegistry};

    const SOURCE: &str = "\
warp {
    help Warp management
    set string:name {
        help Creates a warp
        help at your position
    }
    delete string:name {
        help Deletes a warp
        permission warp.delete
        force {
            help Deletes without asking
        }
    }
    admin {
        help Admin tools
        hidesub
        purge {
            help Removes every warp
        }
    }
}";

    fn warp() -> CommandNode {
        parse(SOURCE, &TypeRegistry::new(), &ContextProviders::new())
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_help_lines_respect_permissions() {
        let actor = RecordingActor::player("Alex");
        assert_eq!(
            help_lines(&warp(), &actor, "[hidden subcommands]"),
            vec![
                "/warp - Warp management",
                "/warp set <name:string> - Creates a warp",
                "    at your position",
                "/warp admin - Admin tools",
                "/warp admin [hidden subcommands]",
            ]
        );
    }

    #[test]
    fn test_permitted_subtree_is_listed() {
        let actor = RecordingActor::console();
        let lines = help_lines(&warp(), &actor, "[hidden subcommands]");
        assert!(lines.contains(&"/warp delete <name:string> - Deletes a warp".to_string()));
        assert!(lines.contains(&"/warp delete force - Deletes without asking".to_string()));
        assert!(!lines.iter().any(|l| l.contains("purge")));
    }

    #[test]
    fn test_hidesub_on_requested_node_lists_children() {
        let admin = warp().children()[2].clone();
        let actor = RecordingActor::player("Alex");
        let lines = help_lines(&admin, &actor, "[hidden subcommands]");
        assert_eq!(
            lines,
            vec![
                "/warp admin - Admin tools",
                "/warp admin purge - Removes every warp",
            ]
        );
    }
}
