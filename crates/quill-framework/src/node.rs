//! The command tree.
//!
//! A [`CommandNode`] is one parsed command block. Nodes own their children.
//! Instead of a back-reference to the parent, each node records its expanded
//! name (`"warp set"`) when it is parsed; sibling checks are done by the
//! dispatcher, which always walks the tree top-down.
//!
//! Nodes are immutable once parsed, except for the bound handler, which
//! [`bind_hooks`](crate::registration::bind_hooks) sets while the tree is
//! still exclusively owned.

use std::fmt;

use quill_core::{Actor, ContextProvider, SenderKind};

use crate::argument::{Argument, Flag};
use crate::handler::BoxedHandler;

/// One command definition with its arguments and subcommands.
#[derive(Clone)]
pub struct CommandNode {
    pub(crate) aliases: Vec<String>,
    pub(crate) expanded_name: String,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) context: Vec<ContextProvider>,
    pub(crate) asserters: Vec<ContextProvider>,
    pub(crate) permission: Option<String>,
    pub(crate) sender_kind: SenderKind,
    pub(crate) help: Option<String>,
    pub(crate) hook: Option<String>,
    pub(crate) children: Vec<CommandNode>,
    pub(crate) hide_child_help: bool,
    pub(crate) no_tab: bool,
    pub(crate) is_root: bool,
    pub(crate) line: usize,
    pub(crate) handler: Option<BoxedHandler>,
}

impl CommandNode {
    /// The first declared name.
    pub fn primary_alias(&self) -> &str {
        &self.aliases[0]
    }

    /// All names, primary first.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns `true` if `name` is one of this node's aliases, ignoring ASCII
    /// case.
    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    /// The path from the root, primary aliases joined by spaces.
    pub fn expanded_name(&self) -> &str {
        &self.expanded_name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Providers whose values are appended to the handler's parameters.
    pub fn context(&self) -> &[ContextProvider] {
        &self.context
    }

    /// Providers that must yield a value but are not passed to the handler.
    pub fn asserters(&self) -> &[ContextProvider] {
        &self.asserters
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Returns `true` if the node declares no permission or `actor` holds it.
    pub fn is_permitted(&self, actor: &dyn Actor) -> bool {
        self.permission
            .as_deref()
            .is_none_or(|permission| actor.has_permission(permission))
    }

    pub fn sender_kind(&self) -> SenderKind {
        self.sender_kind
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn hook(&self) -> Option<&str> {
        self.hook.as_deref()
    }

    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    pub fn hides_child_help(&self) -> bool {
        self.hide_child_help
    }

    /// Returns `true` if the node is excluded from completion.
    pub fn is_no_tab(&self) -> bool {
        self.no_tab
    }

    /// Returns `true` for nodes declared at the outermost level.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// One-based line of the block header in the definition source.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn handler(&self) -> Option<&BoxedHandler> {
        self.handler.as_ref()
    }

    /// Number of parameters a handler bound to this node must take: the
    /// actor, every positional argument, every flag and every context value.
    pub fn expected_arity(&self) -> usize {
        1 + self.arguments.len() + self.flags.len() + self.context.len()
    }

    /// `/give <amount:int> [target:player] [--silent]`
    pub fn usage(&self) -> String {
        let mut usage = format!("/{}", self.expanded_name);
        for argument in &self.arguments {
            usage.push(' ');
            usage.push_str(&argument.display());
        }
        for flag in &self.flags {
            usage.push(' ');
            usage.push_str(&flag.display());
        }
        usage
    }

    /// Visits this node and every descendant, depth first.
    pub fn walk(&self, visit: &mut impl FnMut(&CommandNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("flags", &self.flags)
            .field("permission", &self.permission)
            .field("sender_kind", &self.sender_kind)
            .field("hook", &self.hook)
            .field("children", &self.children)
            .field("bound", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}
