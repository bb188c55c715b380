//! The command manager: registered roots plus everything needed to parse,
//! dispatch and complete against them.
//!
//! ```rust,ignore
//! use quill_runtime::CommandManager;
//! use quill_framework::HookTable;
//!
//! let mut manager = CommandManager::new("myplugin");
//! manager.types_mut().register(player_type())?;
//!
//! let hooks = HookTable::new().hook("give", give);
//! manager.load_file("commands.txt", &[&hooks])?;
//!
//! manager.execute_line(&actor, "/give 5 Steve");
//! ```
//!
//! Roots are reachable by any of their aliases and, to break clashes between
//! plugins, as `prefix:alias`. Several roots may share a label; they are tried
//! in registration order.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use quill_core::{
    Actor, ArgType, ContextProvider, ContextProviders, TypeRegistry, quote_if_needed, tokenize,
    tokenize_for_completion,
};
use quill_framework::{
    CommandNode, DefinitionParser, Dispatcher, HookTable, Messages, bind_hooks, complete,
};

use crate::config::QuillConfig;
use crate::error::{ManagerError, ManagerResult};

/// Separator between a namespace prefix and a root alias.
pub const PREFIX_SEPARATOR: char = ':';

/// Origin label for definitions loaded from strings.
const INLINE_ORIGIN: &str = "<inline>";

#[derive(Debug)]
struct RegisteredRoot {
    prefix: String,
    node: Arc<CommandNode>,
}

impl RegisteredRoot {
    fn answers_to(&self, label: &str) -> bool {
        match label.split_once(PREFIX_SEPARATOR) {
            Some((prefix, alias)) => {
                prefix.eq_ignore_ascii_case(&self.prefix) && self.node.has_alias(alias)
            }
            None => self.node.has_alias(label),
        }
    }
}

/// Owns the registries and the registered command trees.
pub struct CommandManager {
    types: TypeRegistry,
    providers: ContextProviders,
    dispatcher: Dispatcher,
    prefix: String,
    roots: RwLock<Vec<RegisteredRoot>>,
}

impl CommandManager {
    /// Creates a manager with the built-in types, no context providers and
    /// the default messages.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            types: TypeRegistry::new(),
            providers: ContextProviders::new(),
            dispatcher: Dispatcher::default(),
            prefix: prefix.into(),
            roots: RwLock::new(Vec::new()),
        }
    }

    /// Creates a manager using the configured prefix and messages.
    pub fn from_config(config: &QuillConfig) -> Self {
        Self::new(config.commands.fallback_prefix.clone())
            .with_messages(config.messages.clone())
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.dispatcher = Dispatcher::new(messages);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable access for registering application types before any
    /// definitions are loaded.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn providers(&self) -> &ContextProviders {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ContextProviders {
        &mut self.providers
    }

    /// Registers an application argument type.
    pub fn register_type(&mut self, ty: ArgType) -> ManagerResult<()> {
        Ok(self.types.register(ty)?)
    }

    /// Registers a context provider.
    pub fn register_provider(&mut self, provider: ContextProvider) -> ManagerResult<()> {
        Ok(self.providers.register(provider)?)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Parses `source` against this manager's types and providers without
    /// registering anything.
    pub fn parse(&self, source: &str) -> ManagerResult<Vec<CommandNode>> {
        self.parse_from(source, INLINE_ORIGIN)
    }

    fn parse_from(&self, source: &str, origin: &str) -> ManagerResult<Vec<CommandNode>> {
        DefinitionParser::new(&self.types, &self.providers)
            .parse(source)
            .map_err(|source| ManagerError::Definition {
                origin: origin.to_string(),
                source,
            })
    }

    /// Parses and registers the definitions in `source` under this manager's
    /// prefix. Returns the primary names of the new roots.
    pub fn load_str(&self, source: &str, hooks: &[&HookTable]) -> ManagerResult<Vec<String>> {
        let nodes = self.parse(source)?;
        self.register(&self.prefix, nodes, hooks)
    }

    /// Reads, parses and registers a definition file.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        hooks: &[&HookTable],
    ) -> ManagerResult<Vec<String>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ManagerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loading command definitions");
        let nodes = self.parse_from(&source, &path.display().to_string())?;
        self.register(&self.prefix, nodes, hooks)
    }

    /// Loads every file in order, stopping at the first failure.
    pub fn load_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        hooks: &[&HookTable],
    ) -> ManagerResult<Vec<String>> {
        let mut names = Vec::new();
        for path in paths {
            names.extend(self.load_file(path, hooks)?);
        }
        Ok(names)
    }

    /// Binds hooks in `nodes` and adds them as roots under `prefix`.
    ///
    /// Binding happens before anything is added, so a failed registration
    /// leaves the manager unchanged.
    pub fn register(
        &self,
        prefix: &str,
        mut nodes: Vec<CommandNode>,
        hooks: &[&HookTable],
    ) -> ManagerResult<Vec<String>> {
        bind_hooks(&mut nodes, hooks)?;

        let names: Vec<String> = nodes
            .iter()
            .map(|node| node.primary_alias().to_string())
            .collect();

        let mut roots = self.roots.write();
        for node in nodes {
            if roots.iter().any(|root| root.node.has_alias(node.primary_alias())) {
                debug!(command = %node.primary_alias(), "Label shared with an existing root");
            }
            info!(command = %node.primary_alias(), prefix, "Registered command");
            roots.push(RegisteredRoot {
                prefix: prefix.to_string(),
                node: Arc::new(node),
            });
        }
        Ok(names)
    }

    /// Removes every root answering to `label` (an alias or `prefix:alias`).
    /// Returns how many were removed.
    pub fn unregister(&self, label: &str) -> usize {
        let mut roots = self.roots.write();
        let before = roots.len();
        roots.retain(|root| !root.answers_to(label));
        let removed = before - roots.len();
        if removed > 0 {
            info!(command = label, removed, "Unregistered command");
        }
        removed
    }

    /// Primary names of all roots, in registration order.
    pub fn roots(&self) -> Vec<String> {
        self.roots
            .read()
            .iter()
            .map(|root| root.node.primary_alias().to_string())
            .collect()
    }

    /// Roots answering to `label`, in registration order.
    pub fn lookup(&self, label: &str) -> Vec<Arc<CommandNode>> {
        self.roots
            .read()
            .iter()
            .filter(|root| root.answers_to(label))
            .map(|root| Arc::clone(&root.node))
            .collect()
    }

    /// Runs `args` against the roots answering to `label`. Returns `false` if
    /// no root does.
    pub fn execute(&self, actor: &dyn Actor, label: &str, args: &[String]) -> bool {
        let candidates = self.lookup(label);
        if candidates.is_empty() {
            debug!(command = label, actor = %actor.name(), "Unknown command");
            return false;
        }
        let refs: Vec<&CommandNode> = candidates.iter().map(Arc::as_ref).collect();
        self.dispatcher.dispatch(&refs, actor, args)
    }

    /// Tokenizes and runs a raw input line. A leading `/` is optional.
    pub fn execute_line(&self, actor: &dyn Actor, line: &str) -> bool {
        let tokens = tokenize(strip_slash(line));
        match tokens.split_first() {
            Some((label, args)) => self.execute(actor, label, args),
            None => false,
        }
    }

    /// Completion candidates for a partially typed line.
    pub fn complete_line(&self, actor: &dyn Actor, line: &str) -> Vec<String> {
        let tokens = tokenize_for_completion(strip_slash(line));
        let Some((label, args)) = tokens.split_first() else {
            return Vec::new();
        };

        if args.is_empty() {
            return self.complete_label(actor, label);
        }

        let mut candidates = Vec::new();
        for root in self.lookup(label) {
            for candidate in complete(&root, actor, args) {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    fn complete_label(&self, actor: &dyn Actor, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        let mut labels: Vec<String> = Vec::new();
        for root in self.roots.read().iter() {
            let node = &root.node;
            if node.is_no_tab() || !node.is_permitted(actor) {
                continue;
            }
            let alias = node.primary_alias();
            if alias.to_lowercase().starts_with(&partial) {
                let label = quote_if_needed(alias);
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
        labels
    }
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("prefix", &self.prefix)
            .field("types", &self.types.names())
            .field("roots", &self.roots())
            .finish_non_exhaustive()
    }
}

fn strip_slash(line: &str) -> &str {
    let line = line.trim_start();
    line.strip_prefix('/').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Value;
    use quill_core::testing::RecordingActor;
    use quill_framework::{DefinitionErrorKind, RegistrationError};

    fn manager() -> CommandManager {
        let mut manager = CommandManager::new("test");
        manager
            .register_type(
                ArgType::new("player", |_, token| Some(Value::from(token)))
                    .with_completions(|_| vec!["Steve".into(), "Alex".into()]),
            )
            .unwrap();
        manager
            .register_provider(ContextProvider::new("self", |actor| {
                Some(Value::from(actor.name()))
            }))
            .unwrap();
        manager
    }

    fn hooks() -> HookTable {
        HookTable::new()
            .hook("greet", |_: &dyn Actor, target: String, me: String| {
                format!("{me} greets {target}")
            })
            .hook("ping", |_: &dyn Actor| "pong")
    }

    const SOURCE: &str = "\
greet,hi player:target {
    context self
    hook greet
}
ping {
    hook ping
}";

    #[test]
    fn test_load_and_execute() {
        let manager = manager();
        let names = manager.load_str(SOURCE, &[&hooks()]).unwrap();
        assert_eq!(names, vec!["greet", "ping"]);
        assert_eq!(manager.roots(), vec!["greet", "ping"]);

        let actor = RecordingActor::player("Alex");
        assert!(manager.execute_line(&actor, "/hi Steve"));
        assert_eq!(actor.last_message().as_deref(), Some("Alex greets Steve"));
        assert!(manager.execute_line(&actor, "test:PING"));
        assert_eq!(actor.last_message().as_deref(), Some("pong"));
    }

    #[test]
    fn test_unknown_labels() {
        let manager = manager();
        manager.load_str(SOURCE, &[&hooks()]).unwrap();
        let actor = RecordingActor::player("Alex");
        assert!(!manager.execute_line(&actor, "/nothing"));
        assert!(!manager.execute_line(&actor, "other:ping"));
        assert!(!manager.execute_line(&actor, "   "));
        assert!(actor.messages().is_empty());
    }

    #[test]
    fn test_failed_registration_changes_nothing() {
        let manager = manager();
        let err = manager.load_str(SOURCE, &[&HookTable::new()]).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Registration(RegistrationError::MissingHook { .. })
        ));
        assert!(manager.roots().is_empty());
    }

    #[test]
    fn test_definition_error_carries_origin() {
        let manager = manager();
        let err = manager.load_str("ping {\n  hook\n}", &[]).unwrap_err();
        match err {
            ManagerError::Definition { origin, source } => {
                assert_eq!(origin, "<inline>");
                assert_eq!(source.line, 2);
                assert!(matches!(source.kind, DefinitionErrorKind::MissingValue(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let mut manager = manager();
        let err = manager
            .register_type(ArgType::new("int", |_, _| None))
            .unwrap_err();
        assert!(matches!(err, ManagerError::Registry(_)));
    }

    #[test]
    fn test_unregister() {
        let manager = manager();
        manager.load_str(SOURCE, &[&hooks()]).unwrap();
        assert_eq!(manager.unregister("hi"), 1);
        assert_eq!(manager.roots(), vec!["ping"]);
        assert_eq!(manager.unregister("hi"), 0);
    }

    #[test]
    fn test_shared_labels_across_prefixes() {
        let manager = manager();
        manager.load_str(SOURCE, &[&hooks()]).unwrap();
        let nodes = manager.parse("ping int:n {\n  hook ping_n\n}").unwrap();
        let other = HookTable::new().hook("ping_n", |_: &dyn Actor, n: i32| format!("pong {n}"));
        manager.register("other", nodes, &[&other]).unwrap();

        let actor = RecordingActor::player("Alex");
        assert!(manager.execute_line(&actor, "ping 3"));
        assert_eq!(actor.last_message().as_deref(), Some("pong 3"));
        assert!(manager.execute_line(&actor, "ping"));
        assert_eq!(actor.last_message().as_deref(), Some("pong"));
        assert!(manager.execute_line(&actor, "other:ping"));
        assert_eq!(actor.last_message().as_deref(), Some("/ping <n:int>"));
    }

    #[test]
    fn test_complete_line() {
        let manager = manager();
        manager.load_str(SOURCE, &[&hooks()]).unwrap();
        let actor = RecordingActor::player("Alex");
        assert_eq!(manager.complete_line(&actor, "/"), vec!["greet", "ping"]);
        assert_eq!(manager.complete_line(&actor, "p"), vec!["ping"]);
        assert_eq!(manager.complete_line(&actor, "hi "), vec!["Steve", "Alex"]);
        assert_eq!(manager.complete_line(&actor, "hi S"), vec!["Steve"]);
    }

    #[test]
    fn test_load_file() {
        let dir = std::env::temp_dir().join(format!("quill-manager-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("commands.txt");
        std::fs::write(&path, SOURCE).unwrap();

        let manager = manager();
        assert_eq!(
            manager.load_files(&[&path], &[&hooks()]).unwrap(),
            vec!["greet", "ping"]
        );
        let missing = manager.load_file(dir.join("missing.txt"), &[&hooks()]);
        assert!(matches!(missing, Err(ManagerError::Read { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
