//! The command definition language.
//!
//! Definitions are line oriented and brace nested:
//!
//! ```text
//! # comments and blank lines are ignored
//! give,g int:amount player:target? --silent {
//!     help Gives items to a player
//!     permission items.give
//!     users everyone
//!     context world
//!     hook give
//!     all int:amount {
//!         help Gives items to everyone online
//!         hook give_all
//!     }
//! }
//! ```
//!
//! A block header is `name1,name2 arg1 arg2 ... {`. Inside a block, tag lines
//! configure the node (`help`, `permission`, `user`/`users`, `context`,
//! `assert`, `hidesub`, `notab`, `hook`) and nested blocks declare
//! subcommands. `}` closes the block.
//!
//! # Argument tokens
//!
//! `type:name` followed by optional modifiers:
//!
//! | suffix | effect |
//! | --- | --- |
//! | `...` | variadic: absorbs every remaining token (last argument only) |
//! | `*?` / `?*` | optional, type label hidden in help |
//! | `*` | type label hidden in help |
//! | `?` | optional |
//! | `(literal)` | default value, converted once at parse time; implies optional |
//! | `(context name)` | default taken from a context provider at match time |
//!
//! A bare `player` is shorthand for `player:player`. A token whose name equals
//! its type hides the type label. Tokens starting with `-` declare flags:
//! `--force,-f` is a boolean switch with an alias, `int:--amount(1)` a typed
//! flag with a default.
//!
//! Parsing is a pure function of the source, the [`TypeRegistry`] and the
//! [`ContextProviders`]; the first error aborts with its line number.

use std::str::FromStr;

use tracing::{debug, trace};

use quill_core::types::builtin;
use quill_core::{ContextProvider, ContextProviders, SenderKind, TypeRegistry};

use crate::argument::{Argument, DefaultValue, FLAG_MARKER, Flag};
use crate::error::{DefinitionError, DefinitionErrorKind, DefinitionResult};
use crate::node::CommandNode;

/// Parses command definitions against a type registry and provider set.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionParser<'a> {
    types: &'a TypeRegistry,
    providers: &'a ContextProviders,
}

impl<'a> DefinitionParser<'a> {
    pub fn new(types: &'a TypeRegistry, providers: &'a ContextProviders) -> Self {
        Self { types, providers }
    }

    /// Parses a whole definition source into its root nodes.
    pub fn parse(&self, source: &str) -> DefinitionResult<Vec<CommandNode>> {
        let lines: Vec<&str> = source.lines().collect();
        self.parse_lines(&lines)
    }

    /// Parses a sequence of lines into root nodes, marked with `is_root`.
    pub fn parse_lines(&self, lines: &[&str]) -> DefinitionResult<Vec<CommandNode>> {
        let mut roots = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index].trim();
            if is_ignored(line) {
                index += 1;
                continue;
            }
            if line == "}" {
                return Err(DefinitionError::new(
                    index + 1,
                    DefinitionErrorKind::UnexpectedClose,
                ));
            }
            if !line.ends_with('{') {
                return Err(DefinitionError::new(
                    index + 1,
                    DefinitionErrorKind::OutsideBlock(line.to_string()),
                ));
            }

            let (mut node, next) = self.parse_block(lines, index, None)?;
            node.is_root = true;
            debug!(
                command = %node.primary_alias(),
                children = node.children.len(),
                "Parsed command definition"
            );
            roots.push(node);
            index = next;
        }

        Ok(roots)
    }

    /// Parses the block whose header is `lines[start]`.
    ///
    /// `parent` is the expanded name of the enclosing node. Returns the node
    /// and the index of the first line after its closing brace.
    pub fn parse_block(
        &self,
        lines: &[&str],
        start: usize,
        parent: Option<&str>,
    ) -> DefinitionResult<(CommandNode, usize)> {
        let header_line = start + 1;
        let Some(header) = lines.get(start).map(|line| line.trim()) else {
            return Err(DefinitionError::new(
                header_line,
                DefinitionErrorKind::MissingBlock,
            ));
        };
        let header = header.strip_suffix('{').unwrap_or(header).trim();
        let mut node = self.parse_header(header, header_line, parent)?;

        let mut index = start + 1;
        while index < lines.len() {
            let line = lines[index].trim();
            let number = index + 1;

            if is_ignored(line) {
                index += 1;
                continue;
            }
            if line == "}" {
                trace!(command = %node.expanded_name, "Closed command block");
                return Ok((node, index + 1));
            }
            if line.ends_with('{') {
                let (child, next) = self.parse_block(lines, index, Some(&node.expanded_name))?;
                node.children.push(child);
                index = next;
                continue;
            }

            self.apply_tag(&mut node, line, number)?;
            index += 1;
        }

        Err(DefinitionError::new(
            header_line,
            DefinitionErrorKind::UnclosedBlock,
        ))
    }

    fn parse_header(
        &self,
        header: &str,
        line: usize,
        parent: Option<&str>,
    ) -> DefinitionResult<CommandNode> {
        let err = |kind| DefinitionError::new(line, kind);

        let tokens = split_header(header).map_err(err)?;
        let Some((names, params)) = tokens.split_first() else {
            return Err(err(DefinitionErrorKind::MissingName));
        };

        let aliases: Vec<String> = names.split(',').map(|a| a.trim().to_string()).collect();
        if aliases.iter().any(String::is_empty) {
            return Err(err(DefinitionErrorKind::MalformedArgument(names.clone())));
        }

        let expanded_name = match parent {
            Some(parent) => format!("{parent} {}", aliases[0]),
            None => aliases[0].clone(),
        };

        let mut arguments: Vec<Argument> = Vec::new();
        let mut flags: Vec<Flag> = Vec::new();
        for token in params {
            match self.parse_param(token).map_err(err)? {
                Param::Argument(mut argument) => {
                    if let Some(previous) = arguments.last()
                        && previous.variadic
                    {
                        return Err(err(DefinitionErrorKind::VariadicNotLast(
                            previous.name.clone(),
                        )));
                    }
                    argument.position = arguments.len();
                    arguments.push(argument);
                }
                Param::Flag(mut flag) => {
                    flag.position = flags.len();
                    flags.push(flag);
                }
            }
        }

        Ok(CommandNode {
            aliases,
            expanded_name,
            arguments,
            flags,
            context: Vec::new(),
            asserters: Vec::new(),
            permission: None,
            sender_kind: SenderKind::Everyone,
            help: None,
            hook: None,
            children: Vec::new(),
            hide_child_help: false,
            no_tab: false,
            is_root: false,
            line,
            handler: None,
        })
    }

    fn parse_param(&self, token: &str) -> Result<Param, DefinitionErrorKind> {
        let mut body = token;
        let mut default_src = None;

        if body.ends_with(')') {
            let (rest, inner) = split_default(body)?;
            body = rest;
            default_src = Some(inner);
        }

        let mut variadic = false;
        if let Some(rest) = body.strip_suffix("...") {
            body = rest;
            variadic = true;
        }

        let (mut hide_type, mut optional) = (false, false);
        if let Some(rest) = body.strip_suffix("*?").or_else(|| body.strip_suffix("?*")) {
            body = rest;
            hide_type = true;
            optional = true;
        } else if let Some(rest) = body.strip_suffix('*') {
            body = rest;
            hide_type = true;
        } else if let Some(rest) = body.strip_suffix('?') {
            body = rest;
            optional = true;
        }

        if default_src.is_none() && body.ends_with(')') {
            let (rest, inner) = split_default(body)?;
            body = rest;
            default_src = Some(inner);
        }

        let malformed = || DefinitionErrorKind::MalformedArgument(token.to_string());
        let (type_name, name) = match body.split_once(':') {
            Some((type_name, name)) => (type_name, name),
            None if body.starts_with(FLAG_MARKER) => (builtin::BOOLEAN, body),
            None => (body, body),
        };
        if type_name.is_empty() || name.is_empty() || name.contains(':') {
            return Err(malformed());
        }

        let ty = self
            .types
            .get(type_name)
            .ok_or_else(|| DefinitionErrorKind::UnknownType(type_name.to_string()))?
            .clone();
        hide_type |= name == type_name;

        let default = default_src
            .map(|src| self.parse_default(src, &ty))
            .transpose()?;

        if name.starts_with(FLAG_MARKER) {
            if optional || variadic {
                return Err(DefinitionErrorKind::DecoratedFlag(name.to_string()));
            }
            let names: Vec<String> = name.split(',').map(str::to_string).collect();
            if names
                .iter()
                .any(|n| n.len() < 2 || !n.starts_with(FLAG_MARKER))
            {
                return Err(malformed());
            }
            return Ok(Param::Flag(Flag {
                ty,
                names,
                position: 0,
                hide_type,
                default,
            }));
        }

        if name.contains(',') {
            return Err(malformed());
        }

        Ok(Param::Argument(Argument {
            ty,
            name: name.to_string(),
            position: 0,
            optional: optional || default.is_some(),
            variadic,
            hide_type,
            default,
        }))
    }

    fn parse_default(
        &self,
        src: &str,
        ty: &quill_core::ArgType,
    ) -> Result<DefaultValue, DefinitionErrorKind> {
        if let Some(provider) = src.strip_prefix("context ") {
            return self
                .provider(provider.trim())
                .map(|p| DefaultValue::Context(p.clone()));
        }
        ty.convert(None, src)
            .map(DefaultValue::Literal)
            .ok_or_else(|| DefinitionErrorKind::InvalidDefault {
                value: src.to_string(),
                type_name: ty.name().to_string(),
            })
    }

    fn provider(&self, name: &str) -> Result<&ContextProvider, DefinitionErrorKind> {
        self.providers
            .get(name)
            .ok_or_else(|| DefinitionErrorKind::UnknownProvider(name.to_string()))
    }

    fn apply_tag(&self, node: &mut CommandNode, line: &str, number: usize) -> DefinitionResult<()> {
        let err = |kind| DefinitionError::new(number, kind);
        let (tag, value) = match line.split_once(char::is_whitespace) {
            Some((tag, value)) => (tag, value.trim()),
            None => (line, ""),
        };
        let required = |value: &str| {
            if value.is_empty() {
                Err(err(DefinitionErrorKind::MissingValue(tag.to_string())))
            } else {
                Ok(value.to_string())
            }
        };

        match tag {
            "help" => {
                node.help = Some(match node.help.take() {
                    Some(existing) => format!("{existing}\n{value}"),
                    None => value.to_string(),
                });
            }
            "permission" => node.permission = Some(required(value)?),
            "user" | "users" => {
                node.sender_kind = SenderKind::from_str(&required(value)?).map_err(|()| {
                    err(DefinitionErrorKind::UnknownSenderKind(value.to_string()))
                })?;
            }
            "context" => {
                required(value)?;
                for name in value.split_whitespace() {
                    let provider = self.provider(name).map_err(err)?;
                    node.context.push(provider.clone());
                }
            }
            "assert" => {
                required(value)?;
                for name in value.split_whitespace() {
                    let provider = self.provider(name).map_err(err)?;
                    node.asserters.push(provider.clone());
                }
            }
            "hidesub" => node.hide_child_help = true,
            "notab" => node.no_tab = true,
            "hook" => node.hook = Some(required(value)?),
            other => return Err(err(DefinitionErrorKind::UnknownTag(other.to_string()))),
        }
        Ok(())
    }
}

/// Parses `source` with the given registries.
pub fn parse(
    source: &str,
    types: &TypeRegistry,
    providers: &ContextProviders,
) -> DefinitionResult<Vec<CommandNode>> {
    DefinitionParser::new(types, providers).parse(source)
}

enum Param {
    Argument(Argument),
    Flag(Flag),
}

fn is_ignored(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Splits a block header on whitespace outside parentheses, so that
/// `string:reason?(no reason given)` stays one token.
fn split_header(header: &str) -> Result<Vec<String>, DefinitionErrorKind> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in header.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| DefinitionErrorKind::UnbalancedParenthesis(header.to_string()))?;
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if depth != 0 {
        return Err(DefinitionErrorKind::UnbalancedParenthesis(header.to_string()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Splits `int:amount(5)` into `("int:amount", "5")`. The token must end with
/// `)`; the matching `(` is found by depth counting.
fn split_default(token: &str) -> Result<(&str, &str), DefinitionErrorKind> {
    let unbalanced = || DefinitionErrorKind::UnbalancedParenthesis(token.to_string());
    let mut depth = 0usize;

    for (index, ch) in token.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth = depth.checked_sub(1).ok_or_else(unbalanced)?;
                if depth == 0 {
                    let prefix = &token[..index];
                    if prefix.contains(['(', ')']) {
                        return Err(unbalanced());
                    }
                    return Ok((prefix, &token[index + 1..token.len() - 1]));
                }
            }
            _ => {}
        }
    }

    Err(unbalanced())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::testing::RecordingActor;
    use quill_core::{ArgType, Value};

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
            .with(ContextProvider::new("world", |_| Some(Value::from("overworld"))))
            .unwrap()
            .with(ContextProvider::new("self", |actor| Some(Value::from(actor.name()))))
            .unwrap()
    }

    fn parse_ok(source: &str) -> Vec<CommandNode> {
        parse(source, &types(), &providers()).unwrap()
    }

    fn parse_err(source: &str) -> DefinitionError {
        parse(source, &types(), &providers()).unwrap_err()
    }

    #[test]
    fn test_parse_simple_command() {
        let roots = parse_ok(
            "give,g int:amount player:target? {\n\
             \thelp Gives items\n\
             \tpermission items.give\n\
             \thook give\n\
             }",
        );
        assert_eq!(roots.len(), 1);
        let give = &roots[0];
        assert!(give.is_root());
        assert_eq!(give.aliases(), ["give", "g"]);
        assert_eq!(give.arguments().len(), 2);
        assert!(!give.arguments()[0].is_optional());
        assert!(give.arguments()[1].is_optional());
        assert!(!give.arguments()[1].hides_type());
        assert_eq!(give.arguments()[1].position(), 1);
        assert_eq!(give.help(), Some("Gives items"));
        assert_eq!(give.permission(), Some("items.give"));
        assert_eq!(give.hook(), Some("give"));
        assert_eq!(give.line(), 1);
    }

    #[test]
    fn test_help_lines_are_joined() {
        let roots = parse_ok("warp {\nhelp First line\nhelp Second line\n}");
        assert_eq!(roots[0].help(), Some("First line\nSecond line"));
    }

    #[test]
    fn test_nested_children_and_expanded_names() {
        let roots = parse_ok(
            "warp {\n\
                 set string:name {\n\
                     hook warp_set\n\
                     here {\n\
                         hook warp_here\n\
                     }\n\
                 }\n\
                 delete,del string:name {\n\
                     hook warp_delete\n\
                 }\n\
             }\n\
             home {\n\
                 hook home\n\
             }",
        );
        assert_eq!(roots.len(), 2);
        let warp = &roots[0];
        assert_eq!(warp.children().len(), 2);
        assert!(!warp.children()[0].is_root());
        assert_eq!(warp.children()[0].expanded_name(), "warp set");
        assert_eq!(
            warp.children()[0].children()[0].expanded_name(),
            "warp set here"
        );
        assert!(warp.children()[1].has_alias("DEL"));
        assert!(roots[1].is_root());
    }

    #[test]
    fn test_modifiers() {
        let roots = parse_ok(
            "mail player string:subject*? int:count(3) string:body... {\n}",
        );
        let args = roots[0].arguments();
        // bare type token hides its label
        assert_eq!(args[0].name(), "player");
        assert!(args[0].hides_type());
        assert!(!args[0].is_optional());

        assert!(args[1].hides_type());
        assert!(args[1].is_optional());

        assert!(args[2].is_optional());
        assert!(matches!(
            args[2].default_value(),
            Some(DefaultValue::Literal(Value::Int(3)))
        ));

        assert!(args[3].is_variadic());
        assert!(!args[3].is_optional());
    }

    #[test]
    fn test_reversed_hidden_optional_and_default_order() {
        let roots = parse_ok("a string:x?* int:y(7)? int:z?(8) {\n}");
        let args = roots[0].arguments();
        assert!(args[0].hides_type() && args[0].is_optional());
        assert!(matches!(
            args[1].default_value(),
            Some(DefaultValue::Literal(Value::Int(7)))
        ));
        assert!(matches!(
            args[2].default_value(),
            Some(DefaultValue::Literal(Value::Int(8)))
        ));
    }

    #[test]
    fn test_default_with_spaces_and_context_default() {
        let roots = parse_ok("kick player:target string:reason?(no reason given) {\n}");
        assert!(matches!(
            roots[0].arguments()[1].default_value(),
            Some(DefaultValue::Literal(Value::String(s))) if s == "no reason given"
        ));

        let roots = parse_ok("heal player:target?(context self) {\n}");
        let default = roots[0].arguments()[0].default_value().unwrap();
        let actor = RecordingActor::player("Alex");
        assert_eq!(default.resolve(&actor), Some(Value::from("Alex")));
    }

    #[test]
    fn test_flags() {
        let roots = parse_ok("clear --force,-f int:--radius(5) player {\n}");
        let node = &roots[0];
        assert_eq!(node.arguments().len(), 1);
        assert_eq!(node.flags().len(), 2);
        assert_eq!(node.flags()[0].names(), ["--force", "-f"]);
        assert!(node.flags()[0].is_switch());
        assert_eq!(node.flags()[1].name(), "--radius");
        assert_eq!(node.flags()[1].position(), 1);
        assert_eq!(node.expected_arity(), 4);
    }

    #[test]
    fn test_tags() {
        let roots = parse_ok(
            "admin {\n\
                 users console\n\
                 context world self\n\
                 assert self\n\
                 hidesub\n\
                 notab\n\
             }",
        );
        let admin = &roots[0];
        assert_eq!(admin.sender_kind(), SenderKind::Console);
        assert_eq!(admin.context().len(), 2);
        assert_eq!(admin.context()[1].name(), "self");
        assert_eq!(admin.asserters().len(), 1);
        assert!(admin.hides_child_help());
        assert!(admin.is_no_tab());
        assert_eq!(admin.expected_arity(), 3);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let roots = parse_ok("# top\n\nping {\n  # inside\n\n  hook ping\n}\n");
        assert_eq!(roots[0].hook(), Some("ping"));
    }

    #[test]
    fn test_unknown_type() {
        let err = parse_err("\nteleport location:to {\n}");
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, DefinitionErrorKind::UnknownType(t) if t == "location"));
    }

    #[test]
    fn test_malformed_argument() {
        let err = parse_err("a int: {\n}");
        assert!(matches!(err.kind, DefinitionErrorKind::MalformedArgument(_)));
        let err = parse_err("a int:b:c {\n}");
        assert!(matches!(err.kind, DefinitionErrorKind::MalformedArgument(_)));
    }

    #[test]
    fn test_unbalanced_default() {
        let err = parse_err("a int:b(5 {\n}");
        assert!(matches!(
            err.kind,
            DefinitionErrorKind::UnbalancedParenthesis(_)
        ));
        let err = parse_err("a int:b5) {\n}");
        assert!(matches!(
            err.kind,
            DefinitionErrorKind::UnbalancedParenthesis(_)
        ));
    }

    #[test]
    fn test_invalid_literal_default() {
        let err = parse_err("a int:b(five) {\n}");
        assert!(matches!(err.kind, DefinitionErrorKind::InvalidDefault { .. }));
    }

    #[test]
    fn test_unknown_provider() {
        let err = parse_err("a {\n  context nowhere\n}");
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, DefinitionErrorKind::UnknownProvider(p) if p == "nowhere"));
        let err = parse_err("a player:p?(context nowhere) {\n}");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_variadic_not_last() {
        let err = parse_err("say string:words... int:times {\n}");
        assert!(matches!(err.kind, DefinitionErrorKind::VariadicNotLast(n) if n == "words"));
    }

    #[test]
    fn test_decorated_flag() {
        let err = parse_err("a --force? {\n}");
        assert!(matches!(err.kind, DefinitionErrorKind::DecoratedFlag(_)));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parse_err("}").kind,
            DefinitionErrorKind::UnexpectedClose
        ));
        assert!(matches!(
            parse_err("hook x").kind,
            DefinitionErrorKind::OutsideBlock(_)
        ));
        let err = parse_err("a {\n  b {\n  }\n");
        assert_eq!(err.line, 1);
        assert!(matches!(err.kind, DefinitionErrorKind::UnclosedBlock));
        assert!(matches!(
            parse_err("a {\n  colour red\n}").kind,
            DefinitionErrorKind::UnknownTag(t) if t == "colour"
        ));
        assert!(matches!(
            parse_err("a {\n  users robots\n}").kind,
            DefinitionErrorKind::UnknownSenderKind(_)
        ));
        assert!(matches!(
            parse_err("a {\n  hook\n}").kind,
            DefinitionErrorKind::MissingValue(_)
        ));
    }

    #[test]
    fn test_error_aborts_whole_parse() {
        let result = parse(
            "ok {\n  hook ok\n}\nbroken unknown:x {\n}",
            &types(),
            &providers(),
        );
        assert_eq!(result.unwrap_err().line, 4);
    }

    #[test]
    fn test_parse_block_returns_cursor() {
        let lines = ["a {", "  b {", "  }", "}", "c {", "}"];
        let types = TypeRegistry::new();
        let providers = ContextProviders::new();
        let parser = DefinitionParser::new(&types, &providers);
        let (node, next) = parser.parse_block(&lines, 1, Some("a")).unwrap();
        assert_eq!(node.expanded_name(), "a b");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_parse_block_past_end() {
        let lines = ["a {", "}"];
        let types = TypeRegistry::new();
        let providers = ContextProviders::new();
        let parser = DefinitionParser::new(&types, &providers);
        let err = parser.parse_block(&lines, 2, None).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, DefinitionErrorKind::MissingBlock));
    }
}
