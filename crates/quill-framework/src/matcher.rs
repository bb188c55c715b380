//! Argument matching.
//!
//! [`match_arguments`] decides whether a token list fits a node's declared
//! shape and, if it does, produces the values handed to the node's handler:
//! positional values first, then one value per flag in declaration order, then
//! one value per context provider.
//!
//! Flags are pulled out of the token list before positional matching starts.
//! The remaining tokens are assigned left to right. When there are fewer
//! tokens than declarations, some optional arguments have to be skipped, and
//! at each optional declaration the matcher picks which of the reachable
//! declarations takes the current token: one that leaves the rest of the line
//! satisfiable, converts the token, and is not the generic `string` type when
//! a more specific type also accepts it.

use tracing::trace;

use quill_core::{Actor, Value};

use crate::argument::Argument;
use crate::node::CommandNode;

/// The result of matching tokens against one node.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The tokens fit. One slot per handler parameter after the actor.
    Matched(Vec<Option<Value>>),
    /// The tokens do not fit this node's shape.
    NoMatch,
    /// The shape fit but a context provider or asserter produced no value.
    /// Carries the provider's message; `None` means help should be shown.
    ContextFailure(Option<String>),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Matches `tokens` against the arguments, flags, asserters and context
/// providers of `node`.
pub fn match_arguments(node: &CommandNode, actor: &dyn Actor, tokens: &[String]) -> MatchOutcome {
    let Some((positional, flag_values)) = extract_flags(node, actor, tokens) else {
        trace!(command = %node.expanded_name(), "Flag value missing or invalid");
        return MatchOutcome::NoMatch;
    };

    let Some(mut values) = match_positional(node.arguments(), actor, &positional) else {
        trace!(
            command = %node.expanded_name(),
            tokens = positional.len(),
            "Positional arguments do not match"
        );
        return MatchOutcome::NoMatch;
    };
    values.extend(flag_values);

    for asserter in node.asserters() {
        if asserter.supply(actor).is_none() {
            trace!(provider = %asserter.name(), "Asserter produced no value");
            return MatchOutcome::ContextFailure(asserter.error_message().map(str::to_string));
        }
    }
    for provider in node.context() {
        match provider.supply(actor) {
            Some(value) => values.push(Some(value)),
            None => {
                trace!(provider = %provider.name(), "Context provider produced no value");
                return MatchOutcome::ContextFailure(
                    provider.error_message().map(str::to_string),
                );
            }
        }
    }

    MatchOutcome::Matched(values)
}

/// Splits flag tokens from positional ones. Returns `None` when a typed flag
/// has no value token or its value does not convert.
fn extract_flags<'t>(
    node: &CommandNode,
    actor: &dyn Actor,
    tokens: &'t [String],
) -> Option<(Vec<&'t str>, Vec<Option<Value>>)> {
    let flags = node.flags();
    if flags.is_empty() {
        return Some((tokens.iter().map(String::as_str).collect(), Vec::new()));
    }

    let mut positional = Vec::with_capacity(tokens.len());
    let mut present: Vec<Option<Value>> = vec![None; flags.len()];
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        let Some(flag) = flags.iter().find(|flag| flag.matches(token)) else {
            positional.push(token.as_str());
            continue;
        };
        let value = if flag.is_switch() {
            Value::Bool(true)
        } else {
            flag.ty().convert(Some(actor), iter.next()?)?
        };
        present[flag.position()] = Some(value);
    }

    let values = flags
        .iter()
        .zip(present)
        .map(|(flag, value)| value.or_else(|| flag.default_for(actor)))
        .collect();
    Some((positional, values))
}

/// Assigns positional tokens to declarations. Returns one value per
/// declaration, or `None` when the tokens do not fit.
fn match_positional(
    args: &[Argument],
    actor: &dyn Actor,
    tokens: &[&str],
) -> Option<Vec<Option<Value>>> {
    let declared = args.len();
    let variadic = args.last().is_some_and(Argument::is_variadic);
    if tokens.len() > declared && !variadic {
        return None;
    }

    // Number of optional declarations that may still be skipped. A variadic
    // tail absorbs surplus tokens, so any optional before it may be skipped.
    let mut diff = declared.saturating_sub(tokens.len());
    if variadic {
        let skippable = args[..declared - 1].iter().filter(|a| a.is_optional()).count();
        diff = diff.max(skippable);
    }

    let mut slots: Vec<Option<Value>> = vec![None; declared];
    let mut decl = 0;
    let mut index = 0;

    while index < tokens.len() {
        let arg = args.get(decl)?;
        let rest = tokens.len() - index - 1;

        if arg.is_variadic() {
            slots[decl] = Some(convert_rest(arg, actor, &tokens[index..])?);
            break;
        }

        if diff > 0
            && arg.is_optional()
            && let Some((chosen, value)) =
                pick_candidate(args, decl, diff, rest, actor, tokens, index)
        {
            trace!(
                argument = %args[chosen].name(),
                skipped = chosen - decl,
                "Chose optional candidate"
            );
            diff -= chosen - decl;
            slots[chosen] = Some(value);
            decl = chosen + 1;
            if args[chosen].is_variadic() {
                break;
            }
            index += 1;
            continue;
        }

        slots[decl] = Some(arg.ty().convert(Some(actor), tokens[index])?);
        decl += 1;
        index += 1;
    }

    args.iter()
        .zip(slots)
        .map(|(arg, slot)| match slot {
            Some(value) => Some(Some(value)),
            None if arg.is_optional() => Some(arg.default_for(actor)),
            None => None,
        })
        .collect()
}

/// Chooses which declaration at or after `decl` takes `tokens[index]`.
fn pick_candidate(
    args: &[Argument],
    decl: usize,
    diff: usize,
    rest: usize,
    actor: &dyn Actor,
    tokens: &[&str],
    index: usize,
) -> Option<(usize, Value)> {
    let mut converted: Vec<(usize, Value)> = Vec::new();

    for candidate in decl..args.len() {
        if candidate - decl > diff {
            break;
        }
        let arg = &args[candidate];
        if is_feasible(args, candidate, rest) {
            let value = if arg.is_variadic() {
                convert_rest(arg, actor, &tokens[index..])
            } else {
                arg.ty().convert(Some(actor), tokens[index])
            };
            if let Some(value) = value {
                converted.push((candidate, value));
            }
        }
        if !arg.is_optional() {
            break;
        }
    }

    if converted.len() > 1 && !converted.iter().all(|(c, _)| args[*c].ty().is_string()) {
        converted.retain(|(c, _)| !args[*c].ty().is_string());
    }
    converted.into_iter().next()
}

/// Returns `true` if `rest` tokens after the current one can still be placed
/// once declaration `candidate` takes the current token.
fn is_feasible(args: &[Argument], candidate: usize, rest: usize) -> bool {
    if args[candidate].is_variadic() {
        return true;
    }
    let after = &args[candidate + 1..];
    let required = after.iter().filter(|a| !a.is_optional()).count();
    let open_ended = after.iter().any(Argument::is_variadic);
    required <= rest && (open_ended || rest <= after.len())
}

fn convert_rest(arg: &Argument, actor: &dyn Actor, tokens: &[&str]) -> Option<Value> {
    arg.ty().convert(Some(actor), &tokens.join(" "))
}
