//! Tab completion over command trees.

use quill_core::{Actor, quote_if_needed};

use crate::argument::FLAG_MARKER;
use crate::node::CommandNode;

/// Returns completion candidates for the last of `tokens`.
///
/// `tokens` are the arguments after the root label, the last one being the
/// partially typed token (empty when the cursor follows a space); see
/// [`tokenize_for_completion`](quill_core::tokenize_for_completion).
/// Candidates keep first-seen order without duplicates, and candidates
/// containing whitespace come back quoted.
pub fn complete(node: &CommandNode, actor: &dyn Actor, tokens: &[String]) -> Vec<String> {
    let (current, typed) = match tokens.split_last() {
        Some((current, typed)) => (current.as_str(), typed),
        None => ("", tokens),
    };

    let mut candidates = Vec::new();
    collect(node, actor, typed, current, &mut candidates);

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.clone()));
    candidates
}

fn collect(
    node: &CommandNode,
    actor: &dyn Actor,
    typed: &[String],
    current: &str,
    out: &mut Vec<String>,
) {
    if !node.is_permitted(actor) {
        return;
    }

    match typed.split_first() {
        None => out.extend(
            node.children()
                .iter()
                .filter(|child| !child.is_no_tab() && child.is_permitted(actor))
                .map(CommandNode::primary_alias)
                .filter(|alias| starts_with_ignore_case(alias, current))
                .map(str::to_string),
        ),
        Some((first, rest)) => {
            for child in node.children().iter().filter(|child| child.has_alias(first)) {
                collect(child, actor, rest, current, out);
            }
        }
    }

    if !node.is_no_tab() {
        out.extend(
            slot_candidates(node, actor, typed, current)
                .into_iter()
                .filter(|candidate| starts_with_ignore_case(candidate, current))
                .map(|candidate| quote_if_needed(&candidate)),
        );
    }
}

/// Candidates for the slot the cursor is in: a flag name, a flag value or the
/// next positional argument.
fn slot_candidates(
    node: &CommandNode,
    actor: &dyn Actor,
    typed: &[String],
    current: &str,
) -> Vec<String> {
    let flags = node.flags();

    if current.starts_with(FLAG_MARKER) && !flags.is_empty() {
        return flags
            .iter()
            .filter(|flag| !typed.iter().any(|token| flag.matches(token)))
            .flat_map(|flag| flag.names().iter().cloned())
            .collect();
    }

    if let Some(previous) = typed.last()
        && let Some(flag) = flags.iter().find(|flag| flag.matches(previous))
        && !flag.is_switch()
    {
        return flag.ty().complete(actor);
    }

    let mut position = 0;
    let mut iter = typed.iter();
    while let Some(token) = iter.next() {
        match flags.iter().find(|flag| flag.matches(token)) {
            Some(flag) if !flag.is_switch() => {
                iter.next();
            }
            Some(_) => {}
            None => position += 1,
        }
    }

    let arguments = node.arguments();
    let slot = arguments
        .get(position)
        .or_else(|| arguments.last().filter(|argument| argument.is_variadic()));
    slot.map(|argument| argument.ty().complete(actor))
        .unwrap_or_default()
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate
        .to_lowercase()
        .starts_with(&prefix.to_lowercase())
}
