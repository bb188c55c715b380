//! Shell-like splitting of raw input lines.
//!
//! Handles:
//! - Space-separated arguments (runs of whitespace collapse)
//! - Double-quoted groups, which may contain spaces and may be empty
//! - Backslash escapes: `\x` always yields `x` literally, inside or outside
//!   quotes
//!
//! An unterminated quote extends to the end of the line.

/// Splits `input` into argument tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    split(input).0
}

/// Splits `input` for completion.
///
/// Identical to [`tokenize`], except that input which is empty or ends with
/// unquoted whitespace yields a trailing empty token: the word currently
/// being typed.
pub fn tokenize_for_completion(input: &str) -> Vec<String> {
    let (mut tokens, open) = split(input);
    if !open {
        tokens.push(String::new());
    }
    tokens
}

/// Wraps `candidate` in double quotes if it contains whitespace, escaping
/// embedded quotes and backslashes so that [`tokenize`] reads it back as one
/// token.
pub fn quote_if_needed(candidate: &str) -> String {
    if !candidate.chars().any(char::is_whitespace) {
        return candidate.to_string();
    }
    let mut quoted = String::with_capacity(candidate.len() + 2);
    quoted.push('"');
    for ch in candidate.chars() {
        if matches!(ch, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Returns the tokens and whether the last token is still open (no
/// whitespace has terminated it).
fn split(input: &str) -> (Vec<String>, bool) {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quote = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => {
                escape_next = true;
                in_token = true;
            }
            '"' => {
                in_quote = !in_quote;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quote => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }

    (args, in_token)
}
