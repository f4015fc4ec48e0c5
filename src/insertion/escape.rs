//! Index marker construction with makeindex escaping.

/// Characters with special meaning inside a makeindex entry.
const MAKEINDEX_SPECIALS: [char; 4] = ['"', '!', '@', '|'];

/// Builds `\<command>{<escaped concept>}`.
#[must_use]
pub fn index_marker(command: &str, concept: &str) -> String {
    format!("\\{command}{{{}}}", escape_concept(concept))
}

/// Escapes a concept for use as an index entry.
///
/// - makeindex specials get the `"` quote prefix unless already escaped by a
///   backslash (`\"o` stays an umlaut);
/// - line breaks become spaces;
/// - braces are kept when balanced (LaTeX markup in concepts) and
///   backslash-escaped otherwise, so the marker argument always closes.
#[must_use]
pub fn escape_concept(concept: &str) -> String {
    let balanced = braces_balanced(concept);
    let mut escaped = String::with_capacity(concept.len() + 4);
    let mut backslashes = 0usize;

    for ch in concept.chars() {
        let after_backslash = backslashes % 2 == 1;
        match ch {
            c if MAKEINDEX_SPECIALS.contains(&c) && !after_backslash => {
                escaped.push('"');
                escaped.push(c);
            }
            '\r' => {}
            '\n' => escaped.push(' '),
            '{' | '}' if !balanced && !after_backslash => {
                escaped.push('\\');
                escaped.push(ch);
            }
            c => escaped.push(c),
        }
        backslashes = if ch == '\\' { backslashes + 1 } else { 0 };
    }
    escaped
}

fn braces_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    let mut backslashes = 0usize;
    for ch in text.chars() {
        let escaped = backslashes % 2 == 1;
        match ch {
            '{' if !escaped => depth += 1,
            '}' if !escaped => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
        backslashes = if ch == '\\' { backslashes + 1 } else { 0 };
    }
    depth == 0
}
