//! Longest-match lookup of concept triggers at a text position.

use std::collections::HashMap;

/// Index of candidate triggers keyed by their first character.
///
/// Each bucket is ordered by trigger length (longest first) and then by table
/// order, so the first trigger that matches at a position is the winner.
#[derive(Debug, Default)]
pub(crate) struct Matcher {
    buckets: HashMap<char, Vec<(usize, String)>>,
}

impl Matcher {
    /// Builds the index from `(entry index, trigger)` pairs in table order.
    pub(crate) fn new<'a, I>(triggers: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let mut buckets: HashMap<char, Vec<(usize, String)>> = HashMap::new();
        for (index, trigger) in triggers {
            let Some(first) = trigger.chars().next() else {
                continue;
            };
            buckets
                .entry(first)
                .or_default()
                .push((index, trigger.to_string()));
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by(|(a_index, a), (b_index, b)| {
                b.len().cmp(&a.len()).then(a_index.cmp(b_index))
            });
        }
        Self { buckets }
    }

    /// Returns the entry index and byte length of the winning trigger that
    /// occurs at `pos` with word boundaries on both sides.
    pub(crate) fn find_at(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        let rest = &text[pos..];
        let first = rest.chars().next()?;
        let bucket = self.buckets.get(&first)?;
        let before = text[..pos].chars().next_back();

        bucket
            .iter()
            .find(|(_, trigger)| {
                rest.starts_with(trigger.as_str())
                    && at_word_boundary(before, trigger, rest[trigger.len()..].chars().next())
            })
            .map(|(index, trigger)| (*index, trigger.len()))
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// A trigger that starts (ends) with a word character must not be glued to
/// a word character before (after) it.
fn at_word_boundary(before: Option<char>, trigger: &str, after: Option<char>) -> bool {
    let starts_word = trigger.chars().next().is_some_and(is_word_char);
    let ends_word = trigger.chars().next_back().is_some_and(is_word_char);
    let start_ok = !starts_word || !before.is_some_and(is_word_char);
    let end_ok = !ends_word || !after.is_some_and(is_word_char);
    start_ok && end_ok
}
