//! Named-entity style candidates: runs of capitalised words.
//!
//! A run is a sequence of consecutive capitalised words inside one sentence
//! ("Information Retrieval", "Lisbon"). Common function words never take
//! part in a run, and a single capitalised word opening a sentence is not
//! counted, since capitalisation there says nothing.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use tracing::{debug, instrument};

static COMMON_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "The", "This", "That", "These", "Those", "When", "Where", "What", "Which", "While",
        "With", "From", "Into", "Upon", "About", "After", "Before", "During", "Between",
        "Through", "Against", "Without", "Within", "Along", "Beyond", "Under", "Above", "Below",
        "Here", "There", "Then", "Thus", "Also", "Even", "Just", "Only", "Some", "Many", "Much",
        "Most", "Other", "Such", "Each", "Every", "Both", "Either", "Neither", "All", "Any",
        "Few", "More", "Less", "But", "And", "For", "Nor", "Not", "Yet", "His", "Her", "Its",
        "Our", "Your", "Their", "Who", "How", "Why", "Can", "May", "Will", "Shall", "Should",
        "Would", "Could", "Must", "Has", "Have", "Had", "Was", "Were", "Been", "Being", "Are",
        "Now", "However", "Therefore", "Moreover", "Furthermore", "Finally", "First", "Second",
        "Next", "Last", "In", "On", "At", "By", "Of", "To", "As", "If", "It", "We", "Is", "A",
        "An", "Or", "So", "Figure", "Table", "Section", "Chapter", "Part", "Appendix",
    ]
    .into_iter()
    .collect()
});

/// Returns `(entity, count)` pairs, most frequent first, then alphabetical.
#[must_use]
#[instrument(skip_all, fields(text_len = text.len()))]
pub fn extract_entities(text: &str) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_starts_sentence = false;
    let mut sentence_start = true;

    for token in text.split_whitespace() {
        let word = token.trim_matches(|c: char| !c.is_alphanumeric());
        let ends_sentence = token.ends_with(['.', '!', '?', ':']);
        let ends_phrase = ends_sentence || token.ends_with([',', ';', ')']);

        if is_capitalised(word) {
            if run.is_empty() {
                run_starts_sentence = sentence_start;
            }
            run.push(word);
        } else {
            flush(&mut run, run_starts_sentence, &mut counts);
        }
        if ends_phrase {
            flush(&mut run, run_starts_sentence, &mut counts);
        }
        sentence_start = ends_sentence;
    }
    flush(&mut run, run_starts_sentence, &mut counts);

    let mut entities: Vec<(String, usize)> = counts.into_iter().collect();
    entities.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then(a.cmp(b)));
    debug!(count = entities.len(), "capitalised entities");
    entities
}

fn is_capitalised(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_uppercase() && word.chars().count() >= 2 && !COMMON_WORDS.contains(word)
}

fn flush(run: &mut Vec<&str>, starts_sentence: bool, counts: &mut HashMap<String, usize>) {
    if run.is_empty() || (starts_sentence && run.len() == 1) {
        run.clear();
        return;
    }
    *counts.entry(run.join(" ")).or_insert(0) += 1;
    run.clear();
}
