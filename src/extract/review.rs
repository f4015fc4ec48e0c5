//! Candidate review: headless or interactive.

use std::io::{BufRead, Write};

use tracing::warn;

use super::ExtractionError;

/// A proposed concept with the literal strings that should trigger it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Index entry label.
    pub concept: String,
    /// Triggers; initially just the concept itself.
    pub matches: Vec<String>,
    /// Extraction score or frequency.
    pub weight: f64,
}

impl Candidate {
    /// Creates a candidate whose only match is the concept.
    #[must_use]
    pub fn new(concept: impl Into<String>, weight: f64) -> Self {
        let concept = concept.into();
        Self {
            matches: vec![concept.clone()],
            concept,
            weight,
        }
    }
}

/// Position of a candidate in the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Zero-based candidate index.
    pub index: usize,
    /// Number of candidates.
    pub total: usize,
}

/// Outcome of reviewing one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Write the candidate.
    Keep,
    /// Discard the candidate.
    Drop,
    /// Replace the candidate and review it again.
    Edit(Candidate),
    /// Discard this candidate and keep every following one without asking.
    KeepAll,
}

/// Decides which candidates end up in the concept table.
pub trait Reviewer {
    /// Reviews one candidate.
    ///
    /// # Errors
    /// Returns [`ExtractionError::Prompt`] if the reviewer cannot talk to the operator.
    fn decide(&mut self, candidate: &Candidate, progress: Progress) -> Result<Decision, ExtractionError>;
}

/// Keeps every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoKeep;

impl Reviewer for AutoKeep {
    fn decide(&mut self, _candidate: &Candidate, _progress: Progress) -> Result<Decision, ExtractionError> {
        Ok(Decision::Keep)
    }
}

const PROMPT: &str =
    "[k/enter=KEEP, a=KEEP ALL FOLLOWING, d=DELETE, e=RENAME INDEX ENTRY, w=EDIT MATCHES] ";

/// Line-oriented interactive reviewer.
///
/// Answers: `k` or empty keeps, `a` skips this candidate and keeps all
/// following ones, `d` deletes, `e` renames the index entry, `w` replaces the
/// matches with a comma-separated list. Unknown answers ask again. End of
/// input keeps this and every remaining candidate.
#[derive(Debug)]
pub struct PromptReviewer<R, W> {
    input: R,
    output: W,
    exhausted: bool,
}

impl<R: BufRead, W: Write> PromptReviewer<R, W> {
    /// Creates a reviewer reading answers from `input` and prompting on `output`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            exhausted: false,
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>, ExtractionError> {
        write!(self.output, "{prompt}").map_err(ExtractionError::Prompt)?;
        self.output.flush().map_err(ExtractionError::Prompt)?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(ExtractionError::Prompt)?;
        if read == 0 {
            if !self.exhausted {
                warn!("end of review input, keeping remaining candidates");
            }
            self.exhausted = true;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

impl<R: BufRead, W: Write> Reviewer for PromptReviewer<R, W> {
    fn decide(&mut self, candidate: &Candidate, progress: Progress) -> Result<Decision, ExtractionError> {
        if self.exhausted {
            return Ok(Decision::Keep);
        }
        loop {
            writeln!(
                self.output,
                "\n[{:4}/{}] {} -> {}",
                progress.index,
                progress.total,
                candidate.matches.join(","),
                candidate.concept
            )
            .map_err(ExtractionError::Prompt)?;

            let Some(answer) = self.ask(PROMPT)? else {
                return Ok(Decision::Keep);
            };

            match answer.trim() {
                "" | "k" => return Ok(Decision::Keep),
                "a" => return Ok(Decision::KeepAll),
                "d" => return Ok(Decision::Drop),
                "e" => {
                    let Some(concept) = self.ask("index entry rename> ")? else {
                        return Ok(Decision::Keep);
                    };
                    return Ok(Decision::Edit(Candidate {
                        concept,
                        ..candidate.clone()
                    }));
                }
                "w" => {
                    let Some(list) = self.ask("edit matches (comma-separated)> ")? else {
                        return Ok(Decision::Keep);
                    };
                    return Ok(Decision::Edit(Candidate {
                        matches: list.split(',').map(ToString::to_string).collect(),
                        ..candidate.clone()
                    }));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn progress() -> Progress {
        Progress { index: 3, total: 10 }
    }

    fn review(answers: &str) -> (Decision, String) {
        let mut output = Vec::new();
        let decision = {
            let mut reviewer = PromptReviewer::new(Cursor::new(answers.as_bytes()), &mut output);
            reviewer
                .decide(&Candidate::new("graph", 2.0), progress())
                .unwrap()
        };
        (decision, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_enter_and_k_keep() {
        assert_eq!(review("\n").0, Decision::Keep);
        assert_eq!(review("k\n").0, Decision::Keep);
    }

    #[test]
    fn test_delete_and_keep_all() {
        assert_eq!(review("d\n").0, Decision::Drop);
        assert_eq!(review("a\n").0, Decision::KeepAll);
    }

    #[test]
    fn test_rename_concept() {
        let (decision, _) = review("e\nGraph theory\n");
        let Decision::Edit(edited) = decision else {
            panic!("expected edit");
        };
        assert_eq!(edited.concept, "Graph theory");
        assert_eq!(edited.matches, vec!["graph"]);
    }

    #[test]
    fn test_edit_matches() {
        let (decision, _) = review("w\ngraph,graphs\n");
        let Decision::Edit(edited) = decision else {
            panic!("expected edit");
        };
        assert_eq!(edited.concept, "graph");
        assert_eq!(edited.matches, vec!["graph", "graphs"]);
    }

    #[test]
    fn test_unknown_answer_asks_again() {
        let (decision, output) = review("x\nd\n");
        assert_eq!(decision, Decision::Drop);
        assert_eq!(output.matches("graph -> graph").count(), 2);
    }

    #[test]
    fn test_prompt_shows_progress() {
        let (_, output) = review("k\n");
        assert!(output.contains("[   3/10] graph -> graph"));
    }

    #[test]
    fn test_end_of_input_keeps_rest() {
        assert_eq!(review("").0, Decision::Keep);
    }

    #[test]
    fn test_end_of_input_stops_prompting() {
        let mut output = Vec::new();
        {
            let mut reviewer = PromptReviewer::new(Cursor::new(&b"d\n"[..]), &mut output);
            let candidate = Candidate::new("graph", 2.0);
            assert_eq!(reviewer.decide(&candidate, progress()).unwrap(), Decision::Drop);
            assert_eq!(reviewer.decide(&candidate, progress()).unwrap(), Decision::Keep);
            assert_eq!(reviewer.decide(&candidate, progress()).unwrap(), Decision::Keep);
        }
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("graph -> graph").count(), 2);
    }

    #[test]
    fn test_auto_keep() {
        let decision = AutoKeep
            .decide(&Candidate::new("graph", 1.0), progress())
            .unwrap();
        assert_eq!(decision, Decision::Keep);
    }
}
