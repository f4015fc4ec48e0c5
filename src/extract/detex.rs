//! LaTeX-to-text conversion and text window selection.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::ExtractionError;

/// Default LaTeX-to-text program.
pub const DEFAULT_DETEX_PROGRAM: &str = "detex";

/// Environments removed before extraction by default.
pub const DEFAULT_DETEX_EXCLUDE: &[&str] = &[
    "table",
    "figure",
    "equation",
    "minipage",
    "multicols",
    "lstlisting",
];

#[allow(clippy::expect_used)]
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run regex is valid")); // Static pattern, safe to panic

#[allow(clippy::expect_used)]
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("bracket regex is valid")); // Static pattern, safe to panic

/// Runs `program -e env1,env2,... input` and returns its standard output.
///
/// Output that is not valid UTF-8 is converted lossily; the text only feeds
/// keyword extraction.
///
/// # Errors
/// Returns [`ExtractionError::Spawn`] if the program cannot be started and
/// [`ExtractionError::Failed`] if it exits unsuccessfully.
#[instrument(skip(exclude_envs))]
pub async fn run_detex(
    program: &str,
    input: &Path,
    exclude_envs: &[String],
) -> Result<String, ExtractionError> {
    let mut command = Command::new(program);
    if !exclude_envs.is_empty() {
        command.arg("-e").arg(exclude_envs.join(","));
    }
    command.arg(input);
    debug!(?command, "running detex");

    let output = command
        .output()
        .await
        .map_err(|source| ExtractionError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ExtractionError::Failed {
            program: program.to_string(),
            input: input.to_path_buf(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    match String::from_utf8(output.stdout) {
        Ok(text) => Ok(text),
        Err(err) => {
            warn!(program, "output is not valid UTF-8, converting lossily");
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// Keeps the lines from the one equal to `from` up to (excluding) the one
/// equal to `to`, then normalizes the text.
///
/// An empty `from` starts at the top; an empty `to` runs to the end. A `to`
/// line seen before `from` ends the window. Runs of blank lines collapse to
/// one and bracketed fragments (`[...]`, left over from citations and
/// optional arguments) are dropped.
#[must_use]
pub fn select_window(text: &str, from: &str, to: &str) -> String {
    let mut inside = from.is_empty();
    let mut window = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if !inside && bare == from {
            inside = true;
        }
        if !to.is_empty() && bare == to {
            break;
        }
        if inside {
            window.push_str(line);
        }
    }

    let collapsed = BLANK_RUNS.replace_all(&window, "\n\n");
    BRACKETED.replace_all(&collapsed, "").into_owned()
}
