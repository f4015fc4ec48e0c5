//! CLI entry point for the texindex tool.

use std::process::ExitCode;

mod app;
mod cli;

/// Process outcome mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Run completed; warnings do not change the outcome.
    Success,
    /// Fatal error.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_texindex().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}
