//! Top-level flow: parse arguments, set up logging and config, dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use texindex_core::config::load_config;
use tracing::debug;

use crate::ProcessExit;
use crate::app::{extract_command, index_command, terminal};
use crate::cli::{Cli, Command};

pub(crate) async fn run_texindex() -> Result<ProcessExit> {
    // Parse before tracing so --help works without logs
    let cli = Cli::parse();

    let no_color = terminal::should_disable_color(
        cli.no_color,
        terminal::no_color_env_requested(),
        terminal::is_dumb_terminal(),
    );
    terminal::init_tracing(terminal::default_level(cli.quiet, cli.verbose), no_color);
    debug!(?cli, "CLI arguments parsed");

    let loaded = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.loaded_from_file) {
        debug!(path = %path.display(), "using config file");
    }

    match &cli.command {
        Command::Extract(args) => extract_command::run_extract(args, &loaded.file_config()).await,
        Command::Index(args) => index_command::run_index(args, &loaded, cli.quiet).await,
    }
}
