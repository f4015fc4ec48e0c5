//! `texindex extract`: manuscript to concept table.

use std::io;

use anyhow::{Context, Result};
use texindex_core::extract::{self, AutoKeep, ExtractionOptions, PromptReviewer};
use texindex_core::FileConfig;
use tracing::info;

use crate::ProcessExit;
use crate::cli::ExtractArgs;

/// Merges CLI values over config values over defaults.
pub(crate) fn build_options(args: &ExtractArgs, config: &FileConfig) -> ExtractionOptions {
    let defaults = ExtractionOptions::default();
    ExtractionOptions {
        from: args.from.clone(),
        to: args.to.clone(),
        number: args.number.or(config.extract_number).unwrap_or(defaults.number),
        exclude: args
            .exclude
            .clone()
            .or_else(|| config.extract_exclude.clone())
            .unwrap_or(defaults.exclude),
        min_length: args
            .min_length
            .or(config.extract_min_length)
            .unwrap_or(defaults.min_length),
        method: args.method.into(),
        detex_program: args
            .detex
            .clone()
            .or_else(|| config.detex_program.clone())
            .unwrap_or(defaults.detex_program),
        detex_exclude: config
            .detex_exclude_environments
            .clone()
            .unwrap_or(defaults.detex_exclude),
    }
}

pub(crate) async fn run_extract(args: &ExtractArgs, config: &FileConfig) -> Result<ProcessExit> {
    let options = build_options(args, config);
    info!(
        input = %args.input.display(),
        method = %options.method,
        number = options.number,
        "extracting concepts"
    );

    let candidates = extract::extract_candidates(&args.input, &options)
        .await
        .with_context(|| format!("Failed to extract concepts from '{}'", args.input.display()))?;

    let table = if args.select {
        let mut reviewer = PromptReviewer::new(io::stdin().lock(), io::stdout().lock());
        extract::build_table(candidates, &mut reviewer)?
    } else {
        extract::build_table(candidates, &mut AutoKeep)?
    };

    table
        .save(&args.output)
        .with_context(|| format!("Failed to write concept table '{}'", args.output.display()))?;
    info!(
        concepts = table.concept_count(),
        rows = table.len(),
        output = %args.output.display(),
        "concept table written"
    );
    Ok(ProcessExit::Success)
}
