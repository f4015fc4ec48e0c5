//! `texindex index`: concept table plus project to an indexed copy.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use texindex_core::config::build_stopwords;
use texindex_core::corpus::DEFAULT_EXTENSION;
use texindex_core::insertion::{
    DEFAULT_DISTANCE, DEFAULT_INDEX_COMMAND, DEFAULT_INVALID_CONCEPT_SUBSTRINGS,
};
use texindex_core::{
    ConceptTable, CorpusOptions, DistanceThreshold, Heuristics, IndexEngine, InsertionConfig,
    Inserter, LoadedConfig, OutputWriter, discover,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{summary, terminal};
use crate::cli::{HeuristicArg, IndexArgs};

/// Merges CLI values over config values over defaults.
pub(crate) fn build_insertion_config(
    args: &IndexArgs,
    loaded: &LoadedConfig,
) -> Result<InsertionConfig> {
    let file = loaded.file_config();

    let mut stopword_files: Vec<PathBuf> = loaded.stopwords_file().into_iter().collect();
    stopword_files.extend(args.stopwords_file.iter().cloned());
    let stopwords = build_stopwords(file.stopwords.as_deref().unwrap_or_default(), &stopword_files)
        .context("Failed to load stopwords")?;

    let heuristics = Heuristics {
        stop: args.methods.contains(&HeuristicArg::Stop),
        dist: args.methods.contains(&HeuristicArg::Dist),
    };
    if heuristics.stop && stopwords.is_empty() {
        warn!("stop heuristic enabled but no stopwords configured");
    }

    Ok(InsertionConfig {
        stopwords,
        distance: DistanceThreshold(args.distance.or(file.distance).unwrap_or(DEFAULT_DISTANCE)),
        heuristics,
        lexical: file
            .lexical_rules()
            .with_allowed_environments(args.allowed_envs.iter().cloned()),
        chapter_marker: file.chapter_marker()?,
        index_command: file
            .index_command
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_COMMAND.to_string()),
        invalid_substrings: file.invalid_concept_substrings.clone().unwrap_or_else(|| {
            DEFAULT_INVALID_CONCEPT_SUBSTRINGS
                .iter()
                .map(ToString::to_string)
                .collect()
        }),
    })
}

pub(crate) async fn run_index(
    args: &IndexArgs,
    loaded: &LoadedConfig,
    quiet: bool,
) -> Result<ProcessExit> {
    let table = ConceptTable::load(&args.concepts)
        .with_context(|| format!("Failed to load concept table '{}'", args.concepts.display()))?;
    info!(
        rows = table.len(),
        concepts = table.concept_count(),
        "concept table loaded"
    );

    let insertion = build_insertion_config(args, loaded)?;
    debug!(
        stopwords = insertion.stopwords.len(),
        distance = insertion.distance.lines(),
        stop = insertion.heuristics.stop,
        dist = insertion.heuristics.dist,
        "insertion settings"
    );

    let options = CorpusOptions {
        extension: loaded
            .file_config()
            .extension
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        exclude: args.exclude.clone(),
        skip_dirs: vec![args.output.clone()],
    };
    let corpus = discover(&args.input, &options).with_context(|| {
        format!("Failed to read the project of '{}'", args.input.display())
    })?;
    let writer = OutputWriter::new(corpus.root(), &args.output)?;
    let inserter = Arc::new(Inserter::new(&table, insertion));

    let mut engine = IndexEngine::new(usize::from(args.jobs))?.with_copy_assets(!args.no_copy_assets);
    let show_progress = terminal::should_show_progress(
        std::io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let bar = show_progress.then(|| terminal::document_bar(corpus.documents().len()));
    if let Some(bar) = &bar {
        engine = engine.with_progress(bar.clone());
    }

    let result = engine.process_corpus(&corpus, inserter, &writer).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let mut stats = result?;

    let mut warnings: Vec<String> = table.warnings().iter().map(ToString::to_string).collect();
    warnings.append(&mut stats.warnings);
    stats.warnings = warnings;

    if let Some(report) = &args.report {
        summary::write_report(report, &stats)?;
        info!(report = %report.display(), "run report written");
    }
    if !quiet {
        summary::print_summary(&stats, table.len());
    }
    Ok(ProcessExit::Success)
}
