//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use texindex_core::ExtractionMethod;
use texindex_core::engine::DEFAULT_JOBS;

const EXIT_CODES_HELP: &str = "Exit codes:\n  0 = success (warnings included)\n  1 = fatal error";

/// Propose index concepts for a LaTeX manuscript and insert \index{...} entries.
///
/// `extract` turns the manuscript into a concept table (concept,match,weight);
/// `index` writes a copy of the project with index entries placed after each
/// accepted occurrence.
#[derive(Parser, Debug)]
#[command(name = "texindex")]
#[command(author, version, about)]
#[command(after_help = EXIT_CODES_HELP)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: $XDG_CONFIG_HOME/texindex/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract candidate concepts into a concept CSV
    Extract(ExtractArgs),
    /// Insert index entries into a copy of the project
    Index(IndexArgs),
}

/// Candidate extraction method.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodArg {
    /// RAKE keyword scores
    #[default]
    Rake,
    /// YAKE keyword scores
    Yake,
    /// Frequency of capitalised word runs
    Entities,
}

impl From<MethodArg> for ExtractionMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Rake => Self::Rake,
            MethodArg::Yake => Self::Yake,
            MethodArg::Entities => Self::Entities,
        }
    }
}

/// Insertion heuristic selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicArg {
    /// Skip concepts and matches listed as stopwords
    Stop,
    /// Keep a minimum line distance between entries of one concept per chapter
    Dist,
}

/// Arguments of `texindex extract`.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Main LaTeX file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output concept CSV
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Exact title of the first section to analyse (empty: start of text)
    #[arg(short, long, default_value = texindex_core::extract::DEFAULT_FROM)]
    pub from: String,

    /// Exact title of the first section to ignore (empty: end of text)
    #[arg(short, long, default_value = texindex_core::extract::DEFAULT_TO)]
    pub to: String,

    /// Number of concepts to extract [default: 200]
    #[arg(short, long)]
    pub number: Option<usize>,

    /// Comma-separated terms never proposed [default: Figure,Table,Figures,Tables,Section,Sections]
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Minimum number of characters of a concept [default: 0]
    #[arg(short = 'l', long)]
    pub min_length: Option<usize>,

    /// Concept extraction method
    #[arg(short, long, value_enum, default_value_t = MethodArg::Rake)]
    pub method: MethodArg,

    /// Interactively select or edit the concepts to keep
    #[arg(short, long)]
    pub select: bool,

    /// LaTeX-to-text program [default: detex]
    #[arg(long, value_name = "PROGRAM")]
    pub detex: Option<String>,
}

/// Arguments of `texindex index`.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Main LaTeX file (its directory is the project root)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Concept CSV (concept,match,weight)
    #[arg(short, long, value_name = "FILE")]
    pub concepts: PathBuf,

    /// Output directory (a copy of the project with \index{...} entries)
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Exclude documents by glob, relative to the project root (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Enable an insertion heuristic (repeatable)
    #[arg(short, long = "method", value_enum, value_name = "HEURISTIC")]
    pub methods: Vec<HeuristicArg>,

    /// Additional environment whose body may be indexed (repeatable)
    #[arg(short, long = "allowed-env", value_name = "ENV")]
    pub allowed_envs: Vec<String>,

    /// Minimum lines between entries of one concept in a chapter [default: 200]
    #[arg(long, value_name = "LINES")]
    pub distance: Option<usize>,

    /// Stopword list file, one entry per line (repeatable)
    #[arg(long, value_name = "FILE")]
    pub stopwords_file: Vec<PathBuf>,

    /// Documents processed in parallel (1-64)
    #[arg(short, long, default_value_t = DEFAULT_JOBS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub jobs: u8,

    /// Do not copy non-document files into the output directory
    #[arg(long)]
    pub no_copy_assets: bool,

    /// Write the run statistics as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}
