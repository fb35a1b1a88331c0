use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::validator::ValidationEngine;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
}

impl VerbosityLevel {
    /// Default `tracing` filter directive for this verbosity
    pub fn log_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
        }
    }
}

/// Report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Human,
    /// Machine-readable JSON report
    Json,
    /// Single summary line
    Summary,
}

/// XML sitemap generator
#[derive(Parser, Debug, Clone)]
#[command(name = "sitemap-gen")]
#[command(
    about = "Generate sitemaps.org XML sitemaps, splitting into an index when needed, and validate them"
)]
#[command(version)]
pub struct Cli {
    /// File of URL entries: a .json array of {loc, lastmod, changefreq, priority}
    /// objects, or plain text with one location per line
    #[arg(help = "URL entry file (.json or one location per line)")]
    pub input: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory the sitemap files are written into
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Base URL relative locations are resolved against
    #[arg(short = 'b', long = "base-url")]
    pub base_url: Option<String>,

    /// Base URL shard files are referenced under in the index
    #[arg(long = "sitemap-base-url")]
    pub sitemap_base_url: Option<String>,

    /// XSL stylesheet URL referenced from every document
    #[arg(long = "stylesheet")]
    pub stylesheet_url: Option<String>,

    /// Maximum URL entries per sitemap file
    #[arg(long = "max-urls")]
    pub max_urls: Option<usize>,

    /// Advisory maximum file size in bytes
    #[arg(long = "max-file-size")]
    pub max_file_size: Option<u64>,

    /// Skip schema validation of the written files
    #[arg(long = "no-validate")]
    pub no_validate: bool,

    /// Validation engine (libxml2 or structural)
    #[arg(long = "engine")]
    pub engine: Option<ValidationEngine>,

    /// Validate shard files concurrently
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Number of validation threads when running in parallel
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.input.exists() {
            return Err(format!("Input file does not exist: {}", self.input.display()));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Verbosity requested on the command line alone, used before config is loaded
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}
