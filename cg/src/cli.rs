//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::render::{ClauseSort, ClauseView};

/// clauseguard - contract risk review from the terminal
#[derive(Parser)]
#[command(
    name = "cg",
    about = "Upload PDF contracts, review their clause-by-clause risk analysis and ask questions about them",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate files without uploading them
    Check {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Upload files and print their public URLs
    Upload {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Analyze an already uploaded document
    Analyze {
        /// Public URL returned by the upload
        url: String,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Ask questions about an uploaded document
    Chat {
        /// Public URL returned by the upload
        url: String,

        /// Ask one question and exit (interactive when omitted)
        question: Option<String>,
    },

    /// Upload, analyze and render in one go
    Review {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        #[command(flatten)]
        display: DisplayArgs,

        /// Start a chat session about the analyzed document afterwards
        #[arg(long)]
        chat: bool,
    },
}

/// How to present an analysis
#[derive(Debug, Clone, clap::Args)]
pub struct DisplayArgs {
    /// Only list clauses flagged as risky
    #[arg(long)]
    pub risky_only: bool,

    /// Clause ordering
    #[arg(short, long, value_enum, default_value_t = SortOrder::Order)]
    pub sort: SortOrder,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl DisplayArgs {
    pub fn clause_view(&self) -> ClauseView {
        ClauseView {
            risky_only: self.risky_only,
            sort: match self.sort {
                SortOrder::Order => ClauseSort::Order,
                SortOrder::Score => ClauseSort::Score,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Service order
    #[default]
    Order,
    /// Highest score first
    Score,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clauseguard")
        .join("logs")
        .join("clauseguard.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Text shown after `--help`
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}
