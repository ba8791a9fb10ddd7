//! CLI module for Tickerwise
//!
//! Command-line parsing for the `tickerwise` binary. Uses clap for argument
//! parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tickerwise - stock analysis reports from a sequential agent pipeline
#[derive(Parser, Debug)]
#[command(
    name = "tickerwise",
    version,
    about = "Stock analysis reports from a sequential LLM agent pipeline",
    long_about = "Runs four agent steps (collect data, collect news, analyze, advise) for one\n\
                  company, writes the final recommendation as a report and optionally emails it.",
    after_help = "EXAMPLES:\n    \
                  tickerwise generate RELIANCE.NS              # Print a report\n    \
                  tickerwise generate AAPL --trace             # Also print every step's output\n    \
                  tickerwise generate AAPL --email me@x.com    # Report and email the PDF\n    \
                  tickerwise serve                             # Start the HTTP API"
)]
pub struct Cli {
    /// Path to the configuration file [default: tickerwise.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a stock analysis report for a company
    Generate {
        /// Company name or ticker symbol
        company: String,

        /// Email the rendered report to this address
        #[arg(short, long)]
        email: Option<String>,

        /// Print every step's output (chain of thought) and token usage
        #[arg(short, long)]
        trace: bool,

        /// Skip PDF rendering (text and HTML are still written)
        #[arg(long)]
        no_document: bool,
    },

    /// Email an existing report document
    Email {
        /// Company name used in the subject line
        company: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Path to the document to attach
        #[arg(long)]
        document: PathBuf,
    },

    /// List the pipeline steps with their tools and context
    Steps,

    /// Show the resolved configuration (secrets masked)
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Start the HTTP API server
    Serve,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration path, and whether it was given explicitly
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (
                PathBuf::from(crate::utils::toml_config::DEFAULT_CONFIG_FILE),
                false,
            ),
        }
    }
}
