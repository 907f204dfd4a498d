//! Command-line surface

mod handler;

pub use handler::handle_upload_command;

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::Config;

/// Parse an XML catalog feed and push it to a Google Spreadsheet
#[derive(Parser, Debug, Clone)]
#[command(name = "catalog-sheets", version)]
pub struct Cli {
    /// Spreadsheet ID
    pub id: String,

    /// The XML file path (defaults to the bundled sample feed)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Slash-separated path to the repeated record element
    #[arg(long, value_name = "PATH")]
    pub record_path: Option<String>,

    /// Sheet name prefix; sheets are numbered from 1
    #[arg(long)]
    pub prefix: Option<String>,

    /// Rows per sheet, header row included
    #[arg(long, value_name = "N")]
    pub rows_limit: Option<usize>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Upload into an in-memory spreadsheet and print the resulting layout
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.feed.input = input.clone();
        }
        if let Some(record_path) = &self.record_path {
            config.feed.record_path = record_path.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.sheets.sheet_prefix = prefix.clone();
        }
        if let Some(rows_limit) = self.rows_limit {
            config.sheets.rows_limit = rows_limit;
        }
    }

    /// Default `env_logger` filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
