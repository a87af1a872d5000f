//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Zoho CRM export pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "zoho-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true, default_value = "zoho-export.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full crawl → export → split → upload pipeline
    Run {
        /// Override the module allow-list (comma-separated, or ALL)
        #[arg(long)]
        modules: Option<String>,

        /// Override the live-record ceiling per module
        #[arg(long)]
        max_records: Option<u32>,

        /// Override the upload destination (s3://bucket/prefix or local path)
        #[arg(short, long)]
        destination: Option<String>,

        /// Crawl and export locally without uploading
        #[arg(long)]
        skip_upload: bool,
    },

    /// Discover and list the modules the account exposes
    Modules,

    /// Split one file into fixed-line-count chunks
    Split {
        /// Source file
        file: PathBuf,

        /// Maximum lines per chunk
        #[arg(long, default_value = "1000")]
        lines: usize,

        /// Destination directory (default: `<source dir>/split`)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Validate the configuration and destination reachability
    Validate,
}
