//! Command-line interface definitions.
//!
//! A single command: scan one or more roots, write a report, and optionally
//! emit removal and hard-link scripts.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under two trees
//! dedupe ~/Photos /mnt/backup/Photos
//!
//! # Ignore small files, write the report and a removal script
//! dedupe ~/Downloads --min-size 1MB -o report.txt --remove-script remove.sh
//!
//! # JSON report, no metadata store
//! dedupe ~/src --format json --no-db
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::output::ScriptType;

/// Progressive duplicate file finder.
///
/// Files are narrowed down by size, then by their first bytes, then by a
/// full XXH64 content hash. Nothing is ever deleted: remediation is emitted
/// as scripts for you to review and run.
#[derive(Debug, Parser)]
#[command(name = "dedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Ignore files smaller than this (e.g., 1KB, 4MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Bytes compared by the prefix stage
    #[arg(long, value_name = "N")]
    pub prefix_bytes: Option<usize>,

    /// Worker threads for prefix reads and hashing
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Skip hidden files and directories
    #[arg(long)]
    pub skip_hidden: bool,

    /// Emit a script that removes every duplicate
    #[arg(long, value_name = "FILE")]
    pub remove_script: Option<PathBuf>,

    /// Emit a script that replaces every duplicate with a hard link
    #[arg(long, value_name = "FILE")]
    pub hardlink_script: Option<PathBuf>,

    /// Script dialect (defaults to the current platform's)
    #[arg(long, value_enum, value_name = "TYPE")]
    pub script_type: Option<ScriptType>,

    /// Metadata store location
    #[arg(long, value_name = "FILE", conflicts_with = "no_db")]
    pub db: Option<PathBuf>,

    /// Do not read or write the metadata store
    #[arg(long)]
    pub no_db: bool,

    /// Clear the metadata store before scanning
    #[arg(long, conflicts_with = "no_db")]
    pub clear_db: bool,

    /// Configuration file
    #[arg(long, value_name = "FILE", env = "DEDUPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

const SIZE_SUFFIXES: &[(&str, u64)] = &[
    ("", 1),
    ("B", 1),
    ("K", 1_000),
    ("KB", 1_000),
    ("KIB", 1 << 10),
    ("M", 1_000_000),
    ("MB", 1_000_000),
    ("MIB", 1 << 20),
    ("G", 1_000_000_000),
    ("GB", 1_000_000_000),
    ("GIB", 1 << 30),
    ("T", 1_000_000_000_000),
    ("TB", 1_000_000_000_000),
    ("TIB", 1 << 40),
];

/// Parse a human-readable size such as `512`, `1.5MB` or `4 KiB`.
///
/// Decimal suffixes (KB, MB, ...) are powers of 1000, binary suffixes
/// (KiB, MiB, ...) powers of 1024. Suffixes are case-insensitive.
///
/// # Errors
///
/// Returns a message suitable for clap when the number or suffix is invalid.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    let suffix = suffix.trim().to_ascii_uppercase();

    if number.is_empty() {
        return Err(format!("Invalid size: '{s}'"));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid number: '{number}'"))?;

    let multiplier = SIZE_SUFFIXES
        .iter()
        .find(|(name, _)| *name == suffix)
        .map(|(_, m)| *m)
        .ok_or_else(|| format!("Unknown size suffix: '{suffix}'"))?;

    Ok((value * multiplier as f64) as u64)
}
