//! Output module for run artifacts
//!
//! This module handles:
//! - The on-disk layout of a run under `base_dir`
//! - Session counters and their final snapshot
//! - The plain-text report and summary files

mod layout;
mod report;
pub mod stats;

pub use layout::{OutputLayout, LOG_FILE_NAME, REPORT_FILE_NAME, SUMMARY_FILE_NAME};
pub use report::{
    format_report, format_summary, generate_report, generate_summary, ReportContext, RunStatus,
};
pub use stats::{print_statistics, ErrorKind, SessionCounts, SessionSnapshot, SessionStats};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing run artifacts
///
/// These are logged at the end of a run and never change its exit status.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
