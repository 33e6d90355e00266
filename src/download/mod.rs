//! Download module for classified binary assets
//!
//! This module handles:
//! - Mapping URLs to download categories by file extension
//! - Naming saved files deterministically and without collisions
//! - Persisting the set of harvested identifiers across runs

mod classifier;
mod naming;
mod tracker;

pub use classifier::DownloadClassifier;
pub use naming::{asset_file_name, content_file_name, short_hash, split_file_name, HASH_WIDTHS};
pub use tracker::{DownloadRecord, DownloadTracker, TRACKER_FILE_NAME};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a downloadable resource
///
/// The display name doubles as the output directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "Image")]
    Image,
    #[serde(rename = "Doc")]
    Doc,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Pdf, Category::Image, Category::Doc];

    /// Returns the directory name (and stored label) for this category
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "Image",
            Self::Doc => "Doc",
        }
    }

    /// Parses a stored label back into a category
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dir_name() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Errors that can occur while writing or recording a download
///
/// Whenever one of these is returned the identifier has not been recorded,
/// so a later run retries the asset.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Every candidate file name for {identifier} is claimed by another resource")]
    NameExhausted { identifier: String },

    #[error("Tracker store error: {0}")]
    Tracker(#[from] std::io::Error),
}

/// Result type for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;
