//! URL handling module for Site-Harvester
//!
//! This module provides URL normalization (the dedup identity used by the
//! frontier and the download tracker) and the scope filter that decides which
//! discovered links may be traversed.

mod normalize;
mod scope;

pub use normalize::{normalize_start_url, normalize_url};
pub use scope::{ScopeFilter, ScopeReject};

use crate::config::Config;
use std::fmt;
use url::Url;

/// A canonical absolute URL
///
/// Only `normalize_url` produces these, so two values compare equal exactly
/// when the raw links they came from are the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Session-wide normalization policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop the query string entirely instead of filtering it
    pub strip_query: bool,
}

impl NormalizeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            strip_query: config.strip_query,
        }
    }
}
