//! Persisted record of harvested downloads
//!
//! The store is a plain text file with one record per line:
//!
//! ```text
//! <identifier>\t<category>\t<local path>\t<RFC 3339 timestamp>
//! ```
//!
//! Bare identifier lines (no tabs) are accepted on load so stores written by
//! older harvesters keep deduplicating.

use crate::download::Category;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the store inside the logs directory
pub const TRACKER_FILE_NAME: &str = "downloaded_files.txt";

/// One successfully harvested resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    /// Canonical URL of the resource
    pub identifier: String,
    pub category: Category,
    pub local_path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

impl DownloadRecord {
    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.identifier,
            self.category.dir_name(),
            self.local_path.display(),
            self.timestamp.to_rfc3339()
        )
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        match fields {
            [identifier, category, local_path, timestamp] => Some(Self {
                identifier: identifier.to_string(),
                category: Category::from_label(category)?,
                local_path: PathBuf::from(local_path),
                timestamp: DateTime::parse_from_rfc3339(timestamp)
                    .ok()?
                    .with_timezone(&Utc),
            }),
            _ => None,
        }
    }
}

/// In-memory view of the store with an append handle on the file
///
/// Every identifier maps to at most one entry. Entries loaded from bare
/// lines carry no record.
pub struct DownloadTracker {
    path: PathBuf,
    entries: HashMap<String, Option<DownloadRecord>>,
    claimed_paths: HashMap<PathBuf, String>,
    file: File,
}

impl DownloadTracker {
    /// Loads the store at `path`, creating it if missing
    pub fn load(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut entries = HashMap::new();
        let mut claimed_paths = HashMap::new();

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let fields: Vec<&str> = line.split('\t').collect();
                match DownloadRecord::from_fields(&fields) {
                    Some(record) => {
                        claimed_paths.insert(record.local_path.clone(), record.identifier.clone());
                        entries.insert(record.identifier.clone(), Some(record));
                    }
                    None => {
                        // Keep a structured record if the same identifier had one
                        entries.entry(fields[0].to_string()).or_insert(None);
                    }
                }
            }
            tracing::info!(
                "Loaded {} downloaded identifiers from {}",
                entries.len(),
                path.display()
            );
        } else {
            tracing::info!("No download tracking file found, starting fresh");
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            claimed_paths,
            file,
        })
    }

    /// Returns true if the identifier has already been harvested
    pub fn is_downloaded(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Returns the stored record for an identifier, if one is known
    pub fn get(&self, identifier: &str) -> Option<&DownloadRecord> {
        self.entries.get(identifier).and_then(|entry| entry.as_ref())
    }

    /// Returns the identifier that owns a local file, if any
    pub fn claimed_by(&self, local_path: &Path) -> Option<&str> {
        self.claimed_paths.get(local_path).map(String::as_str)
    }

    /// Records a completed download and appends it durably to the store
    ///
    /// Call only after the file is fully written. Recording a known
    /// identifier writes nothing and returns the existing record.
    pub fn record_download(
        &mut self,
        identifier: &str,
        category: Category,
        local_path: &Path,
    ) -> io::Result<DownloadRecord> {
        if let Some(entry) = self.entries.get(identifier) {
            return Ok(entry.clone().unwrap_or_else(|| DownloadRecord {
                identifier: identifier.to_string(),
                category,
                local_path: local_path.to_path_buf(),
                timestamp: Utc::now(),
            }));
        }

        let record = DownloadRecord {
            identifier: identifier.to_string(),
            category,
            local_path: local_path.to_path_buf(),
            timestamp: Utc::now(),
        };

        writeln!(self.file, "{}", record.to_line())?;
        self.file.flush()?;
        self.file.sync_data()?;

        self.claimed_paths
            .insert(record.local_path.clone(), record.identifier.clone());
        self.entries
            .insert(record.identifier.clone(), Some(record.clone()));

        Ok(record)
    }

    /// Rewrites the store sorted, one line per identifier
    ///
    /// The new content is written to a temporary file next to the store and
    /// renamed over it, so a crash leaves either the old or the new store.
    pub fn compact(&mut self) -> io::Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(parent)?;

        let mut identifiers: Vec<&String> = self.entries.keys().collect();
        identifiers.sort();

        for identifier in identifiers {
            match &self.entries[identifier] {
                Some(record) => writeln!(temp, "{}", record.to_line())?,
                None => writeln!(temp, "{}", identifier)?,
            }
        }
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;

        tracing::info!(
            "Saved {} downloaded identifiers to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Number of known identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no identifier is known
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the backing store
    pub fn path(&self) -> &Path {
        &self.path
    }
}
