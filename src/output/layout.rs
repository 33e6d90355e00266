use crate::download::{Category, TRACKER_FILE_NAME};
use std::io;
use std::path::{Path, PathBuf};

/// Run log file name inside the logs directory
pub const LOG_FILE_NAME: &str = "crawler.log";

/// Full session report file name
pub const REPORT_FILE_NAME: &str = "crawler_report.txt";

/// Condensed summary file name
pub const SUMMARY_FILE_NAME: &str = "summary.txt";

const CONTENT_DIR: &str = "content";
const LOGS_DIR: &str = "logs";

/// Paths of everything a run writes under `base_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    base: PathBuf,
}

impl OutputLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn content_dir(&self) -> PathBuf {
        self.base.join(CONTENT_DIR)
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.base.join(category.dir_name())
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join(LOGS_DIR)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    pub fn tracker_file(&self) -> PathBuf {
        self.logs_dir().join(TRACKER_FILE_NAME)
    }

    pub fn report_file(&self) -> PathBuf {
        self.base.join(REPORT_FILE_NAME)
    }

    pub fn summary_file(&self) -> PathBuf {
        self.base.join(SUMMARY_FILE_NAME)
    }

    /// Directories listed in the report, with their display labels
    pub fn generated_dirs(&self) -> Vec<(&'static str, PathBuf)> {
        let mut dirs = vec![(CONTENT_DIR, self.content_dir())];
        dirs.extend(
            Category::ALL
                .into_iter()
                .map(|c| (c.dir_name(), self.category_dir(c))),
        );
        dirs
    }

    /// Creates every output directory
    pub fn create_dirs(&self) -> io::Result<()> {
        for (_, dir) in self.generated_dirs() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::create_dir_all(self.logs_dir())
    }
}
