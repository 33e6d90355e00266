//! Plain-text session report and summary
//!
//! Both files are rendered from a `SessionSnapshot` once the run is over;
//! neither reads state back from the crawler.

use crate::config::Config;
use crate::output::layout::OutputLayout;
use crate::output::stats::SessionSnapshot;
use crate::output::{OutputError, OutputResult};
use crate::download::Category;
use std::fs;
use std::path::{Path, PathBuf};

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Stopped early by a shutdown request
    Interrupted,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Run metadata shown alongside the counters
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub config: &'a Config,
    pub config_hash: Option<&'a str>,
    pub status: RunStatus,
}

/// Writes `crawler_report.txt`
///
/// # Arguments
///
/// * `layout` - Output paths of the run
/// * `context` - Configuration, config hash and final status
/// * `snapshot` - Final session counters
/// * `urls` - Every URL discovered in phase 1
pub fn generate_report(
    layout: &OutputLayout,
    context: &ReportContext<'_>,
    snapshot: &SessionSnapshot,
    urls: &[&str],
) -> OutputResult<PathBuf> {
    let files: Vec<(&str, Vec<String>)> = layout
        .generated_dirs()
        .into_iter()
        .filter_map(|(label, dir)| list_files(&dir).map(|files| (label, files)))
        .collect();

    let report = format_report(context, snapshot, urls, &files);
    let path = layout.report_file();
    write_file(&path, &report)?;

    tracing::info!("Report generated: {}", path.display());
    Ok(path)
}

/// Formats the full report
pub fn format_report(
    context: &ReportContext<'_>,
    snapshot: &SessionSnapshot,
    urls: &[&str],
    files: &[(&str, Vec<String>)],
) -> String {
    let config = context.config;
    let counts = &snapshot.counts;
    let mut report = String::new();

    report.push_str("Crawler Report\n");
    report.push_str("==============\n\n");
    report.push_str(&format!(
        "Generated: {}\n\n",
        snapshot.ended_at.format("%Y-%m-%d %H:%M:%S")
    ));

    report.push_str("Configuration\n");
    report.push_str("-------------\n");
    report.push_str(&format!("Start URL: {}\n", snapshot.start_url));
    report.push_str(&format!(
        "Language Pattern: {}\n",
        config.language_pattern.as_deref().unwrap_or("none")
    ));
    report.push_str(&format!("Max Depth: {}\n", snapshot.max_depth));
    report.push_str(&format!(
        "Fetch Backend: {}\n",
        if config.use_playwright { "headless browser" } else { "http" }
    ));
    if let Some(hash) = context.config_hash {
        report.push_str(&format!("Config Hash: {}\n", hash));
    }
    report.push_str(&format!(
        "Started: {}\n",
        snapshot.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!(
        "Duration: {:.2} seconds\n",
        snapshot.elapsed.as_secs_f64()
    ));
    report.push_str(&format!("Status: {}\n\n", context.status.label()));

    report.push_str("Statistics\n");
    report.push_str("----------\n");
    report.push_str(&format!("Total URLs found: {}\n", urls.len()));
    report.push_str(&format!("URLs visited: {}\n", counts.visited));
    report.push_str(&format!("Pages processed: {}\n", counts.pages_saved));
    report.push_str("Files downloaded:\n");
    report.push_str(&format!("- PDFs: {}\n", counts.downloaded_in(Category::Pdf)));
    report.push_str(&format!("- Images: {}\n", counts.downloaded_in(Category::Image)));
    report.push_str(&format!("- Documents: {}\n", counts.downloaded_in(Category::Doc)));
    report.push_str(&format!(
        "Already downloaded (skipped): {}\n",
        counts.skipped
    ));
    report.push_str(&format!("Bytes downloaded: {}\n", counts.bytes_downloaded));

    if counts.errors_total() > 0 {
        report.push_str("\nErrors\n");
        report.push_str("------\n");
        for (kind, count) in &counts.errors {
            report.push_str(&format!("- {}: {}\n", kind, count));
        }
    }

    report.push_str("\nProcessed URLs\n");
    report.push_str("--------------\n");
    let mut sorted: Vec<&str> = urls.to_vec();
    sorted.sort_unstable();
    for url in sorted {
        report.push_str(url);
        report.push('\n');
    }

    report.push_str("\nGenerated Files\n");
    report.push_str("---------------\n");
    for (label, names) in files {
        report.push_str(&format!("\n{} Files ({}):\n", label, names.len()));
        for name in names {
            report.push_str(&format!("- {}\n", name));
        }
    }

    report
}

/// Writes `summary.txt`
pub fn generate_summary(
    layout: &OutputLayout,
    context: &ReportContext<'_>,
    snapshot: &SessionSnapshot,
    total_urls: usize,
) -> OutputResult<PathBuf> {
    let summary = format_summary(context, snapshot, total_urls);
    let path = layout.summary_file();
    write_file(&path, &summary)?;

    tracing::info!("Summary generated: {}", path.display());
    Ok(path)
}

/// Formats the condensed summary
pub fn format_summary(
    context: &ReportContext<'_>,
    snapshot: &SessionSnapshot,
    total_urls: usize,
) -> String {
    let counts = &snapshot.counts;
    let status = match (context.status, counts.errors_total()) {
        (RunStatus::Interrupted, _) => "Interrupted".to_string(),
        (RunStatus::Completed, 0) => "Completed successfully".to_string(),
        (RunStatus::Completed, errors) => format!("Completed with {} errors", errors),
    };

    let mut summary = String::new();
    summary.push_str("Crawling Summary\n");
    summary.push_str("----------------\n");
    summary.push_str(&format!("Start URL: {}\n", snapshot.start_url));
    summary.push_str(&format!("Total URLs: {}\n", total_urls));
    summary.push_str(&format!("Pages Processed: {}\n", counts.pages_saved));
    summary.push_str(&format!(
        "Total Files Downloaded: {}\n",
        counts.downloaded_total()
    ));
    summary.push_str(&format!("Skipped: {}\n", counts.skipped));
    summary.push_str(&format!("Errors: {}\n", counts.errors_total()));
    summary.push_str(&format!(
        "Duration: {:.2} seconds\n",
        snapshot.elapsed.as_secs_f64()
    ));
    summary.push_str(&format!("Status: {}\n", status));
    summary
}

/// Sorted file names of a directory, ignoring in-flight temp files
fn list_files(dir: &Path) -> Option<Vec<String>> {
    let entries = fs::read_dir(dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with(".tmp"))
        .collect();
    names.sort();
    Some(names)
}

fn write_file(path: &Path, content: &str) -> OutputResult<()> {
    fs::write(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
