use crate::download::Category;
use crate::url::NormalizedUrl;
use std::collections::{BTreeMap, HashMap};

/// Content types recognised per category, with the extension used on disk
const CONTENT_TYPES: &[(Category, &str, &str)] = &[
    (Category::Pdf, "application/pdf", ".pdf"),
    (Category::Image, "image/jpeg", ".jpg"),
    (Category::Image, "image/png", ".png"),
    (Category::Image, "image/gif", ".gif"),
    (Category::Image, "image/svg+xml", ".svg"),
    (Category::Doc, "application/msword", ".doc"),
    (
        Category::Doc,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    (Category::Doc, "application/vnd.ms-excel", ".xls"),
    (
        Category::Doc,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    (Category::Doc, "application/vnd.ms-powerpoint", ".ppt"),
    (
        Category::Doc,
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
];

/// Maps URLs to download categories by file extension
///
/// Extensions are matched case-insensitively against the last segment of the
/// URL path. URLs with an unmapped (or no) extension are ordinary pages.
#[derive(Debug, Clone)]
pub struct DownloadClassifier {
    by_extension: HashMap<String, Category>,
}

impl DownloadClassifier {
    /// Creates a classifier from a category → extensions table
    pub fn new(table: &BTreeMap<Category, Vec<String>>) -> Self {
        let mut by_extension = HashMap::new();
        for (category, extensions) in table {
            for ext in extensions {
                let ext = ext.trim_start_matches('.').to_lowercase();
                by_extension.insert(ext, *category);
            }
        }
        Self { by_extension }
    }

    /// Returns the download category of a URL, or None for a normal page
    pub fn classify(&self, url: &NormalizedUrl) -> Option<Category> {
        self.classify_path(url.as_url().path())
    }

    fn classify_path(&self, path: &str) -> Option<Category> {
        let ext = path_extension(path)?;
        self.by_extension.get(&ext).copied()
    }

    /// Picks the extension for the saved file
    ///
    /// A response content-type that belongs to the category wins (so a
    /// `.jpeg` link served as `image/jpeg` is saved as `.jpg`); otherwise the
    /// URL's own extension is kept.
    pub fn extension_for(
        &self,
        url: &NormalizedUrl,
        category: Category,
        content_type: &str,
    ) -> String {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        CONTENT_TYPES
            .iter()
            .find(|(c, m, _)| *c == category && *m == mime)
            .map(|(_, _, ext)| ext.to_string())
            .or_else(|| path_extension(url.as_url().path()).map(|e| format!(".{}", e)))
            .unwrap_or_default()
    }

    /// Returns true if no extension is mapped at all
    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

/// Lower-cased extension of the last path segment, without the dot
fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
