//! HTML parser for extracting links and metadata
//!
//! Links are returned raw, in document order. Resolution, normalization and
//! scope checks happen in the frontier against the page's final URL.

use scraper::{Html, Selector};

/// Elements whose reference is followed, with the attribute holding it
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("embed", "src"),
    ("iframe", "src"),
    ("object", "data"),
];

const LINK_SELECTOR: &str =
    "a[href], link[rel='canonical'][href], embed[src], iframe[src], object[data]";

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Raw link targets in document order
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">`, including `download` and `rel="nofollow"` anchors
/// - `<link rel="canonical" href="...">`
/// - `<embed src>`, `<iframe src>`, `<object data>` (embedded documents)
///
/// **Exclude:**
/// - `<link rel="stylesheet" ...>`
/// - `<script src="...">`
/// - `<img src="...">`
///
/// # Example
///
/// ```
/// use site_harvester::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts link targets from every followed element
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(LINK_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let tag = element.value().name();
            let attr = LINK_SOURCES
                .iter()
                .find(|(name, _)| *name == tag)
                .map(|(_, attr)| *attr)?;
            element.value().attr(attr)
        })
        .map(|target| target.trim())
        .filter(|target| !target.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(parse_html(html).title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(parse_html(html).title, None);
    }

    #[test]
    fn test_links_in_document_order() {
        let html = r#"
            <html>
            <head><link rel="canonical" href="https://example.com/canonical" /></head>
            <body>
                <a href="/page1">Link 1</a>
                <iframe src="/embedded"></iframe>
                <a href="https://other.com/page3">Link 3</a>
                <object data="/files/sheet.pdf"></object>
                <embed src="/files/plan.pdf">
            </body>
            </html>
        "#;
        assert_eq!(
            parse_html(html).links,
            vec![
                "https://example.com/canonical",
                "/page1",
                "/embedded",
                "https://other.com/page3",
                "/files/sheet.pdf",
                "/files/plan.pdf",
            ]
        );
    }

    #[test]
    fn test_download_links_are_followed() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        assert_eq!(parse_html(html).links, vec!["/file.pdf"]);
    }

    #[test]
    fn test_nofollow_links_are_followed() {
        let html = r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#;
        assert_eq!(parse_html(html).links, vec!["/page"]);
    }

    #[test]
    fn test_skip_resources() {
        let html = r#"
            <html>
            <head>
                <link rel="stylesheet" href="/style.css">
                <script src="/app.js"></script>
            </head>
            <body><img src="/logo.png"><a href="  ">Blank</a></body>
            </html>
        "#;
        assert!(parse_html(html).links.is_empty());
    }

    #[test]
    fn test_malformed_html() {
        let html = r#"<html><body><a href="/ok">unclosed <div><a href="/also"#;
        let parsed = parse_html(html);
        assert!(parsed.links.contains(&"/ok".to_string()));
    }
}
