//! Readable-text extraction for harvested pages
//!
//! The harvester depends only on `ContentExtractor`. `MainContentExtractor`
//! is the default: it picks the page's main element, converts it to Markdown
//! and tidies the result.

use htmd::HtmlToMarkdown;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Pages larger than this are not converted
const MAX_HTML_SIZE: usize = 10 * 1024 * 1024;

/// Candidate main-content containers, most specific first
const MAIN_SELECTORS: &[&str] = &["main", "article", "div.content", "div#content"];

/// Subtrees dropped from the converted text
const SKIPPED_TAGS: &[&str] = &[
    "nav", "header", "footer", "script", "style", "aside", "iframe", "img", "noscript",
];

static MAIN_CANDIDATES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    MAIN_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("BUG: hardcoded main-content selector is invalid"))
        .collect()
});

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("BUG: hardcoded selector 'h1' is invalid"));

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]\(([^)\s]+)").expect("BUG: hardcoded link pattern is invalid")
});

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x9F]")
        .expect("BUG: hardcoded control-character pattern is invalid")
});

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("BUG: hardcoded space pattern is invalid"));

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("BUG: hardcoded newline pattern is invalid"));

/// Failure to convert a page
///
/// The page still counts as visited; it just produces no content file.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTML to Markdown conversion failed: {0}")]
    Convert(#[from] std::io::Error),

    #[error("Page is too large to convert ({size} bytes)")]
    TooLarge { size: usize },
}

/// Capability that turns fetched markup into readable text
pub trait ContentExtractor {
    /// Returns the text to persist, or `None` when the page has no content
    ///
    /// `url` is the page's final address; relative links are resolved
    /// against it.
    fn extract(&self, html: &str, url: &Url) -> Result<Option<String>, ExtractionError>;
}

/// Main-element Markdown extractor
pub struct MainContentExtractor {
    converter: HtmlToMarkdown,
}

impl MainContentExtractor {
    pub fn new() -> Self {
        Self {
            converter: HtmlToMarkdown::builder()
                .skip_tags(SKIPPED_TAGS.to_vec())
                .build(),
        }
    }
}

impl Default for MainContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor for MainContentExtractor {
    fn extract(&self, html: &str, url: &Url) -> Result<Option<String>, ExtractionError> {
        if html.len() > MAX_HTML_SIZE {
            return Err(ExtractionError::TooLarge { size: html.len() });
        }

        let document = Html::parse_document(html);

        let Some(main) = MAIN_CANDIDATES
            .iter()
            .find_map(|selector| document.select(selector).next())
        else {
            return Ok(None);
        };

        let markdown = self.converter.convert(&main.html())?;
        let markdown = absolutize_links(&markdown, url);
        let body = clean_text(&markdown);
        if body.is_empty() {
            return Ok(None);
        }

        let mut parts = Vec::with_capacity(3);
        if let Some(title) = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|h1| h1.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
        {
            parts.push(format!("# {}", title));
        }
        parts.push(format!("**Source:** {}", url));
        parts.push(body);

        Ok(Some(clean_text(&parts.join("\n\n"))))
    }
}

/// Rewrites relative Markdown link targets against `base`
fn absolutize_links(markdown: &str, base: &Url) -> String {
    MARKDOWN_LINK
        .replace_all(markdown, |caps: &Captures| {
            let target = &caps[1];
            match base.join(target) {
                Ok(absolute) if !target.starts_with('#') => format!("]({}", absolute),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Strips control characters and collapses runs of spaces and blank lines
fn clean_text(text: &str) -> String {
    let text = CONTROL_CHARS.replace_all(text, "");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/fr/produits/").unwrap()
    }

    fn extract(html: &str) -> Option<String> {
        MainContentExtractor::new().extract(html, &page_url()).unwrap()
    }

    #[test]
    fn test_extracts_main_with_title_and_source() {
        let html = r#"
            <html><body>
                <nav><a href="/menu">Menu</a></nav>
                <h1>Nos produits</h1>
                <main><p>Bienvenue sur la page.</p></main>
                <footer>Copyright</footer>
            </body></html>
        "#;
        let text = extract(html).unwrap();
        assert!(text.starts_with("# Nos produits\n\n**Source:** https://example.com/fr/produits/"));
        assert!(text.contains("Bienvenue sur la page."));
        assert!(!text.contains("Menu"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_fallback_containers() {
        let html = r#"<html><body><div id="content"><p>Inner text</p></div></body></html>"#;
        assert!(extract(html).unwrap().contains("Inner text"));

        let html = r#"<html><body><article><p>Story</p></article></body></html>"#;
        assert!(extract(html).unwrap().contains("Story"));
    }

    #[test]
    fn test_no_main_content() {
        let html = r#"<html><body><p>Loose text</p></body></html>"#;
        assert_eq!(extract(html), None);
    }

    #[test]
    fn test_empty_main_content() {
        let html = r#"<html><body><main><script>var x = 1;</script></main></body></html>"#;
        assert_eq!(extract(html), None);
    }

    #[test]
    fn test_skipped_tags_inside_main() {
        let html = r#"
            <html><body><main>
                <aside>Related</aside>
                <p>Body</p>
                <img src="/logo.png" alt="logo">
            </main></body></html>
        "#;
        let text = extract(html).unwrap();
        assert!(text.contains("Body"));
        assert!(!text.contains("Related"));
        assert!(!text.contains("logo.png"));
    }

    #[test]
    fn test_links_made_absolute() {
        let html = r#"<html><body><main><p><a href="../contact">Contact</a> <a href="https://other.com/x">X</a></p></main></body></html>"#;
        let text = extract(html).unwrap();
        assert!(text.contains("](https://example.com/fr/contact)"));
        assert!(text.contains("](https://other.com/x)"));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("a \t  b\u{0007}"), "a b");
        assert_eq!(clean_text("one\n\n\n  \ntwo"), "one\n\ntwo");
        assert_eq!(clean_text("  \n  "), "");
    }

    #[test]
    fn test_too_large() {
        let html = "a".repeat(MAX_HTML_SIZE + 1);
        let result = MainContentExtractor::new().extract(&html, &page_url());
        assert!(matches!(result, Err(ExtractionError::TooLarge { .. })));
    }
}
