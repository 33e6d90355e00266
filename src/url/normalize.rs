use crate::url::{NormalizeOptions, NormalizedUrl};
use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that only carry tracking data
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Link schemes that never point at a fetchable document
const NON_NAVIGABLE_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a raw link found on a page
///
/// # Normalization Steps
///
/// 1. Reject empty, fragment-only and `javascript:`/`mailto:`/`tel:`/`data:` links
/// 2. Resolve against `base`; reject anything that is not http(s) with a host
/// 3. Lowercase the host
/// 4. Normalize path:
///    - Remove dot segments and duplicate slashes
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment
/// 6. Either drop the query (`strip_query`) or remove tracking parameters
///    and sort the rest
///
/// # Examples
///
/// ```
/// use site_harvester::url::{normalize_url, NormalizeOptions};
/// use url::Url;
///
/// let base = Url::parse("https://Example.com/docs/").unwrap();
/// let url = normalize_url("../about/#team", &base, &NormalizeOptions::default()).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn normalize_url(
    raw: &str,
    base: &Url,
    options: &NormalizeOptions,
) -> UrlResult<NormalizedUrl> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return Err(UrlError::NotNavigable(raw.to_string()));
    }

    let lowered = raw.to_ascii_lowercase();
    if NON_NAVIGABLE_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return Err(UrlError::NotNavigable(raw.to_string()));
    }

    let mut url = base
        .join(raw)
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    if url.host_str() != Some(host.as_str()) {
        url.set_host(Some(&host))
            .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if options.strip_query {
        url.set_query(None);
    } else if let Some(query) = url.query() {
        let query = filter_and_sort_query(query);
        url.set_query(if query.is_empty() { None } else { Some(&query) });
    }

    Ok(NormalizedUrl(url))
}

/// Normalizes an absolute URL such as the configured start URL
pub fn normalize_start_url(
    raw: &str,
    options: &NormalizeOptions,
) -> UrlResult<NormalizedUrl> {
    let base = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    normalize_url(raw, &base, options)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Drops tracking parameters and sorts the remaining `&`-separated pieces
///
/// Pieces are kept verbatim, so queries that are not form-encoded (`?file`,
/// `?x=1;y=2`) reach the server exactly as linked.
fn filter_and_sort_query(query: &str) -> String {
    let mut pieces: Vec<&str> = query
        .split('&')
        .filter(|piece| !piece.is_empty())
        .filter(|piece| !is_tracking_param(query_key(piece)))
        .collect();

    // Stable on key so repeated keys keep their relative order
    pieces.sort_by(|a, b| query_key(a).cmp(query_key(b)));

    pieces.join("&")
}

fn query_key(piece: &str) -> &str {
    piece.split_once('=').map_or(piece, |(key, _)| key)
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/guide").unwrap()
    }

    fn norm(raw: &str) -> UrlResult<NormalizedUrl> {
        normalize_url(raw, &base(), &NormalizeOptions::default())
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(norm("intro").unwrap().as_str(), "https://example.com/docs/intro");
        assert_eq!(norm("/about").unwrap().as_str(), "https://example.com/about");
        assert_eq!(
            norm("//example.com/x").unwrap().as_str(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_scheme_is_kept() {
        let result = norm("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_www_is_kept() {
        let result = norm("https://www.example.com/").unwrap();
        assert_eq!(result.as_str(), "https://www.example.com/");
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(norm("/page/").unwrap(), norm("/page").unwrap());
        assert_eq!(norm("/page/").unwrap().as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        assert_eq!(norm("https://example.com").unwrap().as_str(), "https://example.com/");
        assert_eq!(norm("/").unwrap().as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = norm("/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = norm("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_query_filtered_and_sorted() {
        let result = norm("/page?b=2&utm_medium=email&a=1&fbclid=123").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");

        let result = norm("/page?utm_source=a&gclid=c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_pieces_kept_verbatim() {
        assert_eq!(
            norm("/dl.php?file").unwrap().as_str(),
            "https://example.com/dl.php?file"
        );
        assert_eq!(
            norm("/p?x=1;y=2").unwrap().as_str(),
            "https://example.com/p?x=1;y=2"
        );
        assert_eq!(
            norm("/s?q=a%20b&utm_source=x&lang=fr").unwrap().as_str(),
            "https://example.com/s?lang=fr&q=a%20b"
        );
        assert_eq!(
            norm("/s?tag=b&tag=a&&id=1").unwrap().as_str(),
            "https://example.com/s?id=1&tag=b&tag=a"
        );
    }

    #[test]
    fn test_pagination_stays_distinct() {
        assert_ne!(norm("/list?page=1").unwrap(), norm("/list?page=2").unwrap());
    }

    #[test]
    fn test_strip_query_option() {
        let opts = NormalizeOptions { strip_query: true };
        let a = normalize_url("/list?page=1", &base(), &opts).unwrap();
        let b = normalize_url("/list?page=2", &base(), &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://example.com/list");
    }

    #[test]
    fn test_dot_segments_and_slashes() {
        assert_eq!(norm("/a/../b/./c").unwrap().as_str(), "https://example.com/b/c");
        assert_eq!(
            norm("///path//to///page").unwrap().as_str(),
            "https://example.com/path/to/page"
        );
        assert_eq!(norm("/../page").unwrap().as_str(), "https://example.com/page");
    }

    #[test]
    fn test_non_navigable_links() {
        for raw in [
            "",
            "#top",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:admin@example.com",
            "tel:+331234",
            "data:text/plain,hi",
        ] {
            assert!(
                matches!(norm(raw), Err(UrlError::NotNavigable(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_scheme() {
        assert!(matches!(
            norm("ftp://example.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_start_url() {
        let start = normalize_start_url("https://Example.com/fr/", &NormalizeOptions::default())
            .unwrap();
        assert_eq!(start.as_str(), "https://example.com/fr");
        assert!(normalize_start_url("not a url", &NormalizeOptions::default()).is_err());
    }
}
