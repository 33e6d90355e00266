use crate::config::{Config, LanguageMode};
use crate::url::NormalizedUrl;
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::fmt;

/// Why a discovered URL was kept out of the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeReject {
    /// Host or port differs from the start URL
    ForeignHost,
    /// Path contains an excluded substring
    ExcludedPath,
    /// Path fails the locale gate
    Locale,
}

impl fmt::Display for ScopeReject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::ForeignHost => "foreign host",
            Self::ExcludedPath => "excluded path",
            Self::Locale => "locale mismatch",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone)]
struct LocaleRule {
    pattern: Regex,
    mode: LanguageMode,
}

/// Decides whether a normalized URL may enter the frontier
///
/// Built once per session from the configuration and never mutated. The
/// start URL itself is always admitted.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    start: NormalizedUrl,
    host: String,
    port: Option<u16>,
    excluded_paths: Vec<String>,
    locale: Option<LocaleRule>,
}

impl ScopeFilter {
    pub fn new(
        start: &NormalizedUrl,
        excluded_paths: &[String],
        language_pattern: Option<&str>,
        language_mode: LanguageMode,
    ) -> ConfigResult<Self> {
        let locale = match language_pattern {
            Some(pattern) => Some(LocaleRule {
                pattern: Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidPattern(format!("language_pattern '{}': {}", pattern, e))
                })?,
                mode: language_mode,
            }),
            None => None,
        };

        Ok(Self {
            start: start.clone(),
            host: start.as_url().host_str().unwrap_or_default().to_string(),
            port: start.as_url().port(),
            excluded_paths: excluded_paths.to_vec(),
            locale,
        })
    }

    /// Builds the filter for a session
    pub fn from_config(config: &Config, start: &NormalizedUrl) -> ConfigResult<Self> {
        Self::new(
            start,
            &config.excluded_paths,
            config.language_pattern.as_deref(),
            config.language_mode,
        )
    }

    /// Returns true if the URL may be traversed
    pub fn in_scope(&self, url: &NormalizedUrl) -> bool {
        self.check(url).is_ok()
    }

    /// Runs every rule in order and reports the first one that fails
    pub fn check(&self, url: &NormalizedUrl) -> Result<(), ScopeReject> {
        if *url == self.start {
            return Ok(());
        }

        let parsed = url.as_url();
        if parsed.host_str() != Some(self.host.as_str()) || parsed.port() != self.port {
            return Err(ScopeReject::ForeignHost);
        }

        let path = parsed.path();
        if self
            .excluded_paths
            .iter()
            .any(|excluded| path.contains(excluded.as_str()))
        {
            return Err(ScopeReject::ExcludedPath);
        }

        if let Some(rule) = &self.locale {
            let matched = rule.pattern.is_match(path);
            let admitted = match rule.mode {
                LanguageMode::Require => matched,
                LanguageMode::Reject => !matched,
            };
            if !admitted {
                return Err(ScopeReject::Locale);
            }
        }

        Ok(())
    }

    /// The session's start URL
    pub fn start(&self) -> &NormalizedUrl {
        &self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::{normalize_start_url, normalize_url, NormalizeOptions};

    fn start() -> NormalizedUrl {
        normalize_start_url("https://example.com/", &NormalizeOptions::default()).unwrap()
    }

    fn url(raw: &str) -> NormalizedUrl {
        normalize_url(raw, start().as_url(), &NormalizeOptions::default()).unwrap()
    }

    fn filter(excluded: &[&str], pattern: Option<&str>, mode: LanguageMode) -> ScopeFilter {
        let excluded: Vec<String> = excluded.iter().map(|s| s.to_string()).collect();
        ScopeFilter::new(&start(), &excluded, pattern, mode).unwrap()
    }

    #[test]
    fn test_same_host_admitted() {
        let f = filter(&[], None, LanguageMode::Require);
        assert!(f.in_scope(&url("/a")));
        assert!(f.in_scope(&url("http://example.com/b")));
    }

    #[test]
    fn test_foreign_host_rejected() {
        let f = filter(&[], None, LanguageMode::Require);
        assert_eq!(f.check(&url("https://other.com/c")), Err(ScopeReject::ForeignHost));
        assert_eq!(
            f.check(&url("https://sub.example.com/")),
            Err(ScopeReject::ForeignHost)
        );
        assert_eq!(
            f.check(&url("https://example.com:8443/")),
            Err(ScopeReject::ForeignHost)
        );
    }

    #[test]
    fn test_excluded_substring() {
        let f = filter(&["excluded", "selecteur-de-produits"], None, LanguageMode::Require);
        assert_eq!(f.check(&url("/excluded/b")), Err(ScopeReject::ExcludedPath));
        assert_eq!(
            f.check(&url("/fr/selecteur-de-produits?x=1")),
            Err(ScopeReject::ExcludedPath)
        );
        assert!(f.in_scope(&url("/included")));
    }

    #[test]
    fn test_locale_require() {
        let f = filter(&[], Some("^/fr(/|$)"), LanguageMode::Require);
        assert!(f.in_scope(&url("/fr/produits")));
        assert_eq!(f.check(&url("/en/products")), Err(ScopeReject::Locale));
    }

    #[test]
    fn test_locale_reject() {
        let f = filter(&[], Some("^/(en|de|es)/"), LanguageMode::Reject);
        assert!(f.in_scope(&url("/fr/produits")));
        assert!(f.in_scope(&url("/contact")));
        assert_eq!(f.check(&url("/de/produkte")), Err(ScopeReject::Locale));
    }

    #[test]
    fn test_start_always_admitted() {
        let f = filter(&["/"], Some("^/never$"), LanguageMode::Require);
        assert!(f.in_scope(&start()));
        assert!(!f.in_scope(&url("/a")));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ScopeFilter::new(&start(), &[], Some("(unclosed"), LanguageMode::Require);
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
    }
}
