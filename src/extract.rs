// extract.rs - URL extraction strategies
// Purpose: Pull URL-shaped substrings out of raw crawler output

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Permissive pattern: scheme, then alphanumerics, a fixed punctuation set, or %XX escapes
const PERMISSIVE_URL_PATTERN: &str =
    r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+";

fn permissive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PERMISSIVE_URL_PATTERN).expect("valid URL pattern"))
}

/// Strategy used by the crawl stage to turn raw tool output into URLs
pub trait UrlExtractor {
    fn name(&self) -> &'static str;
    fn extract(&self, raw: &str) -> Vec<String>;
}

/// Default extractor; accepts anything matching the permissive URL pattern
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveUrlExtractor;

impl UrlExtractor for PermissiveUrlExtractor {
    fn name(&self) -> &'static str {
        "permissive"
    }

    fn extract(&self, raw: &str) -> Vec<String> {
        permissive_regex()
            .find_iter(raw)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Permissive match followed by a real URL parse; drops candidates without a host
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictUrlExtractor;

impl UrlExtractor for StrictUrlExtractor {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn extract(&self, raw: &str) -> Vec<String> {
        PermissiveUrlExtractor
            .extract(raw)
            .into_iter()
            .filter(|candidate| match Url::parse(candidate) {
                Ok(url) => url.host_str().map(|h| !h.is_empty()).unwrap_or(false),
                Err(_) => false,
            })
            .collect()
    }
}

/// Selectable strategies from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractorKind {
    Permissive,
    Strict,
}

impl ExtractorKind {
    pub fn build(self) -> Box<dyn UrlExtractor> {
        match self {
            ExtractorKind::Permissive => Box::new(PermissiveUrlExtractor),
            ExtractorKind::Strict => Box::new(StrictUrlExtractor),
        }
    }
}
