// filters.rs - Record transforms between pipeline stages
// Purpose: Deduplication, extension/domain filtering and URL classification over line records

use std::collections::HashSet;

/// Static assets and binaries that never carry reflectable parameters
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".jpg", ".png", ".gif", ".jpeg", ".svg", ".woff", ".woff2", ".ico", ".pdf",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".mp3", ".mp4", ".avi", ".mov", ".zip",
    ".tar", ".gz", ".rar", ".7z", ".exe", ".dll", ".deb",
];

/// Server-side pages worth handing to parameter discovery
pub const DYNAMIC_EXTENSIONS: &[&str] = &[".php", ".asp", ".aspx", ".jsp"];

/// Parameter-name fragments that mark a URL as an XSS target
pub const XSS_PARAM_KEYWORDS: &[&str] = &["id", "q", "search", "query", "name", "user", "email"];

/// Strips an optional `http://`/`https://` scheme and an optional `www.` prefix
pub fn normalize_domain(line: &str) -> &str {
    let line = line.trim();
    let without_scheme = line
        .strip_prefix("https://")
        .or_else(|| line.strip_prefix("http://"))
        .unwrap_or(line);
    without_scheme.strip_prefix("www.").unwrap_or(without_scheme)
}

/// Concatenates the lists in order, normalizes every line and keeps first occurrences
pub fn merge_unique_domains(lists: &[Vec<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for line in lists.iter().flatten() {
        let normalized = normalize_domain(line);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.to_string()) {
            unique.push(normalized.to_string());
        }
    }

    unique
}

/// Exact, case-sensitive dedup that preserves first-seen order and skips blank lines
pub fn dedup_exact<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if seen.insert(line.to_string()) {
            unique.push(line.to_string());
        }
    }

    unique
}

pub fn has_excluded_extension(line: &str) -> bool {
    let lower = line.to_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

pub fn filter_extensions(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| !has_excluded_extension(line))
        .cloned()
        .collect()
}

pub fn filter_domain(lines: &[String], domain: &str) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.contains(domain))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    /// Already carries a query string
    Query,
    /// Dynamic page without parameters; parameter discovery candidate
    Candidate,
    Other,
}

/// Priority order: query string first, then dynamic extension
pub fn classify(line: &str) -> UrlClass {
    if line.contains('?') {
        return UrlClass::Query;
    }
    let lower = line.to_lowercase();
    if DYNAMIC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        UrlClass::Candidate
    } else {
        UrlClass::Other
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UrlPartition {
    pub query: Vec<String>,
    pub candidates: Vec<String>,
    pub other: Vec<String>,
}

pub fn partition_urls(lines: &[String]) -> UrlPartition {
    let mut partition = UrlPartition::default();
    for line in lines.iter().filter(|l| !l.is_empty()) {
        match classify(line) {
            UrlClass::Query => partition.query.push(line.clone()),
            UrlClass::Candidate => partition.candidates.push(line.clone()),
            UrlClass::Other => partition.other.push(line.clone()),
        }
    }
    partition
}

pub fn has_xss_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    XSS_PARAM_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetSplit {
    /// Every input line, unfiltered
    pub all: Vec<String>,
    /// Lines carrying `=`
    pub with_params: Vec<String>,
    /// Subset of `with_params` naming an interesting parameter
    pub targets: Vec<String>,
}

pub fn split_targets(lines: &[String]) -> TargetSplit {
    let with_params: Vec<String> = lines.iter().filter(|l| l.contains('=')).cloned().collect();
    let targets = with_params
        .iter()
        .filter(|l| has_xss_keyword(l))
        .cloned()
        .collect();

    TargetSplit {
        all: lines.to_vec(),
        with_params,
        targets,
    }
}
