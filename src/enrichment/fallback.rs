//! Last-resort enrichers for entries no API could match.
//!
//! Two heuristics live here: a static table of known institutional reports,
//! and URL-based title guessing plus minimal metadata synthesis.

use url::Url;

use super::domain::{EnrichedMetadata, EnrichmentSource};
use super::similarity::{clean_url, normalize_whitespace};
use crate::model::BibliographicEntry;

/// A known report that no scholarly index carries.
struct KnownReport {
    /// Every one of these must appear in the lowercased title
    title_keywords: &'static [&'static str],
    /// Every one of these must appear in the institution field, when present
    institution_keywords: &'static [&'static str],
    default_year: &'static str,
    url: &'static str,
    pdf_url: &'static str,
    authors: &'static [&'static str],
    venue: &'static str,
}

const KNOWN_REPORTS: &[KnownReport] = &[KnownReport {
    title_keywords: &["red-teaming", "public interest"],
    institution_keywords: &["data", "society"],
    default_year: "2025",
    url: "https://datasociety.net/library/red-teaming-in-the-public-interest/",
    pdf_url: "https://datasociety.net/wp-content/uploads/2025/02/Red-Teaming-in_the_Public_Interest_FINAL1.pdf",
    authors: &[
        "Ranjit Singh",
        "Borhane Blili-Hamelin",
        "Carol Anderson",
        "Emnet Tafesse",
        "Briana Vecchione",
        "Beth Duckles",
        "Jacob Metcalf",
    ],
    venue: "Data & Society",
}];

/// Path segments that never carry a title.
const NON_TITLE_SEGMENTS: &[&str] = &[
    "article", "articles", "abstract", "abs", "pdf", "download", "downloads", "full", "fulltext",
    "view", "html", "index", "content", "doi", "paper", "papers", "publication", "publications",
    "document", "documents", "files", "file", "uploads", "wp-content", "library", "en", "epdf",
];

const FILE_EXTENSIONS: &[&str] = &[".pdf", ".html", ".htm", ".php", ".aspx", ".asp", ".jsp"];

/// Query parameters that commonly hold a title.
const TITLE_PARAMS: &[&str] = &["title", "q", "query"];

/// Hosts that serve freely accessible copies.
const OPEN_ACCESS_DOMAINS: &[&str] = &[
    "arxiv.org",
    "biorxiv.org",
    "medrxiv.org",
    "osf.io",
    "zenodo.org",
    "psyarxiv.com",
    "ssrn.com",
    "hal.science",
    "europepmc.org",
    "plos.org",
    "peerj.com",
    "elifesciences.org",
    "openreview.net",
    "aclanthology.org",
    "jmlr.org",
    "proceedings.mlr.press",
];

/// Match an institutional report against the static table.
///
/// Only report-like entry types are considered.
pub fn lookup_institutional_report(entry: &BibliographicEntry) -> Option<EnrichedMetadata> {
    if !entry.is_report() {
        return None;
    }
    let title = entry.title_text()?.to_lowercase();
    let institution = entry
        .field("institution")
        .or_else(|| entry.field("publisher"))
        .map(str::to_lowercase);

    let report = KNOWN_REPORTS.iter().find(|r| {
        r.title_keywords.iter().all(|k| title.contains(k))
            && institution
                .as_deref()
                .is_none_or(|inst| r.institution_keywords.iter().all(|k| inst.contains(k)))
    })?;

    let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::Institutional);
    metadata.abstract_text = entry
        .abstract_text
        .clone()
        .or_else(|| entry.field("abstract").map(String::from));
    metadata.publication_date = Some(
        entry
            .year
            .clone()
            .unwrap_or_else(|| report.default_year.to_string()),
    );
    metadata.url = Some(report.url.to_string());
    metadata.pdf_url = Some(report.pdf_url.to_string());
    metadata.is_open_access = Some(true);
    metadata.authors = report.authors.iter().map(|a| a.to_string()).collect();
    metadata.venue = Some(report.venue.to_string());
    Some(metadata)
}

/// Guess a paper title from a URL's query string or path.
///
/// Returns an empty string when nothing plausible is found. A guess needs
/// at least two words and some letters.
pub fn extract_title_from_url(raw_url: &str) -> String {
    let cleaned = clean_url(raw_url);
    let Ok(url) = Url::parse(&cleaned) else {
        return String::new();
    };

    for (key, value) in url.query_pairs() {
        if TITLE_PARAMS.iter().any(|p| *p == key)
            && let Some(title) = plausible_title(&value)
        {
            return title;
        }
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    for segment in segments.into_iter().rev() {
        let decoded = urlencoding::decode(segment)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        let stem = strip_extension(&decoded);

        if NON_TITLE_SEGMENTS.contains(&stem.to_lowercase().as_str()) {
            continue;
        }
        if let Some(title) = plausible_title(stem) {
            return title;
        }
    }

    String::new()
}

/// Minimal metadata built from the URL alone.
///
/// `None` for anything that isn't an absolute http(s) URL.
pub fn synthesize_from_url(raw_url: &str) -> Option<EnrichedMetadata> {
    let cleaned = clean_url(raw_url);
    let url = Url::parse(&cleaned).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_lowercase();

    let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::Url);
    metadata.url = Some(cleaned.clone());

    if is_open_access_host(&host) {
        metadata.is_open_access = Some(true);
    }
    if host_matches(&host, "arxiv.org") {
        metadata.arxiv_url = Some(cleaned.clone());
    }
    if url.path().to_lowercase().ends_with(".pdf") {
        metadata.pdf_url = Some(cleaned);
    }

    Some(metadata)
}

/// Whether `host` belongs to a known open repository.
pub fn is_open_access_host(host: &str) -> bool {
    OPEN_ACCESS_DOMAINS.iter().any(|d| host_matches(host, d))
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

fn strip_extension(segment: &str) -> &str {
    for ext in FILE_EXTENSIONS {
        let Some(split) = segment.len().checked_sub(ext.len()) else {
            continue;
        };
        if segment
            .get(split..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(ext))
        {
            return &segment[..split];
        }
    }
    segment
}

/// Turn a slug into a title-cased phrase, or `None` if it doesn't look like one.
fn plausible_title(slug: &str) -> Option<String> {
    let spaced: String = slug
        .chars()
        .map(|c| if matches!(c, '-' | '_' | '+') { ' ' } else { c })
        .collect();
    let spaced = normalize_whitespace(&spaced);

    let words: Vec<&str> = spaced.split(' ').filter(|w| !w.is_empty()).collect();
    if words.len() < 2 || !spaced.chars().any(char::is_alphabetic) {
        return None;
    }

    Some(words.into_iter().map(title_case).collect::<Vec<_>>().join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
