//! Fuzzy text matching shared by every source client.
//!
//! Title and author similarity are Jaccard indexes over whitespace tokens
//! with a fixed stop-word set removed, plus a flat bonus when one string
//! contains the other. Candidate scoring weights title similarity 70% and
//! author similarity 30%.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Words ignored when comparing token sets.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Weight of title similarity in a candidate's confidence.
pub const TITLE_WEIGHT: f64 = 0.7;
/// Weight of author similarity in a candidate's confidence.
pub const AUTHOR_WEIGHT: f64 = 0.3;
/// Bonus added when one (lowercased) string contains the other.
const SUBSTRING_BONUS: f64 = 0.2;

/// Minimum length of a cleaned title before a search is attempted.
pub const MIN_SEARCH_TITLE_LEN: usize = 10;

/// Titles that stand in for "no title".
const PLACEHOLDER_TITLES: &[&str] = &["untitled", "no title", "n/a", "unknown", "tbd"];

static LATEX_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[a-zA-Z]+\{([^}]*)\}").expect("valid regex"));
static BRACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[{}]").expect("valid regex"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-:]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static URL_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\url\{([^}]*)\}").expect("valid regex"));

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Clean a title for use in a search query.
///
/// `\textbf{Bold}` becomes `Bold`, braces disappear, punctuation other than
/// `-` and `:` becomes whitespace, and whitespace is collapsed.
pub fn clean_title_for_search(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }
    let clean = LATEX_COMMAND.replace_all(title, "$1");
    let clean = BRACES.replace_all(&clean, "");
    let clean = PUNCTUATION.replace_all(&clean, " ");
    normalize_whitespace(&clean)
}

/// Whether a cleaned title is long enough to search for.
pub fn is_searchable_title(clean_title: &str) -> bool {
    clean_title.chars().count() >= MIN_SEARCH_TITLE_LEN
}

/// Whether an entry title is worth a title search at all.
///
/// Rejects blanks, placeholders, anything shorter than five characters and
/// digits-only titles.
pub fn is_valid_title(title: &str) -> bool {
    let title = title.trim();
    if title.is_empty() {
        return false;
    }
    let lower = title.to_lowercase();
    if PLACEHOLDER_TITLES.contains(&lower.as_str()) {
        return false;
    }
    if title.chars().count() < 5 {
        return false;
    }
    !title.chars().all(|c| c.is_ascii_digit())
}

fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity over stop-word-filtered tokens, with a substring bonus.
///
/// Returns 0.0 when either side has no meaningful tokens. The result is
/// symmetric and always in `[0, 1]`.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let words_a = token_set(a);
    let words_b = token_set(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    let mut score = if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    };

    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    if lower_a.contains(&lower_b) || lower_b.contains(&lower_a) {
        score += SUBSTRING_BONUS;
    }

    score.min(1.0)
}

/// Best similarity between any query author and any candidate author.
///
/// `query_author` may hold several names separated by `" and "`.
pub fn author_similarity(query_author: &str, candidate_authors: &[String]) -> f64 {
    if query_author.is_empty() || candidate_authors.is_empty() {
        return 0.0;
    }

    query_author
        .split(" and ")
        .map(str::trim)
        .flat_map(|q| candidate_authors.iter().map(move |c| text_similarity(q, c)))
        .fold(0.0, f64::max)
}

/// First author of an `" and "`-separated list, cut at the first comma.
///
/// `"Smith, John and Doe, Jane"` yields `"Smith"`.
pub fn extract_first_author(author_str: &str) -> String {
    author_str
        .split(" and ")
        .next()
        .and_then(|first| first.split(',').next())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Confidence that `candidate` is the paper described by the query.
///
/// `title * 0.7 + author * 0.3 + provider_boost`. Titles are cleaned before
/// comparison; the author term only counts when both sides have authors.
pub fn match_confidence(
    query_title: &str,
    query_author: Option<&str>,
    candidate_title: Option<&str>,
    candidate_authors: &[String],
    provider_boost: f64,
) -> f64 {
    let mut score = 0.0;

    if let Some(candidate_title) = candidate_title.filter(|t| !t.is_empty()) {
        let title_sim = text_similarity(
            &clean_title_for_search(query_title),
            &clean_title_for_search(candidate_title),
        );
        score += title_sim * TITLE_WEIGHT;
    }

    if let Some(author) = query_author.filter(|a| !a.is_empty()) {
        score += author_similarity(author, candidate_authors) * AUTHOR_WEIGHT;
    }

    score + provider_boost
}

/// Pick the highest-scoring candidate whose score exceeds `min_confidence`.
///
/// Ties keep the earlier candidate, so provider ranking breaks them.
pub fn best_match<T>(
    candidates: impl IntoIterator<Item = T>,
    min_confidence: f64,
    score: impl Fn(&T) -> f64,
) -> Option<(T, f64)> {
    let mut best: Option<(T, f64)> = None;
    for candidate in candidates {
        let s = score(&candidate);
        let best_score = best.as_ref().map_or(0.0, |(_, b)| *b);
        if s > best_score && s > min_confidence {
            best = Some((candidate, s));
        }
    }
    best
}

/// Strip XML/HTML tags (JATS in particular) and collapse whitespace.
pub fn strip_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let without_tags = MARKUP_TAG.replace_all(text, " ");
    let decoded = without_tags
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    normalize_whitespace(&decoded)
}

/// Remove a LaTeX `\url{}` wrapper and unescape LaTeX special characters.
pub fn clean_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let unwrapped = URL_WRAPPER.replace_all(url.trim(), "$1");
    unwrapped
        .replace("\\_", "_")
        .replace("\\&", "&")
        .replace("\\%", "%")
        .replace("\\#", "#")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_title_removes_latex_commands() {
        let result = clean_title_for_search("A \\textbf{Bold} Approach to \\emph{Machine} Learning");
        assert_eq!(result, "A Bold Approach to Machine Learning");
    }

    #[test]
    fn test_clean_title_removes_braces_and_punctuation() {
        assert_eq!(clean_title_for_search("{Deep} Learning for {NLP}!"), "Deep Learning for NLP");
        assert_eq!(
            clean_title_for_search("Pre-trained Models: A Survey"),
            "Pre-trained Models: A Survey"
        );
        assert_eq!(
            clean_title_for_search("Machine    Learning   with   Python"),
            "Machine Learning with Python"
        );
        assert_eq!(clean_title_for_search(""), "");
    }

    #[test]
    fn test_identical_texts() {
        let text = "machine learning neural networks";
        assert!(text_similarity(text, text) >= 0.9);
    }

    #[test]
    fn test_different_texts() {
        let score = text_similarity("machine learning neural networks", "banana apple orange fruit");
        assert!(score < 0.3);
    }

    #[test]
    fn test_partial_overlap() {
        let score = text_similarity("machine learning models", "deep learning models");
        assert!(score > 0.3 && score < 0.8, "score was {score}");
    }

    #[test]
    fn test_stop_words_ignored() {
        assert!(text_similarity("the machine", "a machine") >= 0.9);
        assert_eq!(text_similarity("the of and", "the of and"), 0.0);
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(text_similarity("", "hello"), 0.0);
        assert_eq!(text_similarity("hello", ""), 0.0);
        assert_eq!(text_similarity("", ""), 0.0);
        assert_eq!(text_similarity("   ", "hello"), 0.0);
    }

    #[test]
    fn test_substring_bonus() {
        // jaccard 2/3 plus the substring bonus
        let score = text_similarity("neural networks", "deep neural networks");
        assert!((score - (2.0 / 3.0 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_author_similarity() {
        assert!(author_similarity("John Smith", &names(&["John Smith", "Jane Doe"])) >= 0.9);
        assert!(author_similarity("John Smith and Jane Doe", &names(&["Jane Doe"])) >= 0.9);
        assert!(author_similarity("John Smith", &names(&["Alice Brown", "Bob Wilson"])) < 0.3);
        assert_eq!(author_similarity("", &names(&["John"])), 0.0);
        assert_eq!(author_similarity("John", &[]), 0.0);
    }

    #[test]
    fn test_extract_first_author() {
        assert_eq!(extract_first_author("John Smith"), "John Smith");
        assert_eq!(extract_first_author("John Smith and Jane Doe and Bob Wilson"), "John Smith");
        assert_eq!(extract_first_author("Smith, John and Doe, Jane"), "Smith");
        assert_eq!(extract_first_author(""), "");
    }

    #[test]
    fn test_match_confidence_formula() {
        // title jaccard 4/5 (no substring), author identical -> 0.8*0.7 + 1.0*0.3
        let score = match_confidence(
            "Deep Learning for Protein Folding",
            Some("Jane Smith"),
            Some("Deep Learning for Protein Structure Folding"),
            &names(&["Jane Smith", "Bob Lee"]),
            0.0,
        );
        assert!((score - 0.86).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_match_confidence_without_authors() {
        let score = match_confidence("Attention Is All You Need", None, Some("Attention Is All You Need"), &[], 0.0);
        assert!((score - 0.7).abs() < 1e-9);

        let score = match_confidence("Attention Is All You Need", Some("Vaswani"), None, &[], 0.05);
        assert!((score - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_best_match_requires_exceeding_threshold() {
        let candidates = vec![("a", 0.5), ("b", 0.7), ("c", 0.69)];
        assert!(best_match(candidates.clone(), 0.7, |c| c.1).is_none());

        let (winner, score) = best_match(candidates, 0.6, |c| c.1).unwrap();
        assert_eq!(winner.0, "b");
        assert_eq!(score, 0.7);
    }

    #[test]
    fn test_best_match_keeps_first_on_tie() {
        let candidates = vec![("first", 0.9), ("second", 0.9)];
        let (winner, _) = best_match(candidates, 0.6, |c| c.1).unwrap();
        assert_eq!(winner.0, "first");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<jats:p>This is abstract text.</jats:p>"), "This is abstract text.");
        assert_eq!(
            strip_markup("<jats:title>Title</jats:title><jats:p>Paragraph 1</jats:p><jats:p>Paragraph 2</jats:p>"),
            "Title Paragraph 1 Paragraph 2"
        );
        assert_eq!(
            strip_markup("<jats:p>This has <jats:italic>emphasis</jats:italic> text.</jats:p>"),
            "This has emphasis text."
        );
        assert_eq!(strip_markup("<p>Line 1</p>\n\n<p>Line 2 &amp; 3</p>"), "Line 1 Line 2 & 3");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(
            clean_url("https://example.com/path\\_with\\_underscores"),
            "https://example.com/path_with_underscores"
        );
        assert_eq!(clean_url("https://example.com/path?a=1\\&b=2"), "https://example.com/path?a=1&b=2");
        assert_eq!(clean_url("\\url{https://example.com/paper}"), "https://example.com/paper");
        assert_eq!(clean_url("https://example.com/normal-path"), "https://example.com/normal-path");
        assert_eq!(clean_url(""), "");
    }

    #[test]
    fn test_is_valid_title() {
        assert!(is_valid_title("Deep Learning for Image Recognition"));
        assert!(is_valid_title("A Survey of Machine Learning"));
        assert!(!is_valid_title(""));
        assert!(!is_valid_title("Untitled"));
        assert!(!is_valid_title("No Title"));
        assert!(!is_valid_title("N/A"));
        assert!(!is_valid_title("Hi"));
        assert!(!is_valid_title("Test"));
        assert!(!is_valid_title("12345"));
    }

    #[test]
    fn test_searchable_title_length() {
        assert!(!is_searchable_title("Short one"));
        assert!(is_searchable_title("Long enough"));
    }
}
