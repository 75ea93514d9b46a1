//! DOI normalization and validation.

use super::domain::EnrichmentError;

/// Prefixes stripped before a DOI is used in a request.
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Strip resolver URL and `doi:` prefixes (case-insensitive) and whitespace.
pub fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim();
    for prefix in DOI_PREFIXES {
        if let Some(head) = doi.get(..prefix.len())
            && head.eq_ignore_ascii_case(prefix)
        {
            doi = doi[prefix.len()..].trim();
            break;
        }
    }
    doi.to_string()
}

/// Syntactic check: `10.` registrant prefix followed by a `/` suffix.
pub fn is_valid_doi(doi: &str) -> bool {
    doi.len() >= 7 && doi.starts_with("10.") && doi[3..].contains('/')
}

/// Clean and validate in one step.
pub fn normalize_doi(doi: &str) -> Result<String, EnrichmentError> {
    let clean = clean_doi(doi);
    if is_valid_doi(&clean) {
        Ok(clean)
    } else {
        Err(EnrichmentError::InvalidDoi(doi.to_string()))
    }
}

/// Percent-encode a DOI for use as URL path segments.
///
/// Slashes stay as separators; `#`, `?`, `;` and other reserved characters
/// in the suffix are escaped so they can't end the path early.
pub fn encode_doi_path(doi: &str) -> String {
    doi.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_doi_strips_prefixes() {
        assert_eq!(clean_doi("https://doi.org/10.1234/test"), "10.1234/test");
        assert_eq!(clean_doi("http://dx.doi.org/10.1234/test"), "10.1234/test");
        assert_eq!(clean_doi("DOI:10.1234/test"), "10.1234/test");
        assert_eq!(clean_doi("  10.1234/test "), "10.1234/test");
    }

    #[test]
    fn test_is_valid_doi() {
        assert!(is_valid_doi("10.1234/test"));
        assert!(is_valid_doi("10.48550/arXiv.2301.00001"));
        assert!(!is_valid_doi("not-a-doi"));
        assert!(!is_valid_doi("10.1234"));
        assert!(!is_valid_doi("11.1234/abc"));
        assert!(!is_valid_doi(""));
    }

    #[test]
    fn test_normalize_doi() {
        assert_eq!(normalize_doi("doi:10.1000/xyz").unwrap(), "10.1000/xyz");
        assert!(matches!(
            normalize_doi("not-a-doi"),
            Err(EnrichmentError::InvalidDoi(_))
        ));
    }

    #[test]
    fn test_encode_doi_path_keeps_slashes() {
        assert_eq!(encode_doi_path("10.1234/test"), "10.1234/test");
        assert_eq!(
            encode_doi_path("10.1002/(SICI)1097-4571(199806)49:8<693::AID-ASI4>3.0.CO;2-#"),
            "10.1002/%28SICI%291097-4571%28199806%2949%3A8%3C693%3A%3AAID-ASI4%3E3.0.CO%3B2-%23"
        );
        assert_eq!(encode_doi_path("10.1000/a?b/c"), "10.1000/a%3Fb/c");
    }
}
