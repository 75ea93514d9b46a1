//! ArXiv Atom feed parsing
//!
//! The ArXiv query API answers with an Atom 1.0 feed plus `arxiv:` extension
//! elements. [`AtomEntry`] holds exactly what we read from one `<entry>`.
//!
//! API Reference: https://info.arxiv.org/help/api/user-manual.html

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::enrichment::domain::EnrichmentError;
use crate::enrichment::similarity::normalize_whitespace;

/// One `<entry>` of an ArXiv Atom feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2301.00001v1`
    pub id: String,
    pub title: String,
    pub summary: String,
    /// RFC 3339 timestamp of the first version
    pub published: String,
    pub authors: Vec<String>,
    pub pdf_url: Option<String>,
    pub doi: Option<String>,
    pub journal_ref: Option<String>,
    pub categories: Vec<String>,
}

/// Parse an Atom feed into its entries.
///
/// Error entries (ArXiv reports bad queries as an entry whose id points at
/// `api/errors`) are dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<AtomEntry>, EnrichmentError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<AtomEntry> = None;
    let mut element = String::new();
    let mut in_author = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "entry" => current = Some(AtomEntry::default()),
                    "author" => in_author = true,
                    _ => {
                        if let Some(entry) = current.as_mut() {
                            read_attributes(entry, &name, e);
                        }
                    }
                }
                element = name;
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(entry) = current.as_mut() {
                    read_attributes(entry, &name, e);
                }
            }
            Ok(Event::End(ref e)) => {
                match e.name().as_ref() {
                    b"entry" => {
                        if let Some(entry) = current.take()
                            && !entry.id.contains("api/errors")
                        {
                            entries.push(entry);
                        }
                    }
                    b"author" => in_author = false,
                    _ => {}
                }
                element.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(entry) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| EnrichmentError::Parse(format!("XML text: {}", err)))?;
                    read_text(entry, &element, in_author, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(EnrichmentError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    for entry in &mut entries {
        entry.title = normalize_whitespace(&entry.title);
        entry.summary = normalize_whitespace(&entry.summary);
    }

    Ok(entries)
}

fn read_text(entry: &mut AtomEntry, element: &str, in_author: bool, text: &str) {
    match element {
        "id" => entry.id.push_str(text.trim()),
        "title" => push_spaced(&mut entry.title, text),
        "summary" => push_spaced(&mut entry.summary, text),
        "published" => entry.published.push_str(text.trim()),
        "name" if in_author => entry.authors.push(text.trim().to_string()),
        "arxiv:doi" => entry.doi = Some(text.trim().to_string()),
        "arxiv:journal_ref" => entry.journal_ref = Some(text.trim().to_string()),
        _ => {}
    }
}

fn push_spaced(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// `<link>` and `<category>` carry their data in attributes.
fn read_attributes(entry: &mut AtomEntry, name: &str, e: &BytesStart<'_>) {
    match name {
        "link" => {
            let mut href = None;
            let mut title = None;
            let mut link_type = None;
            for attr in e.attributes().flatten() {
                let value = String::from_utf8_lossy(&attr.value).to_string();
                match attr.key.as_ref() {
                    b"href" => href = Some(value),
                    b"title" => title = Some(value),
                    b"type" => link_type = Some(value),
                    _ => {}
                }
            }
            if title.as_deref() == Some("pdf") || link_type.as_deref() == Some("application/pdf") {
                entry.pdf_url = href;
            }
        }
        "category" | "arxiv:primary_category" => {
            for attr in e.attributes().flatten() {
                if attr.key.as_ref() == b"term" {
                    let term = String::from_utf8_lossy(&attr.value).to_string();
                    if !entry.categories.contains(&term) {
                        entry.categories.push(term);
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on
  complex recurrent networks &amp; encoders.
    </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <arxiv:doi>10.5555/3295222.3295349</arxiv:doi>
    <arxiv:journal_ref>NeurIPS 2017</arxiv:journal_ref>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_entry() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 1);

        let e = &entries[0];
        assert_eq!(e.id, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(e.title, "Attention Is All You Need");
        assert!(e.summary.starts_with("The dominant sequence"));
        assert!(e.summary.contains("networks & encoders."));
        assert_eq!(e.published, "2017-06-12T17:57:34Z");
        assert_eq!(e.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(e.pdf_url.as_deref(), Some("http://arxiv.org/pdf/1706.03762v7"));
        assert_eq!(e.doi.as_deref(), Some("10.5555/3295222.3295349"));
        assert_eq!(e.journal_ref.as_deref(), Some("NeurIPS 2017"));
        assert_eq!(e.categories, vec!["cs.CL", "cs.LG"]);
    }

    #[test]
    fn test_feed_title_is_not_an_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>ArXiv Query</title></feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_error_entries_are_skipped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
          <entry>
            <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
            <title>Error</title>
            <summary>incorrect id format for 1234</summary>
          </entry>
        </feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let result = parse_feed("<feed><entry><id>x</wrong></entry></feed>");
        assert!(matches!(result, Err(EnrichmentError::Parse(_))));
    }
}
