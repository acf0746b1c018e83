//! In-text citation extraction.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// A sentence ending in `.` that contains an `(Author, Year)` citation.
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^.]*?\([A-Z][a-z]+, \d{4}\)[^.]*\.)").unwrap());

/// A citing sentence and the context it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub citation: String,
    pub context: String,
}

/// Find every sentence carrying an `(Author, Year)` citation, in order.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    CITATION_RE
        .find_iter(text)
        .map(|m| {
            let sentence = m.as_str().trim().to_string();
            Citation {
                citation: sentence.clone(),
                context: sentence,
            }
        })
        .collect()
}
