use serde::{Deserialize, Serialize};
use std::fmt;

pub type DocId = u32;

/// Maximum number of characters of normalized text returned as a snippet.
pub const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Defaults to the url; no title extraction is performed.
    pub title: String,
    pub url: String,
    /// Normalized text, the source of snippets.
    pub text: String,
}

impl Document {
    pub fn snippet(&self) -> String {
        self.text.chars().take(SNIPPET_CHARS).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn from_document(doc: &Document) -> Self {
        Self { doc_id: doc.id, url: doc.url.clone(), snippet: doc.snippet() }
    }
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.url, self.snippet)
    }
}
