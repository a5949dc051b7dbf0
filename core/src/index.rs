use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use crate::document::{DocId, Document};
use crate::error::{Error, Result};
use crate::postings::PostingList;
use crate::tokenizer::Normalizer;

/// Term -> postings mapping plus the document table the ids point into.
///
/// Built once by [`IndexBuilder`] and read-only afterwards; share it behind an
/// `Arc` for concurrent queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, PostingList>,
    documents: Vec<Document>,
}

impl InvertedIndex {
    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &PostingList)> {
        self.postings.iter().map(|(t, p)| (t.as_str(), p))
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    /// Checks dense document numbering and that every posting is a valid id.
    /// Postings order is already enforced by [`PostingList`].
    pub fn validate(&self) -> Result<()> {
        if let Some((i, doc)) = self.documents.iter().enumerate().find(|(i, d)| d.id as usize != *i) {
            return Err(Error::CorruptIndex(format!("document at position {i} has id {}", doc.id)));
        }
        let n = self.documents.len();
        for (term, list) in &self.postings {
            if let Some(last) = list.last() {
                if last as usize >= n {
                    return Err(Error::CorruptIndex(format!(
                        "term `{term}` references document {last} but only {n} documents exist"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-build summary; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub term_count: usize,
    pub document_count: usize,
    pub build_duration: Duration,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Words: {}", self.term_count)?;
        writeln!(f, "Docs: {}", self.document_count)?;
        write!(f, "Time: {:.2}s", self.build_duration.as_secs_f64())
    }
}

/// Single-pass builder: documents get sequential ids in ingestion order.
pub struct IndexBuilder {
    normalizer: Normalizer,
    index: InvertedIndex,
    started: Instant,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

impl IndexBuilder {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer, index: InvertedIndex::default(), started: Instant::now() }
    }

    /// Normalizes `raw_text` and adds it as the next document. Duplicate urls
    /// become independent documents.
    pub fn add(&mut self, url: &str, raw_text: &str) -> DocId {
        let normalized = self.normalizer.normalize(raw_text);
        let doc_id = self.index.documents.len() as DocId;

        let mut seen: HashSet<&str> = HashSet::with_capacity(normalized.tokens.len());
        for token in &normalized.tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }
            self.index.postings.entry(token.clone()).or_default().insert(doc_id);
        }
        tracing::debug!(doc_id, url, tokens = normalized.tokens.len(), unique = seen.len(), "indexed document");

        self.index.documents.push(Document {
            id: doc_id,
            title: url.to_string(),
            url: url.to_string(),
            text: normalized.text,
        });
        doc_id
    }

    pub fn finish(self) -> (InvertedIndex, BuildStats) {
        let stats = BuildStats {
            term_count: self.index.num_terms(),
            document_count: self.index.num_docs(),
            build_duration: self.started.elapsed(),
        };
        tracing::info!(num_docs = stats.document_count, num_terms = stats.term_count, "index build complete");
        (self.index, stats)
    }

    /// Builds an index from `(url, raw_text)` records in order.
    pub fn build<I, U, T>(normalizer: Normalizer, documents: I) -> (InvertedIndex, BuildStats)
    where
        I: IntoIterator<Item = (U, T)>,
        U: AsRef<str>,
        T: AsRef<str>,
    {
        let mut builder = IndexBuilder::new(normalizer);
        for (url, text) in documents {
            builder.add(url.as_ref(), text.as_ref());
        }
        builder.finish()
    }
}
