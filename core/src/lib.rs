pub mod document;
pub mod error;
pub mod index;
pub mod persist;
pub mod postings;
pub mod query;
pub mod stopwords;
pub mod tokenizer;

pub use document::{DocId, Document, SearchHit, SNIPPET_CHARS};
pub use error::{Error, Result};
pub use index::{BuildStats, IndexBuilder, InvertedIndex};
pub use postings::PostingList;
pub use query::{evaluate, parse_query, parse_query_with, search, search_with, Clause, Operand, ParseOptions, Query};
pub use tokenizer::{Language, Normalized, Normalizer, NormalizerConfig, Segmenter};
