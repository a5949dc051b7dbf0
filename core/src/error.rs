use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operator was the last token of the query.
    #[error("operator `{operator}` at token {position} has no following term")]
    DanglingOperator { operator: String, position: usize },

    /// An operator appeared where a search term was required.
    #[error("expected a term after `{operator}` at token {position}, found operator `{found}`")]
    UnexpectedOperator {
        operator: String,
        found: String,
        position: usize,
    },

    #[error("failed to load index from {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("unsupported index version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] bincode::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn load(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::Load { path: path.into(), source: Box::new(source) }
    }

    /// True for errors caused by the query text rather than the index.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::DanglingOperator { .. } | Error::UnexpectedOperator { .. })
    }
}
