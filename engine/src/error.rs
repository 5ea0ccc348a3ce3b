use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by index construction, query dispatch, evaluation and loading.
///
/// Everything except `Io` and `Parse` is a configuration error: the caller asked
/// for something the engine refuses to guess about. Degenerate data (empty
/// corpus, empty relevant set, zero union) never produces an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("top_k must be a positive integer, got {0}")]
    InvalidTopK(usize),
    #[error("cutoff k must be a positive integer, got {0}")]
    InvalidCutoff(usize),
    #[error("invalid BM25 parameters: {0}")]
    InvalidBm25Params(String),
    #[error("invalid TF-IDF configuration: {0}")]
    InvalidTfIdfConfig(String),
    #[error("unknown ranking model {0:?} (expected tfidf, bm25 or jaccard)")]
    UnknownModel(String),
    #[error("no queries to evaluate")]
    NoQueries,
    #[error("{path}:{line}: {message}")]
    Parse { path: String, line: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for caller misuse, false for I/O or malformed input files.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Error::Io(_) | Error::Parse { .. })
    }
}
