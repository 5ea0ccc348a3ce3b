//! Lexical ranking over a frozen, pre-tokenized corpus.
//!
//! Three independent models share one dispatch seam ([`executor::Engine`]):
//! TF-IDF cosine similarity, Okapi BM25 and Jaccard set overlap. The [`eval`]
//! module scores ranked output against relevance judgments.
//!
//! Ranking is deterministic everywhere: score descending, then internal
//! document index ascending.

pub mod analyzer;
pub mod bm25;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod executor;
pub mod jaccard;
pub mod load;
pub mod rank;
pub mod stats;
pub mod tfidf;
pub mod vocabulary;

pub type TermId = u32;
/// Position of a document inside the frozen corpus.
pub type DocIdx = u32;

pub use corpus::{Corpus, CorpusBuilder, Document};
pub use error::{Error, Result};
pub use executor::{Engine, EngineConfig, Hit, Model, Query};
