//! Single dispatch point over the three ranking models.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bm25::{Bm25Index, Bm25Params};
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::jaccard::JaccardMatcher;
use crate::rank::Ranked;
use crate::stats::TermStats;
use crate::tfidf::{TfIdfConfig, TfIdfIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    TfIdf,
    Bm25,
    Jaccard,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::TfIdf, Model::Bm25, Model::Jaccard];

    pub fn as_str(self) -> &'static str {
        match self {
            Model::TfIdf => "tfidf",
            Model::Bm25 => "bm25",
            Model::Jaccard => "jaccard",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(Model::TfIdf),
            "bm25" => Ok(Model::Bm25),
            "jaccard" => Ok(Model::Jaccard),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

/// Raw text is split on whitespace; the engine never normalizes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Text(String),
    Tokens(Vec<String>),
}

impl Query {
    pub fn tokens(&self) -> Cow<'_, [String]> {
        match self {
            Query::Text(s) => Cow::Owned(s.split_whitespace().map(str::to_string).collect()),
            Query::Tokens(t) => Cow::Borrowed(t.as_slice()),
        }
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self { Query::Text(s.to_string()) }
}

impl From<Vec<String>> for Query {
    fn from(t: Vec<String>) -> Self { Query::Tokens(t) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tfidf: TfIdfConfig,
    /// Vocabulary rules for the binary Jaccard vectors.
    pub jaccard: TfIdfConfig,
    /// Used by [`Engine::execute`]; [`Engine::execute_bm25`] takes its own.
    pub bm25: Bm25Params,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.tfidf.validate()?;
        self.jaccard.validate()?;
        self.bm25.validate()
    }
}

/// Frozen corpus plus every index built over it. Immutable once built, so it
/// can be shared across threads behind an `Arc` without locking.
#[derive(Debug)]
pub struct Engine {
    corpus: Corpus,
    config: EngineConfig,
    tfidf: TfIdfIndex,
    bm25: Bm25Index,
    jaccard: JaccardMatcher,
}

impl Engine {
    pub fn build(corpus: Corpus, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let tfidf = TfIdfIndex::build(&corpus, config.tfidf)?;
        let bm25 = Bm25Index::from_stats(TermStats::build(&corpus));
        let jaccard = JaccardMatcher::build(&corpus, &config.jaccard)?;
        tracing::info!(num_docs = corpus.len(), "engine ready");
        Ok(Self { corpus, config, tfidf, bm25, jaccard })
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn tfidf(&self) -> &TfIdfIndex { &self.tfidf }

    pub fn bm25(&self) -> &Bm25Index { &self.bm25 }

    pub fn jaccard(&self) -> &JaccardMatcher { &self.jaccard }

    /// Ranked internal indices for `query` under `model`.
    pub fn rank(&self, model: Model, query: &Query, top_k: usize) -> Result<Ranked> {
        let tokens = query.tokens();
        match model {
            Model::TfIdf => self.tfidf.search(&tokens, top_k),
            Model::Bm25 => self.bm25.search(&tokens, top_k, self.config.bm25),
            Model::Jaccard => self.jaccard.search(&tokens, top_k),
        }
    }

    pub fn execute(&self, model: Model, query: &Query, top_k: usize) -> Result<Vec<Hit>> {
        let ranked = self.rank(model, query, top_k)?;
        Ok(self.resolve(ranked))
    }

    /// Like [`execute`](Self::execute) with BM25 parameters for this query only.
    pub fn execute_bm25(&self, query: &Query, top_k: usize, params: Bm25Params) -> Result<Vec<Hit>> {
        let ranked = self.bm25.search(&query.tokens(), top_k, params)?;
        Ok(self.resolve(ranked))
    }

    /// String selector variant; unknown names fail instead of falling back.
    pub fn execute_named(&self, model: &str, query: &Query, top_k: usize) -> Result<Vec<Hit>> {
        self.execute(model.parse()?, query, top_k)
    }

    /// Run a whole query set, keeping only the ranked document ids.
    pub fn run_batch<'a, I>(&self, model: Model, queries: I, top_k: usize) -> Result<BTreeMap<String, Vec<String>>>
    where
        I: IntoIterator<Item = (&'a str, &'a Query)>,
    {
        let mut results = BTreeMap::new();
        for (qid, query) in queries {
            let hits = self.execute(model, query, top_k)?;
            results.insert(qid.to_string(), hits.into_iter().map(|h| h.doc_id).collect());
        }
        Ok(results)
    }

    fn resolve(&self, ranked: Ranked) -> Vec<Hit> {
        ranked
            .into_iter()
            .filter_map(|(idx, score)| self.corpus.doc_id(idx).map(|id| Hit { doc_id: id.to_string(), score }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_selectors() {
        assert_eq!("tfidf".parse::<Model>().unwrap(), Model::TfIdf);
        assert_eq!("TF-IDF".parse::<Model>().unwrap(), Model::TfIdf);
        assert_eq!(" BM25 ".parse::<Model>().unwrap(), Model::Bm25);
        assert_eq!("jaccard".parse::<Model>().unwrap(), Model::Jaccard);
        for m in Model::ALL {
            assert_eq!(m.as_str().parse::<Model>().unwrap(), m);
        }
    }

    #[test]
    fn unknown_selector_fails_fast() {
        let err = "cosine".parse::<Model>().unwrap_err();
        assert!(matches!(err, Error::UnknownModel(ref s) if s == "cosine"));
        assert!(err.is_configuration());
    }

    #[test]
    fn text_queries_split_on_whitespace() {
        let q = Query::from("  ocean   warming ");
        assert_eq!(q.tokens().as_ref(), &["ocean".to_string(), "warming".to_string()]);
    }
}
