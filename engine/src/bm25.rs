//! Okapi BM25 over [`TermStats`].
//!
//! ```text
//! IDF(t)     = ln(1 + (N - df(t) + 0.5) / (df(t) + 0.5))
//! score(d,t) = IDF(t) * f(t,d)*(k1+1) / (f(t,d) + k1*(1 - b + b*len(d)/avgdl))
//! score(d,Q) = sum over distinct query terms
//! ```

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::rank::{check_top_k, top_k, Ranked};
use crate::stats::TermStats;
use crate::TermId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation, `k1 >= 0`.
    pub k1: f64,
    /// Length normalization strength, `0 <= b <= 1`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        let params = Self { k1, b };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(Error::InvalidBm25Params(format!("k1 must be finite and >= 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidBm25Params(format!("b must be in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

/// `IDF(t)` for a term seen in `df` of `n` documents. Finite for every `df >= 0`.
pub fn idf(n: usize, df: u32) -> f64 {
    let (n, df) = (n as f64, df as f64);
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// Contribution of one term to one document. Zero when the document or the
/// corpus has no length to normalize against, or when the term is absent.
pub fn term_score(idf: f64, tf: u32, doc_len: u32, avg_doc_len: f64, params: Bm25Params) -> f64 {
    if tf == 0 || doc_len == 0 || avg_doc_len <= 0.0 {
        return 0.0;
    }
    let f = tf as f64;
    let norm = 1.0 - params.b + params.b * doc_len as f64 / avg_doc_len;
    let denom = f + params.k1 * norm;
    if denom <= 0.0 {
        return 0.0;
    }
    idf * f * (params.k1 + 1.0) / denom
}

#[derive(Debug, Clone)]
pub struct Bm25Index {
    stats: TermStats,
    /// Cached `IDF(t)` per term id.
    idf: Vec<f64>,
}

impl Bm25Index {
    pub fn build(corpus: &Corpus) -> Self {
        Self::from_stats(TermStats::build(corpus))
    }

    pub fn from_stats(stats: TermStats) -> Self {
        let n = stats.num_docs();
        let idf = stats.df.iter().map(|&df| idf(n, df)).collect();
        tracing::info!(num_docs = n, num_terms = stats.vocabulary.len(), avg_doc_len = stats.avg_doc_len, "bm25 index built");
        Self { stats, idf }
    }

    pub fn stats(&self) -> &TermStats { &self.stats }

    pub fn num_docs(&self) -> usize { self.stats.num_docs() }

    /// IDF of `term`; out-of-vocabulary terms use df = 0.
    pub fn idf(&self, term: &str) -> f64 {
        match self.stats.vocabulary.get(term) {
            Some(id) => self.idf[id as usize],
            None => idf(self.num_docs(), 0),
        }
    }

    /// Distinct in-vocabulary term ids, in first-occurrence order.
    fn query_terms(&self, tokens: &[String]) -> Vec<TermId> {
        let mut seen = HashSet::new();
        tokens
            .iter()
            .filter_map(|t| self.stats.vocabulary.get(t))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    fn score_terms(&self, doc: usize, terms: &[TermId], params: Bm25Params) -> f64 {
        let doc_len = self.stats.doc_len[doc];
        terms
            .iter()
            .map(|&t| term_score(self.idf[t as usize], self.stats.tf(doc, t), doc_len, self.stats.avg_doc_len, params))
            .sum()
    }

    /// Total BM25 score of one document. Unknown documents score 0.
    pub fn score(&self, doc: usize, tokens: &[String], params: Bm25Params) -> Result<f64> {
        params.validate()?;
        if doc >= self.num_docs() {
            return Ok(0.0);
        }
        Ok(self.score_terms(doc, &self.query_terms(tokens), params))
    }

    /// Score for every document, one slot each.
    pub fn scores(&self, tokens: &[String], params: Bm25Params) -> Result<Vec<f64>> {
        params.validate()?;
        let terms = self.query_terms(tokens);
        if terms.is_empty() {
            return Ok(vec![0.0; self.num_docs()]);
        }
        Ok((0..self.num_docs())
            .into_par_iter()
            .map(|doc| self.score_terms(doc, &terms, params))
            .collect())
    }

    pub fn search(&self, tokens: &[String], k: usize, params: Bm25Params) -> Result<Ranked> {
        check_top_k(k)?;
        let scores = self.scores(tokens, params)?;
        Ok(top_k(&scores, k))
    }
}
