//! Vector-space model: smoothed TF-IDF rows, L2-normalized, cosine scoring.
//!
//! Weights:
//! - `idf(t) = ln((1 + N) / (1 + df(t))) + 1`
//! - `tf'(t, d) = f(t, d)`, or `1 + ln(f(t, d))` with `sublinear_tf`
//! - `w(t, d) = tf'(t, d) * idf(t)`, each row scaled to unit length
//!
//! Because both sides are unit vectors the cosine similarity is a plain dot product.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::rank::{check_top_k, top_k, Ranked};
use crate::vocabulary::Vocabulary;
use crate::TermId;

/// Document-frequency bound, either absolute or relative to the corpus size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DfCutoff {
    Count(u32),
    Proportion(f64),
}

impl DfCutoff {
    fn threshold(self, num_docs: usize) -> f64 {
        match self {
            DfCutoff::Count(n) => n as f64,
            DfCutoff::Proportion(p) => p * num_docs as f64,
        }
    }

    fn validate(self, name: &str) -> Result<()> {
        if let DfCutoff::Proportion(p) = self {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidTfIdfConfig(format!("{name} proportion must be in [0, 1], got {p}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfIdfConfig {
    /// Drop terms seen in fewer documents than this.
    pub min_df: DfCutoff,
    /// Drop terms seen in more documents than this.
    pub max_df: DfCutoff,
    pub sublinear_tf: bool,
    /// Inclusive (min_n, max_n) span lengths.
    pub ngram_range: (usize, usize),
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            min_df: DfCutoff::Count(1),
            max_df: DfCutoff::Proportion(1.0),
            sublinear_tf: false,
            ngram_range: (1, 1),
        }
    }
}

impl TfIdfConfig {
    pub fn validate(&self) -> Result<()> {
        self.min_df.validate("min_df")?;
        self.max_df.validate("max_df")?;
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(Error::InvalidTfIdfConfig(format!("ngram_range must satisfy 1 <= min_n <= max_n, got ({lo}, {hi})")));
        }
        if let (DfCutoff::Count(min), DfCutoff::Count(max)) = (self.min_df, self.max_df) {
            if min > max {
                return Err(Error::InvalidTfIdfConfig(format!("min_df ({min}) exceeds max_df ({max})")));
            }
        }
        Ok(())
    }
}

/// Contiguous spans of `range.0..=range.1` tokens joined by a single space,
/// shortest spans first.
pub fn ngrams(tokens: &[String], range: (usize, usize)) -> Vec<String> {
    let (lo, hi) = range;
    let mut out = Vec::new();
    for n in lo.max(1)..=hi.min(tokens.len()) {
        for window in tokens.windows(n) {
            out.push(window.join(" "));
        }
    }
    out
}

fn count_terms(tokens: &[String], range: (usize, usize)) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for gram in ngrams(tokens, range) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Per-document n-gram counts plus the pruned, sorted vocabulary they map into.
pub(crate) struct Analyzed {
    pub counts: Vec<HashMap<String, u32>>,
    pub vocabulary: Vocabulary,
    /// Indexed by term id.
    pub df: Vec<u32>,
}

pub(crate) fn analyze(corpus: &Corpus, config: &TfIdfConfig) -> Result<Analyzed> {
    config.validate()?;
    let n = corpus.len();

    let counts: Vec<HashMap<String, u32>> = corpus.tokens().map(|t| count_terms(t, config.ngram_range)).collect();
    let mut df: HashMap<&str, u32> = HashMap::new();
    for doc in &counts {
        for term in doc.keys() {
            *df.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let min_count = config.min_df.threshold(n);
    let max_count = config.max_df.threshold(n);
    if n > 0 && max_count < min_count {
        return Err(Error::InvalidTfIdfConfig(format!(
            "max_df resolves to {max_count} documents, fewer than min_df ({min_count})"
        )));
    }

    let mut kept: Vec<(&str, u32)> = df
        .into_iter()
        .filter(|&(_, d)| d as f64 >= min_count && d as f64 <= max_count)
        .collect();
    kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let vocabulary: Vocabulary = kept.iter().map(|&(t, _)| t).collect();
    let df = kept.iter().map(|&(_, d)| d).collect();
    Ok(Analyzed { counts, vocabulary, df })
}

/// Built once from a frozen corpus, read-only afterwards.
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    config: TfIdfConfig,
    /// Columns in lexicographic term order.
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    /// One sparse row per document, sorted by term id.
    rows: Vec<Vec<(TermId, f64)>>,
}

impl TfIdfIndex {
    pub fn build(corpus: &Corpus, config: TfIdfConfig) -> Result<Self> {
        let Analyzed { counts, vocabulary, df } = analyze(corpus, &config)?;
        let n = corpus.len();
        let idf = df.iter().map(|&d| ((1.0 + n as f64) / (1.0 + d as f64)).ln() + 1.0).collect();

        let mut index = Self { config, vocabulary, idf, rows: Vec::with_capacity(n) };
        for doc in counts {
            let row = index.weigh(doc.iter().filter_map(|(t, &c)| index.vocabulary.get(t).map(|id| (id, c))));
            index.rows.push(row);
        }
        tracing::info!(num_docs = n, num_terms = index.vocabulary.len(), "tf-idf index built");
        Ok(index)
    }

    fn tf(&self, count: u32) -> f64 {
        if self.config.sublinear_tf { 1.0 + (count as f64).ln() } else { count as f64 }
    }

    /// Weighted, unit-length sparse vector for the given in-vocabulary counts.
    fn weigh(&self, counts: impl Iterator<Item = (TermId, u32)>) -> Vec<(TermId, f64)> {
        let mut row: Vec<(TermId, f64)> = counts
            .filter(|&(_, c)| c > 0)
            .map(|(id, c)| (id, self.tf(c) * self.idf[id as usize]))
            .collect();
        // sort first so the norm is summed in a fixed order
        row.sort_unstable_by_key(|&(id, _)| id);
        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in row.iter_mut() { *w /= norm; }
        }
        row
    }

    /// Project a token sequence into the document space. Unknown terms vanish.
    pub fn transform(&self, tokens: &[String]) -> Vec<(TermId, f64)> {
        let counts = count_terms(tokens, self.config.ngram_range);
        self.weigh(counts.iter().filter_map(|(t, &c)| self.vocabulary.get(t).map(|id| (id, c))))
    }

    /// Cosine similarity of the query against every row, top `k` first.
    pub fn search(&self, tokens: &[String], k: usize) -> Result<Ranked> {
        check_top_k(k)?;
        let query: HashMap<TermId, f64> = self.transform(tokens).into_iter().collect();
        let scores: Vec<f64> = if query.is_empty() {
            vec![0.0; self.rows.len()]
        } else {
            self.rows
                .par_iter()
                .map(|row| row.iter().filter_map(|(id, w)| query.get(id).map(|q| q * w)).sum::<f64>())
                .collect()
        };
        Ok(top_k(&scores, k))
    }

    pub fn config(&self) -> &TfIdfConfig { &self.config }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|id| self.idf[id as usize])
    }

    pub fn row(&self, doc: usize) -> Option<&[(TermId, f64)]> { self.rows.get(doc).map(Vec::as_slice) }

    pub fn num_docs(&self) -> usize { self.rows.len() }
}
