//! Set-overlap model: presence/absence vectors, no weighting.

use std::collections::HashSet;
use std::hash::Hash;

use rayon::prelude::*;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::rank::{check_top_k, top_k, Ranked};
use crate::tfidf::{analyze, ngrams, Analyzed, TfIdfConfig};
use crate::vocabulary::Vocabulary;
use crate::TermId;

/// `|a ∩ b| / |a ∪ b|`, defined as 0 when both sets are empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 { 0.0 } else { inter as f64 / union as f64 }
}

/// Intersection size of two ascending, duplicate-free id lists.
fn sorted_intersection(a: &[TermId], b: &[TermId]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

#[derive(Debug, Clone)]
pub struct JaccardMatcher {
    ngram_range: (usize, usize),
    vocabulary: Vocabulary,
    /// Ascending term ids present in each document.
    doc_terms: Vec<Vec<TermId>>,
}

impl JaccardMatcher {
    /// Vocabulary follows the TF-IDF construction rules in `config`
    /// (cutoffs, n-grams); weighting options are ignored.
    pub fn build(corpus: &Corpus, config: &TfIdfConfig) -> Result<Self> {
        let Analyzed { counts, vocabulary, .. } = analyze(corpus, config)?;
        let doc_terms = counts
            .iter()
            .map(|doc| {
                let mut ids: Vec<TermId> = doc.keys().filter_map(|t| vocabulary.get(t)).collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        tracing::info!(num_docs = corpus.len(), num_terms = vocabulary.len(), "jaccard matcher built");
        Ok(Self { ngram_range: config.ngram_range, vocabulary, doc_terms })
    }

    /// Recognized query terms as ascending ids; unknown terms are dropped.
    pub fn query_terms(&self, tokens: &[String]) -> Vec<TermId> {
        let mut ids: Vec<TermId> = ngrams(tokens, self.ngram_range)
            .iter()
            .filter_map(|t| self.vocabulary.get(t))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn similarity(doc: &[TermId], query: &[TermId]) -> f64 {
        let inter = sorted_intersection(doc, query);
        let union = doc.len() + query.len() - inter;
        if union == 0 { 0.0 } else { inter as f64 / union as f64 }
    }

    pub fn score(&self, doc: usize, tokens: &[String]) -> f64 {
        match self.doc_terms.get(doc) {
            Some(terms) => Self::similarity(terms, &self.query_terms(tokens)),
            None => 0.0,
        }
    }

    pub fn search(&self, tokens: &[String], k: usize) -> Result<Ranked> {
        check_top_k(k)?;
        let query = self.query_terms(tokens);
        let scores: Vec<f64> = self.doc_terms.par_iter().map(|d| Self::similarity(d, &query)).collect();
        Ok(top_k(&scores, k))
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn num_docs(&self) -> usize { self.doc_terms.len() }
}
