//! Per-document and per-term counts backing the BM25 model.

use std::collections::HashMap;

use crate::corpus::Corpus;
use crate::vocabulary::Vocabulary;
use crate::TermId;

#[derive(Debug, Clone, Default)]
pub struct TermStats {
    pub vocabulary: Vocabulary,
    /// Sparse tf map per document; absent terms have frequency 0.
    pub doc_tf: Vec<HashMap<TermId, u32>>,
    /// Indexed by term id.
    pub df: Vec<u32>,
    pub doc_len: Vec<u32>,
    pub avg_doc_len: f64,
}

impl TermStats {
    /// Single pass over the corpus. Term ids follow first appearance, so the
    /// output only depends on the token sequences.
    pub fn build(corpus: &Corpus) -> Self {
        let mut vocabulary = Vocabulary::new();
        let mut df: Vec<u32> = Vec::new();
        let mut doc_tf = Vec::with_capacity(corpus.len());
        let mut doc_len = Vec::with_capacity(corpus.len());

        for tokens in corpus.tokens() {
            let mut tf: HashMap<TermId, u32> = HashMap::new();
            for token in tokens {
                let tid = vocabulary.intern(token);
                if df.len() <= tid as usize { df.resize(tid as usize + 1, 0); }
                let count = tf.entry(tid).or_insert(0);
                if *count == 0 {
                    df[tid as usize] += 1;
                }
                *count += 1;
            }
            doc_len.push(tokens.len() as u32);
            doc_tf.push(tf);
        }

        let total: u64 = doc_len.iter().map(|&l| l as u64).sum();
        let avg_doc_len = if doc_len.is_empty() { 0.0 } else { total as f64 / doc_len.len() as f64 };
        tracing::debug!(num_docs = doc_len.len(), num_terms = vocabulary.len(), avg_doc_len, "term statistics built");

        Self { vocabulary, doc_tf, df, doc_len, avg_doc_len }
    }

    pub fn num_docs(&self) -> usize { self.doc_len.len() }

    pub fn df(&self, term: TermId) -> u32 { self.df.get(term as usize).copied().unwrap_or(0) }

    pub fn tf(&self, doc: usize, term: TermId) -> u32 {
        self.doc_tf.get(doc).and_then(|m| m.get(&term)).copied().unwrap_or(0)
    }
}
