use crate::error::{Error, Result};
use crate::DocIdx;

/// (document index, score), best first.
pub type Ranked = Vec<(DocIdx, f64)>;

pub(crate) fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(Error::InvalidTopK(top_k));
    }
    Ok(())
}

/// Turn a dense score slice (one slot per document) into the top `k` hits.
/// Deterministic: score desc, then index asc.
pub fn top_k(scores: &[f64], k: usize) -> Ranked {
    let mut ranked: Ranked = scores.iter().enumerate().map(|(i, &s)| (i as DocIdx, s)).collect();
    ranked.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_keep_index_order() {
        let ranked = top_k(&[0.5, 0.9, 0.5, 0.0, 0.9], 4);
        assert_eq!(ranked, vec![(1, 0.9), (4, 0.9), (0, 0.5), (2, 0.5)]);
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        assert_eq!(top_k(&[0.0, 0.0], 10), vec![(0, 0.0), (1, 0.0)]);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(matches!(check_top_k(0), Err(Error::InvalidTopK(0))));
        assert!(check_top_k(1).is_ok());
    }
}
