//! Ranking-quality metrics against relevance judgments.
//!
//! All functions are pure and model agnostic: they only see ranked document
//! identifiers and the set of identifiers judged relevant for the query.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::{Error, Result};

/// One qrels row. Grades `<= 0` mean "not relevant".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub query_id: String,
    pub doc_id: String,
    pub relevance: i32,
}

/// Relevant document ids per query. Built once, read many times.
#[derive(Debug, Clone, Default)]
pub struct Qrels {
    relevant: HashMap<String, HashSet<String>>,
    judged_queries: HashSet<String>,
}

impl Qrels {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, judgment: Judgment) {
        self.judged_queries.insert(judgment.query_id.clone());
        if judgment.relevance > 0 {
            self.relevant.entry(judgment.query_id).or_default().insert(judgment.doc_id);
        }
    }

    /// Relevant ids for `query_id`, if any were judged relevant.
    pub fn relevant(&self, query_id: &str) -> Option<&HashSet<String>> { self.relevant.get(query_id) }

    /// Queries with at least one judgment row, relevant or not.
    pub fn num_queries(&self) -> usize { self.judged_queries.len() }

    pub fn is_judged(&self, query_id: &str) -> bool { self.judged_queries.contains(query_id) }
}

impl FromIterator<Judgment> for Qrels {
    fn from_iter<I: IntoIterator<Item = Judgment>>(iter: I) -> Self {
        let mut qrels = Qrels::new();
        for j in iter {
            qrels.insert(j);
        }
        qrels
    }
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidCutoff(k));
    }
    Ok(())
}

fn hits_at<S: AsRef<str>>(retrieved: &[S], relevant: &HashSet<String>, k: usize) -> usize {
    let mut seen = HashSet::new();
    retrieved
        .iter()
        .take(k)
        .map(|d| d.as_ref())
        .filter(|d| seen.insert(*d) && relevant.contains(*d))
        .count()
}

/// Share of the first `k` slots holding a relevant document. The denominator
/// is `k` even when fewer than `k` documents were retrieved.
pub fn precision_at_k<S: AsRef<str>>(retrieved: &[S], relevant: &HashSet<String>, k: usize) -> Result<f64> {
    check_k(k)?;
    Ok(hits_at(retrieved, relevant, k) as f64 / k as f64)
}

/// Share of the relevant set found in the first `k` slots; 0 when nothing is relevant.
pub fn recall_at_k<S: AsRef<str>>(retrieved: &[S], relevant: &HashSet<String>, k: usize) -> Result<f64> {
    check_k(k)?;
    if relevant.is_empty() {
        return Ok(0.0);
    }
    Ok(hits_at(retrieved, relevant, k) as f64 / relevant.len() as f64)
}

/// Mean of the precision values at each rank holding a relevant document.
/// 0 when no relevant document was retrieved.
pub fn average_precision<S: AsRef<str>>(retrieved: &[S], relevant: &HashSet<String>) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, doc) in retrieved.iter().enumerate() {
        if relevant.contains(doc.as_ref()) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 { 0.0 } else { sum / hits as f64 }
}

/// Mean of [`average_precision`] over every query in `results`.
/// Queries missing from `qrels` count with an empty relevant set.
pub fn mean_average_precision(results: &BTreeMap<String, Vec<String>>, qrels: &Qrels) -> Result<f64> {
    if results.is_empty() {
        return Err(Error::NoQueries);
    }
    let empty = HashSet::new();
    let total: f64 = results
        .iter()
        .map(|(qid, retrieved)| average_precision(retrieved, qrels.relevant(qid).unwrap_or(&empty)))
        .sum();
    Ok(total / results.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub average_precision: f64,
    pub num_relevant: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub per_query: BTreeMap<String, QueryMetrics>,
    pub mean_precision_at_k: f64,
    pub mean_recall_at_k: f64,
    pub mean_average_precision: f64,
}

pub fn evaluate(results: &BTreeMap<String, Vec<String>>, qrels: &Qrels, k: usize) -> Result<EvaluationReport> {
    check_k(k)?;
    let mean_average_precision = mean_average_precision(results, qrels)?;

    let empty = HashSet::new();
    let mut per_query = BTreeMap::new();
    for (qid, retrieved) in results {
        if !qrels.is_judged(qid) {
            tracing::debug!(query_id = %qid, "query has no judgments");
        }
        let relevant = qrels.relevant(qid).unwrap_or(&empty);
        let metrics = QueryMetrics {
            precision_at_k: precision_at_k(retrieved, relevant, k)?,
            recall_at_k: recall_at_k(retrieved, relevant, k)?,
            average_precision: average_precision(retrieved, relevant),
            num_relevant: relevant.len(),
        };
        per_query.insert(qid.clone(), metrics);
    }

    let n = per_query.len() as f64;
    let mean_precision_at_k = per_query.values().map(|m| m.precision_at_k).sum::<f64>() / n;
    let mean_recall_at_k = per_query.values().map(|m| m.recall_at_k).sum::<f64>() / n;
    Ok(EvaluationReport { k, per_query, mean_precision_at_k, mean_recall_at_k, mean_average_precision })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(ids: &[&str]) -> HashSet<String> { ids.iter().map(|s| s.to_string()).collect() }

    fn judgment(q: &str, d: &str, r: i32) -> Judgment {
        Judgment { query_id: q.into(), doc_id: d.into(), relevance: r }
    }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-12 }

    #[test]
    fn precision_two_of_three() {
        let p = precision_at_k(&["d1", "d2", "d3"], &rel(&["d1", "d3"]), 3).unwrap();
        assert!(close(p, 2.0 / 3.0));
    }

    #[test]
    fn precision_divides_by_k_not_by_retrieved() {
        let p = precision_at_k(&["d1"], &rel(&["d1"]), 4).unwrap();
        assert!(close(p, 0.25));
    }

    #[test]
    fn precision_rejects_zero_k() {
        assert!(matches!(precision_at_k(&["d1"], &rel(&["d1"]), 0), Err(Error::InvalidCutoff(0))));
    }

    #[test]
    fn precision_stays_in_unit_interval() {
        let retrieved = ["a", "b", "a", "c", "d"];
        let relevant = rel(&["a", "c"]);
        for k in 1..10 {
            let p = precision_at_k(&retrieved, &relevant, k).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn recall_rejects_zero_k() {
        assert!(matches!(recall_at_k(&["d1"], &rel(&["d1"]), 0), Err(Error::InvalidCutoff(0))));
    }

    #[test]
    fn recall_with_nothing_relevant_is_zero() {
        assert_eq!(recall_at_k(&["d1", "d2"], &rel(&[]), 2).unwrap(), 0.0);
    }

    #[test]
    fn recall_is_monotone_in_k() {
        let retrieved = ["x", "d1", "y", "d3", "d1", "z"];
        let relevant = rel(&["d1", "d3", "d9"]);
        let mut prev = 0.0;
        for k in 1..=8 {
            let r = recall_at_k(&retrieved, &relevant, k).unwrap();
            assert!(r >= prev);
            prev = r;
        }
        assert!(close(prev, 2.0 / 3.0));
    }

    #[test]
    fn average_precision_seven_twelfths() {
        let ap = average_precision(&["d2", "d1", "d3"], &rel(&["d1", "d3"]));
        assert!(close(ap, 7.0 / 12.0));
    }

    #[test]
    fn average_precision_without_hits_is_zero() {
        assert_eq!(average_precision(&["a", "b"], &rel(&["c"])), 0.0);
        assert_eq!(average_precision::<&str>(&[], &rel(&["c"])), 0.0);
    }

    #[test]
    fn map_single_query() {
        let results = BTreeMap::from([("q1".to_string(), vec!["d1".to_string(), "d2".to_string()])]);
        let qrels: Qrels = [judgment("q1", "d1", 1), judgment("q1", "d2", 0)].into_iter().collect();
        assert!(close(mean_average_precision(&results, &qrels).unwrap(), 1.0));
    }

    #[test]
    fn map_counts_unjudged_queries_as_zero() {
        let results = BTreeMap::from([
            ("q1".to_string(), vec!["d1".to_string()]),
            ("q2".to_string(), vec!["d1".to_string()]),
        ]);
        let qrels: Qrels = [judgment("q1", "d1", 2)].into_iter().collect();
        assert!(close(mean_average_precision(&results, &qrels).unwrap(), 0.5));
    }

    #[test]
    fn map_without_queries_is_an_error() {
        assert!(matches!(mean_average_precision(&BTreeMap::new(), &Qrels::new()), Err(Error::NoQueries)));
    }

    #[test]
    fn non_positive_grades_are_not_relevant() {
        let qrels: Qrels = [judgment("q", "a", 0), judgment("q", "b", -1), judgment("q", "c", 3)].into_iter().collect();
        assert_eq!(qrels.relevant("q").unwrap(), &rel(&["c"]));
        assert!(qrels.is_judged("q"));
        assert_eq!(qrels.num_queries(), 1);
    }

    #[test]
    fn report_aggregates_per_query_metrics() {
        let results = BTreeMap::from([
            ("q1".to_string(), vec!["d2".to_string(), "d1".to_string(), "d3".to_string()]),
            ("q2".to_string(), vec!["d4".to_string(), "d5".to_string()]),
        ]);
        let qrels: Qrels = [judgment("q1", "d1", 1), judgment("q1", "d3", 1), judgment("q2", "d4", 1)]
            .into_iter()
            .collect();
        let report = evaluate(&results, &qrels, 2).unwrap();
        let q1 = &report.per_query["q1"];
        assert!(close(q1.precision_at_k, 0.5));
        assert!(close(q1.recall_at_k, 0.5));
        assert!(close(q1.average_precision, 7.0 / 12.0));
        let q2 = &report.per_query["q2"];
        assert!(close(q2.precision_at_k, 0.5));
        assert!(close(q2.recall_at_k, 1.0));
        assert!(close(report.mean_average_precision, (7.0 / 12.0 + 1.0) / 2.0));
        assert!(close(report.mean_precision_at_k, 0.5));
        assert!(close(report.mean_recall_at_k, 0.75));
    }

    #[test]
    fn report_rejects_zero_k() {
        let results = BTreeMap::from([("q1".to_string(), vec!["d1".to_string()])]);
        let qrels: Qrels = [judgment("q1", "d1", 1)].into_iter().collect();
        assert!(matches!(evaluate(&results, &qrels, 0), Err(Error::InvalidCutoff(0))));
    }
}
