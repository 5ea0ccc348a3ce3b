use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use engine::bm25::Bm25Params;
use engine::eval::{evaluate, Judgment, Qrels};
use engine::tfidf::{DfCutoff, TfIdfConfig};
use engine::{Corpus, Document, Engine, EngineConfig, Error, Model, Query};

fn corpus() -> Corpus {
    [
        Document::from_text("CF-1", "global warm caus sea level rise"),
        Document::from_text("CF-2", "arctic ice melt accelerat warm"),
        Document::from_text("CF-3", "carbon dioxid emiss fossil fuel"),
        Document::from_text("CF-4", "sea ice extent arctic record low"),
        Document::from_text("CF-5", "solar activ climat variabl"),
    ]
    .into_iter()
    .collect()
}

fn engine() -> Engine {
    Engine::build(corpus(), EngineConfig::default()).unwrap()
}

#[test]
fn every_model_returns_top_k_with_external_ids() {
    let e = engine();
    for model in Model::ALL {
        let hits = e.execute(model, &Query::from("arctic ice"), 3).unwrap();
        assert_eq!(hits.len(), 3, "{model}");
        assert!(hits[0].doc_id == "CF-2" || hits[0].doc_id == "CF-4", "{model}: {:?}", hits);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score), "{model}");
    }
}

#[test]
fn top_k_is_capped_by_corpus_size() {
    let hits = engine().execute(Model::Bm25, &Query::from("sea"), 50).unwrap();
    assert_eq!(hits.len(), 5);
}

#[test]
fn zero_top_k_is_rejected_by_every_model() {
    let e = engine();
    for model in Model::ALL {
        let err = e.execute(model, &Query::from("sea"), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidTopK(0)));
        assert!(err.is_configuration());
    }
}

#[test]
fn unknown_model_name_is_rejected() {
    let err = engine().execute_named("lsi", &Query::from("sea"), 3).unwrap_err();
    assert!(matches!(err, Error::UnknownModel(_)));
}

#[test]
fn token_and_text_queries_agree() {
    let e = engine();
    let text = e.execute(Model::TfIdf, &Query::from("carbon fuel"), 2).unwrap();
    let tokens = e
        .execute(Model::TfIdf, &Query::Tokens(vec!["carbon".into(), "fuel".into()]), 2)
        .unwrap();
    assert_eq!(text, tokens);
    assert_eq!(text[0].doc_id, "CF-3");
}

#[test]
fn self_query_ranks_document_first() {
    let c = corpus();
    let e = Engine::build(c.clone(), EngineConfig::default()).unwrap();
    for doc in c.iter() {
        let hits = e.execute(Model::TfIdf, &Query::Tokens(doc.tokens.clone()), 1).unwrap();
        assert_eq!(hits[0].doc_id, doc.id);
    }
}

#[test]
fn empty_tfidf_query_returns_index_order() {
    let hits = engine().execute(Model::TfIdf, &Query::from("unrelated words"), 2).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["CF-1", "CF-2"]);
    assert!(hits.iter().all(|h| h.score == 0.0));
}

#[test]
fn per_query_bm25_params() {
    let e = engine();
    let default = e.execute(Model::Bm25, &Query::from("warm"), 2).unwrap();
    let same = e.execute_bm25(&Query::from("warm"), 2, Bm25Params::default()).unwrap();
    assert_eq!(default, same);
    let no_norm = e.execute_bm25(&Query::from("warm"), 2, Bm25Params { k1: 1.2, b: 0.0 }).unwrap();
    // without length normalization both documents holding "warm" once tie
    assert_eq!(no_norm[0].score, no_norm[1].score);
    assert_eq!(no_norm[0].doc_id, "CF-1");
    assert!(e.execute_bm25(&Query::from("warm"), 2, Bm25Params { k1: 1.2, b: 2.0 }).is_err());
}

#[test]
fn invalid_engine_config_fails_at_build() {
    let config = EngineConfig {
        tfidf: TfIdfConfig { max_df: DfCutoff::Proportion(-0.5), ..Default::default() },
        ..Default::default()
    };
    assert!(matches!(Engine::build(corpus(), config), Err(Error::InvalidTfIdfConfig(_))));
    let config = EngineConfig { bm25: Bm25Params { k1: -1.0, b: 0.5 }, ..Default::default() };
    assert!(matches!(Engine::build(corpus(), config), Err(Error::InvalidBm25Params(_))));
}

#[test]
fn empty_corpus_is_queryable() {
    let e = Engine::build(Corpus::default(), EngineConfig::default()).unwrap();
    for model in Model::ALL {
        assert!(e.execute(model, &Query::from("anything"), 3).unwrap().is_empty());
    }
}

#[test]
fn shared_engine_serves_concurrent_queries() {
    let e = Arc::new(engine());
    let expected = e.execute(Model::Bm25, &Query::from("sea ice"), 5).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let e = Arc::clone(&e);
            thread::spawn(move || e.execute(Model::Bm25, &Query::from("sea ice"), 5).unwrap())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}

#[test]
fn batch_run_feeds_evaluation() {
    let e = engine();
    let q1 = Query::from("arctic ice");
    let q2 = Query::from("fossil fuel emiss");
    let results = e.run_batch(Model::Bm25, [("q1", &q1), ("q2", &q2)], 3).unwrap();
    let qrels: Qrels = [
        Judgment { query_id: "q1".into(), doc_id: "CF-4".into(), relevance: 1 },
        Judgment { query_id: "q1".into(), doc_id: "CF-2".into(), relevance: 1 },
        Judgment { query_id: "q2".into(), doc_id: "CF-3".into(), relevance: 2 },
    ]
    .into_iter()
    .collect();
    let report = evaluate(&results, &qrels, 2).unwrap();
    assert_eq!(report.mean_average_precision, 1.0);
    assert_eq!(report.per_query["q1"].recall_at_k, 1.0);
    assert_eq!(report.per_query["q2"].precision_at_k, 0.5);
    assert!(evaluate(&BTreeMap::new(), &qrels, 2).is_err());
}
