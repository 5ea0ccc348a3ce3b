use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use engine::analyzer::analyze;
use engine::load::load_corpus;
use engine::{Engine, EngineConfig, Model};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upper bound on `k` per request.
pub const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Skip query analysis; the text is already normalized.
    #[serde(default)]
    pub raw: bool,
}
fn default_model() -> String { Model::TfIdf.as_str().to_string() }
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub tokens: Vec<String>,
    pub model: Model,
    pub took_s: f64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: String,
    pub score: f64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// External document id -> corpus position.
    pub positions: Arc<HashMap<String, u32>>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        let positions = engine
            .corpus()
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i as u32))
            .collect();
        Self { engine, positions: Arc::new(positions) }
    }
}

/// Load the corpus, build every index once, and wire the routes.
pub fn build_app(corpus_path: &str, config: EngineConfig) -> Result<Router> {
    let corpus = load_corpus(corpus_path)?;
    let engine = Engine::build(corpus, config)?;
    Ok(router(Arc::new(engine)))
}

pub fn router(engine: Arc<Engine>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState::new(engine))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn bad_request(err: engine::Error) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let model: Model = params.model.parse().map_err(bad_request)?;
    let tokens = if params.raw {
        params.q.split_whitespace().map(str::to_string).collect()
    } else {
        analyze(&params.q)
    };
    let query = engine::Query::Tokens(tokens.clone());
    let hits = state.engine.execute(model, &query, params.k.min(MAX_K)).map_err(bad_request)?;

    let results = hits
        .into_iter()
        .enumerate()
        .map(|(i, h)| SearchHit { rank: i + 1, doc_id: h.doc_id, score: h.score })
        .collect();
    let elapsed = start.elapsed();
    tracing::debug!(%model, k = params.k, took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse { query: params.q, tokens, model, took_s: elapsed.as_secs_f64(), results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let doc = state
        .positions
        .get(&doc_id)
        .and_then(|&idx| state.engine.corpus().get(idx))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("document {doc_id} not found")))?;
    Ok(Json(serde_json::json!({
        "doc_id": doc.id,
        "tokens": doc.tokens,
    })))
}
