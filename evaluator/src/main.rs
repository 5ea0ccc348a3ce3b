use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engine::analyzer::analyze;
use engine::eval::{evaluate, EvaluationReport};
use engine::load::{load_corpus, load_qrels, load_queries, HeaderMode};
use engine::{Engine, EngineConfig, Model, Query};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "evaluator")]
#[command(about = "Rank a corpus with TF-IDF, BM25 or Jaccard and score runs against qrels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Corpus JSONL file ({"id", "tokens"} or {"id", "text"} per line)
    #[arg(long)]
    corpus: String,
    /// Optional engine configuration (JSON)
    #[arg(long)]
    config: Option<String>,
    /// Override BM25 k1
    #[arg(long)]
    k1: Option<f64>,
    /// Override BM25 b
    #[arg(long)]
    b: Option<f64>,
    /// Treat query text as already normalized (whitespace split only)
    #[arg(long, default_value_t = false)]
    raw: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query and print the ranked documents
    Search {
        #[command(flatten)]
        engine: EngineArgs,
        /// Ranking model: tfidf, bm25 or jaccard
        #[arg(long, default_value = "tfidf")]
        model: String,
        /// Number of results
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Query text
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Run a query set and report P@k, R@k, AP and MAP
    Evaluate {
        #[command(flatten)]
        engine: EngineArgs,
        /// Ranking model: tfidf, bm25 or jaccard
        #[arg(long, default_value = "tfidf")]
        model: String,
        /// Query TSV (query_id<TAB>text)
        #[arg(long)]
        queries: String,
        /// The query file starts with a header row
        #[arg(long, default_value_t = false)]
        queries_header: bool,
        /// Qrels TSV (query_id, iteration, doc_id, relevance)
        #[arg(long)]
        qrels: String,
        /// Header handling for the qrels file: present, absent or detect
        #[arg(long, default_value = "detect")]
        qrels_header: HeaderMode,
        /// Cutoff for precision and recall
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Ranking depth used for average precision
        #[arg(long, default_value_t = 100)]
        depth: usize,
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { engine, model, k, query } => search(&engine, &model, k, &query.join(" ")),
        Commands::Evaluate { engine, model, queries, queries_header, qrels, qrels_header, k, depth, json } => {
            run_evaluation(&engine, &model, &queries, queries_header, &qrels, qrels_header, k, depth, json)
        }
    }
}

fn load_config(args: &EngineArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))?
        }
        None => EngineConfig::default(),
    };
    if let Some(k1) = args.k1 { config.bm25.k1 = k1; }
    if let Some(b) = args.b { config.bm25.b = b; }
    Ok(config)
}

fn build_engine(args: &EngineArgs) -> Result<Engine> {
    let config = load_config(args)?;
    let corpus = load_corpus(&args.corpus).with_context(|| format!("loading corpus {}", args.corpus))?;
    let start = Instant::now();
    let engine = Engine::build(corpus, config)?;
    tracing::info!(took_s = start.elapsed().as_secs_f64(), "indexes built");
    Ok(engine)
}

fn to_query(text: &str, raw: bool) -> Query {
    if raw { Query::Text(text.to_string()) } else { Query::Tokens(analyze(text)) }
}

fn search(args: &EngineArgs, model: &str, k: usize, text: &str) -> Result<()> {
    let model: Model = model.parse()?;
    let engine = build_engine(args)?;
    let query = to_query(text, args.raw);
    let hits = engine.execute(model, &query, k)?;
    println!("{:>4}  {:<24}  {:>10}", "rank", "doc_id", model.as_str());
    for (rank, hit) in hits.iter().enumerate() {
        println!("{:>4}  {:<24}  {:>10.6}", rank + 1, hit.doc_id, hit.score);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_evaluation(
    args: &EngineArgs,
    model: &str,
    queries_path: &str,
    queries_header: bool,
    qrels_path: &str,
    qrels_header: HeaderMode,
    k: usize,
    depth: usize,
    json: bool,
) -> Result<()> {
    let model: Model = model.parse()?;
    let engine = build_engine(args)?;
    let queries = load_queries(queries_path, queries_header).with_context(|| format!("loading queries {queries_path}"))?;
    let (qrels, stats) = load_qrels(qrels_path, qrels_header).with_context(|| format!("loading qrels {qrels_path}"))?;
    if stats.dropped > 0 {
        tracing::warn!(dropped = stats.dropped, "ignored malformed qrels rows");
    }

    let queries: Vec<(String, Query)> = queries.into_iter().map(|(id, text)| (id, to_query(&text, args.raw))).collect();
    let start = Instant::now();
    let results = engine.run_batch(model, queries.iter().map(|(id, q)| (id.as_str(), q)), depth.max(k))?;
    tracing::info!(num_queries = results.len(), took_s = start.elapsed().as_secs_f64(), %model, "queries executed");

    let report = evaluate(&results, &qrels, k)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(model, &report);
    }
    Ok(())
}

fn print_report(model: Model, report: &EvaluationReport) {
    let k = report.k;
    println!("model: {model}");
    println!("{:<16}  {:>8}  {:>8}  {:>8}  {:>5}", "query_id", format!("P@{k}"), format!("R@{k}"), "AP", "rel");
    for (qid, m) in &report.per_query {
        println!(
            "{:<16}  {:>8.4}  {:>8.4}  {:>8.4}  {:>5}",
            qid, m.precision_at_k, m.recall_at_k, m.average_precision, m.num_relevant
        );
    }
    println!("mean P@{k}: {:.4}", report.mean_precision_at_k);
    println!("mean R@{k}: {:.4}", report.mean_recall_at_k);
    println!("MAP:       {:.4}", report.mean_average_precision);
}
