//! File loaders for the ingestion collaborators: corpus JSONL, query TSV, qrels TSV.
//!
//! Schemas are fixed; nothing here guesses column names.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::corpus::{Corpus, CorpusBuilder, Document};
use crate::error::{Error, Result};
use crate::eval::{Judgment, Qrels};

/// Whether the first row of a TSV file is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    Present,
    #[default]
    Absent,
    /// Header iff the first row's numeric column does not parse.
    Detect,
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "present" | "yes" | "true" => Ok(HeaderMode::Present),
            "absent" | "no" | "false" => Ok(HeaderMode::Absent),
            "detect" | "auto" => Ok(HeaderMode::Detect),
            other => Err(format!("invalid header mode {other:?} (expected present, absent or detect)")),
        }
    }
}

/// One line of the corpus file. `tokens` wins over `text` when both are set.
#[derive(Debug, Deserialize)]
struct CorpusRecord {
    id: String,
    #[serde(default)]
    tokens: Option<Vec<String>>,
    #[serde(default)]
    text: Option<String>,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn parse_error(source: &str, line: usize, message: impl Into<String>) -> Error {
    Error::Parse { path: source.to_string(), line, message: message.into() }
}

pub fn read_corpus<R: BufRead>(reader: R, source: &str) -> Result<Corpus> {
    let mut builder = CorpusBuilder::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let record: CorpusRecord = serde_json::from_str(&line).map_err(|e| parse_error(source, i + 1, e.to_string()))?;
        if !seen.insert(record.id.clone()) {
            return Err(parse_error(source, i + 1, format!("duplicate document id {:?}", record.id)));
        }
        let doc = match (record.tokens, record.text) {
            (Some(tokens), _) => Document::new(record.id, tokens),
            (None, Some(text)) => Document::from_text(record.id, &text),
            (None, None) => return Err(parse_error(source, i + 1, "record has neither `tokens` nor `text`")),
        };
        builder.push(doc);
    }
    tracing::info!(source, num_docs = builder.len(), "corpus loaded");
    Ok(builder.freeze())
}

pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    read_corpus(open(path)?, &path.display().to_string())
}

/// `query_id<TAB>text` rows. Unlike qrels, a malformed query row is an error.
pub fn read_queries<R: BufRead>(reader: R, header: bool, source: &str) -> Result<Vec<(String, String)>> {
    let mut queries = Vec::new();
    let mut skip_header = header;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        if std::mem::replace(&mut skip_header, false) { continue; }
        let (qid, text) = line
            .split_once('\t')
            .ok_or_else(|| parse_error(source, i + 1, "expected `query_id<TAB>text`"))?;
        queries.push((qid.trim().to_string(), text.trim().to_string()));
    }
    tracing::info!(source, num_queries = queries.len(), "queries loaded");
    Ok(queries)
}

pub fn load_queries<P: AsRef<Path>>(path: P, header: bool) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    read_queries(open(path)?, header, &path.display().to_string())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QrelsLoadStats {
    pub kept: usize,
    pub dropped: usize,
    pub header_skipped: bool,
}

fn parse_judgment(line: &str) -> Option<Judgment> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    let [query_id, _iteration, doc_id, relevance] = fields.as_slice() else {
        return None;
    };
    let relevance = relevance.parse::<i32>().ok()?;
    Some(Judgment { query_id: query_id.to_string(), doc_id: doc_id.to_string(), relevance })
}

/// `query_id, iteration, doc_id, relevance` rows. Rows with the wrong shape or
/// a non-integer grade are dropped and counted, never fatal.
pub fn read_qrels<R: BufRead>(reader: R, header: HeaderMode, source: &str) -> Result<(Qrels, QrelsLoadStats)> {
    let mut qrels = Qrels::new();
    let mut stats = QrelsLoadStats::default();
    let mut first = true;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let is_first = std::mem::replace(&mut first, false);
        let parsed = parse_judgment(&line);
        if is_first {
            let skip = match header {
                HeaderMode::Present => true,
                HeaderMode::Absent => false,
                HeaderMode::Detect => parsed.is_none(),
            };
            if skip {
                stats.header_skipped = true;
                continue;
            }
        }
        match parsed {
            Some(j) => {
                qrels.insert(j);
                stats.kept += 1;
            }
            None => {
                tracing::debug!(source, line = i + 1, "dropping malformed qrels row");
                stats.dropped += 1;
            }
        }
    }
    tracing::info!(source, kept = stats.kept, dropped = stats.dropped, queries = qrels.num_queries(), "qrels loaded");
    Ok((qrels, stats))
}

pub fn load_qrels<P: AsRef<Path>>(path: P, header: HeaderMode) -> Result<(Qrels, QrelsLoadStats)> {
    let path = path.as_ref();
    read_qrels(open(path)?, header, &path.display().to_string())
}
