use serde::{Deserialize, Serialize};

use crate::DocIdx;

/// A normalized document as handed over by the preprocessing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub tokens: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, tokens: Vec<String>) -> Self {
        Self { id: id.into(), tokens }
    }

    /// Build a document from already-normalized, whitespace separated text.
    pub fn from_text(id: impl Into<String>, text: &str) -> Self {
        Self::new(id, text.split_whitespace().map(str::to_string).collect())
    }
}

/// Append-only collection used while ingesting; `freeze` ends the build phase.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    docs: Vec<Document>,
}

impl CorpusBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, doc: Document) -> DocIdx {
        let idx = self.docs.len() as DocIdx;
        self.docs.push(doc);
        idx
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn freeze(self) -> Corpus {
        Corpus { docs: self.docs }
    }
}

/// Frozen, ordered corpus. Position is the internal document index.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn get(&self, idx: DocIdx) -> Option<&Document> { self.docs.get(idx as usize) }

    /// External identifier for an internal index.
    pub fn doc_id(&self, idx: DocIdx) -> Option<&str> {
        self.get(idx).map(|d| d.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> + '_ { self.docs.iter() }

    pub fn tokens(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.docs.iter().map(|d| d.tokens.as_slice())
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut builder = CorpusBuilder::new();
        for doc in iter {
            builder.push(doc);
        }
        builder.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_dense_indices() {
        let mut b = CorpusBuilder::new();
        assert_eq!(b.push(Document::from_text("a", "x y")), 0);
        assert_eq!(b.push(Document::from_text("b", "z")), 1);
        let corpus = b.freeze();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.doc_id(1), Some("b"));
        assert_eq!(corpus.doc_id(2), None);
        assert_eq!(corpus.get(0).unwrap().tokens, vec!["x", "y"]);
    }
}
