//! Query-side text normalization used by the front ends.
//!
//! The scoring models never call this: they consume tokens as given. It exists
//! so a raw user query can be reduced to the same token shape the corpus was
//! preprocessed into (lowercase ASCII words, no stopwords, stemmed).

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref URL: Regex = Regex::new(r"https?://\S+").expect("valid regex");
    static ref WORD: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","could","did","do","does","doing","don","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself","just",
            "me","more","most","my","myself",
            "no","nor","not","now","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","will","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyzerOptions {
    pub remove_stopwords: bool,
    pub stem: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self { remove_stopwords: true, stem: true }
    }
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Strip diacritics, lowercase, drop URLs and anything that is not `[a-z0-9]`.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkd().filter(|c| c.is_ascii()).collect::<String>().to_lowercase();
    URL.replace_all(&folded, " ").into_owned()
}

pub fn analyze_with(text: &str, options: AnalyzerOptions) -> Vec<String> {
    let normalized = normalize(text);
    WORD.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|t| t.len() > 1)
        .filter(|t| !(options.remove_stopwords && is_stopword(t)))
        .map(|t| if options.stem { STEMMER.stem(t).into_owned() } else { t.to_string() })
        .collect()
}

/// Default pipeline: stopword removal and English stemming.
pub fn analyze(text: &str) -> Vec<String> {
    analyze_with(text, AnalyzerOptions::default())
}
