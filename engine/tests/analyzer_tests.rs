use engine::analyzer::{analyze, analyze_with, AnalyzerOptions};

#[test]
fn it_normalizes_and_stems() {
    let words = analyze("Running Runners RUN! The café's menu.");
    assert!(words.contains(&"run".to_string()));
    // diacritics are folded away
    assert!(words.contains(&"cafe".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = analyze("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn stopwords_can_be_kept() {
    let words = analyze_with("the ocean", AnalyzerOptions { remove_stopwords: false, stem: false });
    assert_eq!(words, vec!["the", "ocean"]);
}
