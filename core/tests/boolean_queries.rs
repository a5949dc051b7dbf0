use search_core::{search, search_with, Error, IndexBuilder, InvertedIndex, Normalizer, ParseOptions, SNIPPET_CHARS};

fn two_doc_index() -> InvertedIndex {
    let docs = [
        ("https://example.edu/grado", "grado en informatica"),
        ("https://example.edu/master", "master en informatica"),
    ];
    IndexBuilder::build(Normalizer::default(), docs).0
}

fn urls(query: &str, index: &InvertedIndex) -> Vec<String> {
    search(query, index).unwrap().into_iter().map(|h| h.url).collect()
}

#[test]
fn single_term_matches_both_documents_in_order() {
    let index = two_doc_index();
    assert_eq!(urls("informatica", &index), vec!["https://example.edu/grado", "https://example.edu/master"]);
}

#[test]
fn and_narrows_to_common_documents() {
    assert_eq!(urls("grado AND informatica", &two_doc_index()), vec!["https://example.edu/grado"]);
}

#[test]
fn or_widens_to_either_document() {
    assert_eq!(urls("grado OR master", &two_doc_index()), vec!["https://example.edu/grado", "https://example.edu/master"]);
}

#[test]
fn not_excludes_documents() {
    assert_eq!(urls("informatica NOT master", &two_doc_index()), vec!["https://example.edu/grado"]);
}

#[test]
fn leading_not_is_the_complement() {
    assert_eq!(urls("NOT grado", &two_doc_index()), vec!["https://example.edu/master"]);
}

#[test]
fn adjacent_bare_terms_are_ored() {
    assert_eq!(urls("grado master", &two_doc_index()).len(), 2);
}

#[test]
fn evaluation_is_left_to_right_without_precedence() {
    let docs = [("a", "grado"), ("b", "master"), ("c", "docencia"), ("d", "grado docencia")];
    let (index, _) = IndexBuilder::build(Normalizer::default(), docs);
    // ((grado AND NOT docencia) OR master), not grado AND NOT (docencia OR master)
    assert_eq!(urls("grado AND NOT docencia OR master", &index), vec!["a", "b"]);
    // (grado OR master) AND docencia
    assert_eq!(urls("grado master AND docencia", &index), vec!["d"]);
}

#[test]
fn unknown_term_yields_no_results() {
    assert!(search("nosuchterm", &two_doc_index()).unwrap().is_empty());
    assert!(search("nosuchterm AND grado", &two_doc_index()).unwrap().is_empty());
}

#[test]
fn unknown_term_or_known_term_keeps_known_matches() {
    assert_eq!(urls("nosuchterm OR grado", &two_doc_index()), vec!["https://example.edu/grado"]);
}

#[test]
fn empty_query_yields_no_results() {
    assert!(search("", &two_doc_index()).unwrap().is_empty());
}

#[test]
fn dangling_operator_is_a_parse_error() {
    let err = search("grado AND", &two_doc_index()).unwrap_err();
    assert!(matches!(err, Error::DanglingOperator { ref operator, position: 1 } if operator == "AND"));
    assert!(err.to_string().contains("AND"));
}

#[test]
fn terms_are_matched_as_given_unless_lowercasing_is_requested() {
    let index = two_doc_index();
    assert!(search("Grado", &index).unwrap().is_empty());
    let hits = search_with("Grado", &index, ParseOptions { lowercase_terms: true }).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn stopwords_are_not_searchable() {
    assert!(search("en", &two_doc_index()).unwrap().is_empty());
}

#[test]
fn hits_carry_truncated_snippets() {
    let long = "informatica ".repeat(40);
    let (index, _) = IndexBuilder::build(Normalizer::default(), [("long", long.as_str())]);
    let hits = search("informatica", &index).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].snippet.chars().count(), SNIPPET_CHARS);
    assert!(index.document(0).unwrap().text.starts_with(&hits[0].snippet));
    assert_eq!(hits[0].to_string(), format!("long -> {}", hits[0].snippet));
}

#[test]
fn word_split_by_inline_markup_is_searchable() {
    let docs = [("https://example.edu/aplicada", "<p>In<b>formática</b> aplicada</p>")];
    let (index, _) = IndexBuilder::build(Normalizer::default(), docs);
    assert_eq!(urls("informática", &index), vec!["https://example.edu/aplicada"]);
}
