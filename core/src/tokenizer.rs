use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
pub use crate::stopwords::Language;

pub const DEFAULT_MAIN_CONTENT_SELECTOR: &str = "div.page";
pub const DEFAULT_CONTENT_SELECTOR: &str = "h1, h2, h3, p, a, em, strong";

/// Elements whose text is never visible on the rendered page.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "html", "head", "body", "title", "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li",
    "dl", "dt", "dd", "table", "thead", "tbody", "tr", "td", "th", "section", "article", "header",
    "footer", "nav", "main", "aside", "blockquote", "pre", "form", "figure", "figcaption", "address",
];

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
    static ref MAIN_CONTENT: Selector = Selector::parse(DEFAULT_MAIN_CONTENT_SELECTOR).expect("valid selector");
    static ref CONTENT: Selector = Selector::parse(DEFAULT_CONTENT_SELECTOR).expect("valid selector");
}

/// How cleaned text is split into tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segmenter {
    /// Unicode word boundaries (UAX #29).
    #[default]
    Unicode,
    Whitespace,
}

impl std::str::FromStr for Segmenter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unicode" => Ok(Segmenter::Unicode),
            "whitespace" => Ok(Segmenter::Whitespace),
            other => Err(format!("unsupported segmenter: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub language: Language,
    pub segmenter: Segmenter,
    /// Container holding the page's main content, if the markup has one.
    pub main_content_selector: String,
    /// Elements inside the main container whose text is kept.
    pub content_selector: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            segmenter: Segmenter::default(),
            main_content_selector: DEFAULT_MAIN_CONTENT_SELECTOR.to_string(),
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
        }
    }
}

/// Output of the normalization pipeline for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Cleaned text, stored on the document and used for snippets.
    pub text: String,
    /// Tokens with stopwords removed, used for postings.
    pub tokens: Vec<String>,
}

/// Turns raw page markup (or plain text) into clean text and tokens.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    main_content: Selector,
    content: Selector,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            config: NormalizerConfig::default(),
            main_content: MAIN_CONTENT.clone(),
            content: CONTENT.clone(),
        }
    }
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        let main_content = compile_selector(&config.main_content_selector)?;
        let content = compile_selector(&config.content_selector)?;
        Ok(Self { config, main_content, content })
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        let text = clean_text(&self.extract_text(raw));
        let tokens = remove_stopwords(tokenize(&text, self.config.segmenter), self.config.language);
        Normalized { text, tokens }
    }

    /// Text of the content elements inside the main container, in document
    /// order, or all visible text when the page has no main container.
    pub fn extract_text(&self, raw: &str) -> String {
        let html = Html::parse_document(raw);
        match html.select(&self.main_content).next() {
            Some(main) => main
                .select(&self.content)
                .map(|el| el.text().collect::<String>())
                .collect::<Vec<_>>()
                .join(" "),
            None => visible_text(html.root_element()),
        }
    }
}

fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text with inline markup joined as-is; a space separates text
/// from different block elements.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut last_block = None;
    for node in root.descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node.ancestors().any(|a| {
            matches!(a.value(), Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let block = node
            .ancestors()
            .find(|a| matches!(a.value(), Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name())))
            .map(|a| a.id());
        if !out.is_empty() && block != last_block {
            out.push(' ');
        }
        last_block = block;
        out.push_str(text);
    }
    out
}

/// Lowercase, turn line breaks and tabs into spaces, collapse whitespace and
/// strip every character that is neither a word character nor whitespace.
pub fn clean_text(text: &str) -> String {
    let lowered = text.nfc().collect::<String>().to_lowercase();
    let unsplit = lowered.replace(|c: char| matches!(c, '\n' | '\t' | '\r'), " ");
    let collapsed = unsplit.split_whitespace().collect::<Vec<_>>().join(" ");
    PUNCTUATION.replace_all(&collapsed, "").into_owned()
}

pub fn tokenize(text: &str, segmenter: Segmenter) -> Vec<String> {
    match segmenter {
        Segmenter::Unicode => text.unicode_words().map(str::to_owned).collect(),
        Segmenter::Whitespace => text.split_whitespace().map(str::to_owned).collect(),
    }
}

pub fn remove_stopwords(tokens: Vec<String>, language: Language) -> Vec<String> {
    tokens.into_iter().filter(|t| !language.is_stopword(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let n = Normalizer::default().normalize("Grado en Informática!");
        assert_eq!(n.text, "grado en informática");
        assert_eq!(n.tokens, vec!["grado", "informática"]);
    }

    #[test]
    fn clean_text_collapses_and_strips() {
        assert_eq!(clean_text("  Hola,\tMundo\r\n¿qué  tal?  "), "hola mundo qué tal");
    }

    #[test]
    fn punctuation_between_spaces_leaves_double_space() {
        assert_eq!(clean_text("a - b"), "a  b");
    }

    #[test]
    fn whitespace_segmenter_splits_on_spaces_only() {
        assert_eq!(tokenize("uno  dos tres", Segmenter::Whitespace), vec!["uno", "dos", "tres"]);
    }

    #[test]
    fn rejects_invalid_selector() {
        let config = NormalizerConfig { main_content_selector: "div[".into(), ..Default::default() };
        assert!(matches!(Normalizer::new(config), Err(Error::InvalidSelector { .. })));
    }
}
