//! Boolean query parsing and evaluation.
//!
//! Queries are whitespace-delimited. The uppercase tokens `AND`, `OR` and
//! `NOT` are operators; anything else is a term. Evaluation is a strict
//! left-to-right fold with no precedence, and adjacent bare terms are OR'd:
//! `grado master AND informatica` means `(grado OR master) AND informatica`.

use std::borrow::Cow;

use crate::document::SearchHit;
use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::postings::PostingList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    And,
    Or,
    Not,
}

impl Keyword {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(Keyword::And),
            "OR" => Some(Keyword::Or),
            "NOT" => Some(Keyword::Not),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Lowercase terms before lookup. Operators are recognized first, so
    /// this never turns a term into an operator or back.
    pub lowercase_terms: bool,
}

impl ParseOptions {
    fn term(&self, token: &str) -> String {
        if self.lowercase_terms { token.to_lowercase() } else { token.to_string() }
    }
}

/// Right-hand side of `AND` / `OR`, optionally `NOT`-prefixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub term: String,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A bare term: starts the result or is OR'd into it.
    Term(String),
    And(Operand),
    Or(Operand),
    /// `NOT t`: starts the result with the complement or is AND'd with it.
    Not(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

pub fn parse_query(query: &str) -> Result<Query> {
    parse_query_with(query, ParseOptions::default())
}

pub fn parse_query_with(query: &str, options: ParseOptions) -> Result<Query> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let mut clauses = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match Keyword::parse(tokens[i]) {
            None => {
                clauses.push(Clause::Term(options.term(tokens[i])));
                i += 1;
            }
            Some(Keyword::Not) => {
                clauses.push(Clause::Not(expect_term(&tokens, i, options)?));
                i += 2;
            }
            Some(op) => {
                let negated = tokens.get(i + 1).copied().and_then(Keyword::parse) == Some(Keyword::Not);
                let term = if negated { expect_term(&tokens, i + 1, options)? } else { expect_term(&tokens, i, options)? };
                let operand = Operand { term, negated };
                clauses.push(if op == Keyword::And { Clause::And(operand) } else { Clause::Or(operand) });
                i += if negated { 3 } else { 2 };
            }
        }
    }
    Ok(Query { clauses })
}

/// The term following the operator at `op_pos`.
fn expect_term(tokens: &[&str], op_pos: usize, options: ParseOptions) -> Result<String> {
    let operator = tokens[op_pos];
    match tokens.get(op_pos + 1) {
        None => Err(Error::DanglingOperator { operator: operator.to_string(), position: op_pos }),
        Some(next) if Keyword::parse(next).is_some() => Err(Error::UnexpectedOperator {
            operator: operator.to_string(),
            found: next.to_string(),
            position: op_pos + 1,
        }),
        Some(next) => Ok(options.term(next)),
    }
}

fn postings<'a>(index: &'a InvertedIndex, term: &str) -> Cow<'a, PostingList> {
    match index.postings(term) {
        Some(list) => Cow::Borrowed(list),
        None => Cow::Owned(PostingList::new()),
    }
}

fn resolve<'a>(index: &'a InvertedIndex, operand: &Operand) -> Cow<'a, PostingList> {
    let list = postings(index, &operand.term);
    if operand.negated {
        Cow::Owned(list.complement(index.num_docs()))
    } else {
        list
    }
}

/// Folds the clauses left to right into the matching document ids.
pub fn evaluate(query: &Query, index: &InvertedIndex) -> PostingList {
    let mut acc: Option<PostingList> = None;
    for clause in &query.clauses {
        let next = match (clause, acc.take()) {
            (Clause::Term(t), None) => postings(index, t).into_owned(),
            (Clause::Term(t), Some(a)) => a.union(&postings(index, t)),
            // Nothing to intersect with yet.
            (Clause::And(_), None) => PostingList::new(),
            (Clause::And(op), Some(a)) => a.intersect(&resolve(index, op)),
            (Clause::Or(op), None) => resolve(index, op).into_owned(),
            (Clause::Or(op), Some(a)) => a.union(&resolve(index, op)),
            (Clause::Not(t), None) => postings(index, t).complement(index.num_docs()),
            (Clause::Not(t), Some(a)) => a.intersect(&postings(index, t).complement(index.num_docs())),
        };
        acc = Some(next);
    }
    acc.unwrap_or_default()
}

pub fn search(query: &str, index: &InvertedIndex) -> Result<Vec<SearchHit>> {
    search_with(query, index, ParseOptions::default())
}

/// Parses, evaluates and materializes hits in ascending document order.
pub fn search_with(query: &str, index: &InvertedIndex, options: ParseOptions) -> Result<Vec<SearchHit>> {
    let parsed = parse_query_with(query, options)?;
    let ids = evaluate(&parsed, index);
    Ok(ids.iter().filter_map(|id| index.document(id)).map(SearchHit::from_document).collect())
}
