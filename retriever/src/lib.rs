use anyhow::Result;
use axum::{extract::{Query, State}, http::StatusCode, routing::get, Json, Router};
use search_core::persist::{load, IndexPaths};
use search_core::{search_with, InvertedIndex, ParseOptions, SearchHit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Query session over one loaded index. Cloning shares the same read-only
/// index; nothing here can mutate it.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<InvertedIndex>,
    options: ParseOptions,
}

impl Retriever {
    /// Loads the persisted index at `index_dir`. Failure is fatal for the session.
    pub fn open<P: AsRef<Path>>(index_dir: P) -> search_core::Result<Self> {
        let (index, _meta) = load(&IndexPaths::new(index_dir))?;
        Ok(Self::from_index(index))
    }

    pub fn from_index(index: InvertedIndex) -> Self {
        Self { index: Arc::new(index), options: ParseOptions::default() }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn index(&self) -> &Arc<InvertedIndex> {
        &self.index
    }

    pub fn summary(&self) -> String {
        format!("Loaded index with {} documents and {} terms.", self.index.num_docs(), self.index.num_terms())
    }

    pub fn search(&self, query: &str) -> search_core::Result<Vec<SearchHit>> {
        search_with(query, &self.index, self.options)
    }

    /// Answers one query per line. Blank lines are skipped; a malformed query
    /// is reported in its outcome and a line that is not UTF-8 is logged,
    /// neither stopping the batch.
    pub fn search_lines<R: BufRead>(&self, reader: R) -> std::io::Result<BatchReport> {
        let start = Instant::now();
        let mut outcomes = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!(line = lineno + 1, error = %e, "skipping line that is not valid UTF-8");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let query = line.trim();
            if query.is_empty() { continue; }
            let hits = self.search(query);
            if let Err(e) = &hits {
                tracing::warn!(query, error = %e, "query rejected");
            }
            outcomes.push(QueryOutcome { query: query.to_string(), hits });
        }
        Ok(BatchReport { outcomes, elapsed: start.elapsed() })
    }
}

pub struct QueryOutcome {
    pub query: String,
    pub hits: search_core::Result<Vec<SearchHit>>,
}

pub struct BatchReport {
    pub outcomes: Vec<QueryOutcome>,
    pub elapsed: Duration,
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Query: {}", self.query)?;
        match &self.hits {
            Ok(hits) if hits.is_empty() => writeln!(f, "No results found."),
            Ok(hits) => hits.iter().try_for_each(|h| writeln!(f, "{h}")),
            Err(e) => writeln!(f, "Error: {e}"),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            write!(f, "{outcome}")?;
        }
        write!(f, "Time to solve {} queries: {:.4}s", self.outcomes.len(), self.elapsed.as_secs_f64())
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub no_results: bool,
    pub results: Vec<SearchHit>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let retriever = Retriever::open(&index_dir)?;
    tracing::info!("{}", retriever.summary());
    Ok(router(retriever))
}

pub fn router(retriever: Retriever) -> Router {
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
        .with_state(retriever)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(retriever): State<Retriever>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = Instant::now();
    let results = retriever.search(&params.q).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        no_results: results.is_empty(),
        results,
    }))
}
