use anyhow::{anyhow, Context, Result};
use clap::Parser;
use reqwest::{header, Client};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Breadth-first crawl of a site into one JSON record per page")]
struct Cli {
    /// Seed URL (repeatable)
    #[arg(long = "url")]
    urls: Vec<String>,
    /// Path to a file with seed URLs (one per line)
    #[arg(long)]
    seeds: Option<String>,
    /// Output directory for {N}.json page records
    #[arg(long, default_value = "./data/pages")]
    output_folder: String,
    /// Maximum number of pages to save
    #[arg(long, default_value_t = 100)]
    max_pages: usize,
    /// Only follow links under this URL: same scheme, host and port, path
    /// starting with its path (default: root of the first seed's site)
    #[arg(long)]
    allow_prefix: Option<String>,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string
    #[arg(long, default_value = "boolsearch-bot/0.1")]
    user_agent: String,
}

#[derive(Serialize)]
struct PageRecord<'a> {
    url: &'a str,
    text: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let mut frontier: VecDeque<Url> = VecDeque::new();
    for s in &args.urls {
        if let Some(u) = parse_seed(s) { frontier.push_back(u); }
    }
    if let Some(path) = &args.seeds {
        for line in BufReader::new(File::open(path).with_context(|| format!("opening {path}"))?).lines() {
            let s = line?.trim().to_string();
            if s.is_empty() || s.starts_with('#') { continue; }
            if let Some(u) = parse_seed(&s) { frontier.push_back(u); }
        }
    }
    let first = frontier.front().cloned().ok_or_else(|| anyhow!("no valid seeds"))?;
    let scope = match &args.allow_prefix {
        Some(p) => Url::parse(p).with_context(|| format!("invalid --allow-prefix {p}"))?,
        None => first.join("/")?,
    };
    tracing::info!(seeds = frontier.len(), max_pages = args.max_pages, %scope, output = %args.output_folder, "starting crawl");

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let out_dir = PathBuf::from(&args.output_folder);
    fs::create_dir_all(&out_dir)?;
    let mut visited: HashSet<String> = HashSet::new();
    let mut saved = 0usize;

    while saved < args.max_pages {
        let Some(url) = frontier.pop_front() else { break };
        if !visited.insert(norm(&url)) { continue; }

        let body = match fetch(&client, &url).await {
            Ok(Some(body)) => body,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(%url, error = %e, "fetch failed, skipping");
                continue;
            }
        };

        saved += 1;
        save_page(&out_dir, saved, url.as_str(), &body)?;
        for link in extract_links(&url, &body, &scope) {
            if !visited.contains(&norm(&link)) { frontier.push_back(link); }
        }
        if saved % 10 == 0 {
            tracing::info!(saved, visited = visited.len(), frontier = frontier.len(), "progress");
        }
    }

    tracing::info!(saved, visited = visited.len(), frontier = frontier.len(), output = %args.output_folder, "done");
    Ok(())
}

fn parse_seed(s: &str) -> Option<Url> {
    Url::parse(s).or_else(|_| Url::parse(&format!("https://{}", s))).ok()
}

/// Body of an HTML page, `None` for non-HTML responses. HTTP errors are
/// returned to the caller, which skips the URL without retrying.
async fn fetch(client: &Client, url: &Url) -> Result<Option<String>> {
    let resp = client.get(url.clone()).send().await?.error_for_status()?;
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
        if let Ok(v) = ct.to_str() {
            if !v.starts_with("text/html") { return Ok(None); }
        }
    }
    Ok(Some(resp.text().await?))
}

fn norm(u: &Url) -> String { let mut s = u.clone(); s.set_fragment(None); s.to_string() }

/// True when `link` is on the same site as `scope` and under its path.
fn in_scope(link: &Url, scope: &Url) -> bool {
    link.scheme() == scope.scheme()
        && link.host_str() == scope.host_str()
        && link.port_or_known_default() == scope.port_or_known_default()
        && link.path().starts_with(scope.path())
}

/// Absolute http(s) links in `html` within `scope`, deduplicated, in
/// document order.
fn extract_links(base: &Url, html: &str, scope: &Url) -> Vec<Url> {
    let Ok(sel) = Selector::parse("a[href]") else { return Vec::new() };
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for a in doc.select(&sel) {
        let Some(href) = a.value().attr("href") else { continue };
        let Ok(mut u) = base.join(href) else { continue };
        u.set_fragment(None);
        if u.scheme().starts_with("http") && in_scope(&u, scope) && seen.insert(u.to_string()) {
            links.push(u);
        }
    }
    links
}

fn save_page(dir: &Path, n: usize, url: &str, text: &str) -> Result<()> {
    let path = dir.join(format!("{n}.json"));
    let mut out = BufWriter::new(File::create(&path).with_context(|| format!("creating {}", path.display()))?);
    serde_json::to_writer_pretty(&mut out, &PageRecord { url, text })?;
    out.flush()?;
    Ok(())
}
