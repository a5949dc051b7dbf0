mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::persist::{save, IndexPaths};
use search_core::{IndexBuilder, Language, Normalizer, NormalizerConfig, Segmenter};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::Path;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a Boolean inverted index from crawled pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of crawled JSON/JSONL records
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Stopword language
        #[arg(long, default_value = "spanish")]
        language: Language,
        /// Word segmentation: unicode or whitespace
        #[arg(long, default_value = "unicode")]
        segmenter: Segmenter,
        /// CSS selector of the main content container
        #[arg(long, default_value = search_core::tokenizer::DEFAULT_MAIN_CONTENT_SELECTOR)]
        main_selector: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, language, segmenter, main_selector } => {
            let config = NormalizerConfig { language, segmenter, main_content_selector: main_selector, ..Default::default() };
            build_index(Path::new(&input), Path::new(&output), config)
        }
    }
}

fn build_index(input: &Path, output: &Path, config: NormalizerConfig) -> Result<()> {
    let normalizer = Normalizer::new(config)?;
    let mut builder = IndexBuilder::new(normalizer);

    let files = input::collect_files(input)?;
    tracing::info!(files = files.len(), input = %input.display(), "reading records");
    for file in &files {
        input::read_records(file, |doc| {
            builder.add(&doc.url, &doc.text);
        })?;
    }

    let (index, stats) = builder.finish();
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let paths = IndexPaths::new(output);
    save(&paths, &index, &created_at).with_context(|| format!("writing index to {}", output.display()))?;

    println!("{stats}");
    tracing::info!(output = %output.display(), "index saved");
    Ok(())
}
