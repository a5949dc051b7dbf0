use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use retriever::{router, Retriever};
use search_core::ParseOptions;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "retriever")]
#[command(about = "Answer Boolean queries (AND / OR / NOT, left to right) against a built index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Lowercase query terms before lookup
    #[arg(long, default_value_t = false)]
    lowercase: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Query string, e.g. "grado AND NOT master"
        #[arg(long)]
        query: String,
    },
    /// Answer one query per line of a file
    Batch {
        #[command(flatten)]
        index: IndexArgs,
        /// File with one query per line
        #[arg(long)]
        queries: String,
    },
    /// Serve queries over HTTP
    Serve {
        #[command(flatten)]
        index: IndexArgs,
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn open(args: &IndexArgs) -> Result<Retriever> {
    let retriever = Retriever::open(&args.index)
        .with_context(|| format!("loading index from {}", args.index))?
        .with_options(ParseOptions { lowercase_terms: args.lowercase });
    println!("{}", retriever.summary());
    Ok(retriever)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { index, query } => {
            let retriever = open(&index)?;
            let hits = retriever.search(&query)?;
            if hits.is_empty() {
                println!("No results found.");
            }
            for hit in hits {
                println!("{hit}");
            }
        }
        Commands::Batch { index, queries } => {
            let retriever = open(&index)?;
            let file = File::open(&queries).with_context(|| format!("opening {queries}"))?;
            let report = retriever.search_lines(BufReader::new(file))?;
            println!("{report}");
        }
        Commands::Serve { index, host, port } => {
            let app = router(open(&index)?);
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
