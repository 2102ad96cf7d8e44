//! ragdoc CLI - ingest documents and query them
//!
//! # Commands
//!
//! ```bash
//! # Check a scraped index without touching the store
//! ragdoc validate data/search-index.json --output data/validated-index.json
//!
//! # Validate, embed and store documents
//! ragdoc ingest data/search-index.json
//!
//! # Query
//! ragdoc search "how do cats purr?" -k 3
//! ragdoc repl
//!
//! # Inspect or reset the store
//! ragdoc stats --sample 3
//! ragdoc clear
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ragdoc_lib::{
    config::Config,
    document::{load_raw_documents, Document, RankedResult},
    embed::{Embedder, FastEmbedder, HashingEmbedder},
    search::RetrievalEngine,
    store::{FileStore, VectorStore},
    validate::DocumentValidator,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Engine = RetrievalEngine<Box<dyn Embedder>, FileStore>;

#[derive(Parser)]
#[command(name = "ragdoc")]
#[command(about = "Document ingestion and similarity search")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store snapshot path (overrides the configuration)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Embedding backend
    #[arg(long, global = true, value_enum, default_value_t = EmbedderArg::Fastembed)]
    embedder: EmbedderArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EmbedderArg {
    /// Local ONNX model named by `model_name`
    Fastembed,
    /// Deterministic feature hashing, no download
    Hashing,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON array of documents and summarize the result
    Validate {
        /// Input JSON file
        input: PathBuf,

        /// Write accepted documents to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate, embed and store documents from a JSON file
    Ingest {
        /// Input JSON file
        input: PathBuf,
    },

    /// Search stored documents
    Search {
        /// Query text
        query: String,

        /// Number of results to return (defaults to the configured top-k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive search loop, `exit` to quit
    Repl {
        /// Number of results per query
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Show store statistics and a few stored records
    Stats {
        /// Number of records to show
        #[arg(long, default_value = "3")]
        sample: usize,
    },

    /// Remove every stored record
    Clear,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }
    Ok(config)
}

fn build_embedder(kind: EmbedderArg, config: &Config) -> Result<Box<dyn Embedder>> {
    Ok(match kind {
        EmbedderArg::Fastembed => {
            println!("Loading {} (first run downloads the model)...", config.model_name);
            Box::new(FastEmbedder::from_model_name(&config.model_name)?)
        }
        EmbedderArg::Hashing => Box::new(HashingEmbedder::new(config.dimension)),
    })
}

fn build_engine(kind: EmbedderArg, config: &Config) -> Result<Engine> {
    let store = FileStore::open(&config.store_path, config.dimension)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    let embedder = build_embedder(kind, config)?;
    Ok(RetrievalEngine::new(embedder, store, config)?)
}

fn preview(text: &str, max_chars: usize) -> String {
    let short: String = text.chars().take(max_chars).collect();
    let ellipsis = if text.chars().count() > max_chars { "..." } else { "" };
    format!("{short}{ellipsis}")
}

fn print_results(results: &[RankedResult]) {
    if results.is_empty() {
        println!("No documents found.");
        return;
    }

    println!("\n=== Results ===\n");
    for (i, result) in results.iter().enumerate() {
        println!("#{} (score: {:.4}) {}", i + 1, result.score, result.title);
        println!("{}", result.identity);
        println!("---");
        println!("{}\n", preview(&result.content, 300));
    }
}

fn print_validation_summary(docs: &[Document]) {
    let unique: HashSet<&str> = docs.iter().map(|d| d.identity.as_str()).collect();
    let words: usize = docs
        .iter()
        .map(|d| d.metadata.map_or(0, |m| m.word_count))
        .sum();

    println!("\n=== Validation summary ===\n");
    println!("  Documents:          {}", docs.len());
    println!("  Unique URLs:        {}", unique.len());
    if !docs.is_empty() {
        println!("  Average word count: {}", words / docs.len());
    }

    for (i, doc) in docs.iter().take(3).enumerate() {
        let first_words: Vec<&str> = doc.content.split_whitespace().take(10).collect();
        println!("\nDocument {}:", i + 1);
        println!("  Title: {}", doc.title);
        println!("  URL:   {}", doc.identity);
        println!("  Content: {}...", first_words.join(" "));
    }
}

async fn repl(engine: Arc<Engine>, k: usize) -> Result<()> {
    println!("ragdoc search, enter 'exit' to quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nquery> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim().to_string();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        let engine = Arc::clone(&engine);
        match tokio::task::spawn_blocking(move || engine.search(&query, k)).await? {
            Ok(results) => print_results(&results),
            Err(e) => println!("Error during search: {e}"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(store = %config.store_path.display(), model = %config.model_name, "configuration loaded");

    match cli.command {
        Commands::Validate { input, output } => {
            let raws = load_raw_documents(&input)?;
            let report = DocumentValidator::from_config(&config).validate_batch(&raws);

            println!(
                "Validated {} documents: {} accepted, {} rejected",
                report.total(),
                report.accepted.len(),
                report.rejected.len()
            );
            print_validation_summary(&report.accepted);

            if let Some(output) = output {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output, serde_json::to_string_pretty(&report.accepted)?)
                    .with_context(|| format!("writing {}", output.display()))?;
                println!("\nSaved {} documents to {}", report.accepted.len(), output.display());
            }
        }

        Commands::Ingest { input } => {
            let raws = load_raw_documents(&input)?;
            println!("Loaded {} records from {}", raws.len(), input.display());

            let engine = build_engine(cli.embedder, &config)?;
            let report = engine.ingest(&raws)?;

            println!("\n=== Ingestion ===\n");
            println!("  Accepted: {}", report.accepted);
            println!("  Rejected: {}", report.rejected.len());
            println!("  Inserted: {}", report.inserted);
            println!("  Replaced: {}", report.replaced);
            println!("  Skipped:  {}", report.skipped.len());
            for (index, rejection) in report.rejected.iter().take(10) {
                println!("    record {index}: {rejection}");
            }
            println!("\nStore now holds {} documents", engine.len());
        }

        Commands::Search { query, k, json } => {
            let engine = build_engine(cli.embedder, &config)?;
            let k = k.unwrap_or(engine.default_top_k());
            let results = engine.search(&query, k)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("Searching: '{query}' (k={k})");
                print_results(&results);
            }
        }

        Commands::Repl { k } => {
            let engine = build_engine(cli.embedder, &config)?;
            let k = k.unwrap_or(engine.default_top_k());
            repl(Arc::new(engine), k).await?;
        }

        Commands::Stats { sample } => {
            let store = FileStore::open(&config.store_path, config.dimension)?;

            println!("Store:      {}", store.path().display());
            println!("Documents:  {}", store.len());
            println!("Embedded:   {}", store.embedded_len());
            println!("Dimension:  {}", store.dimension());

            for doc in store.sample(sample) {
                println!("\n--- {} ---", doc.identity);
                println!("Title:   {}", doc.title);
                println!("Content: {}", preview(&doc.content, 200));
                if let Some(vector) = store.get(&doc.identity).and_then(|d| d.vector) {
                    let head: Vec<String> = vector.iter().take(8).map(|x| format!("{x:.4}")).collect();
                    println!("Vector:  [{}, ... ({} total)]", head.join(", "), vector.len());
                }
            }
        }

        Commands::Clear => {
            let store = FileStore::open(&config.store_path, config.dimension)?;
            let removed = store.clear()?;
            println!("Removed {removed} documents from {}", store.path().display());
        }
    }

    Ok(())
}
