use anyhow::{Context, Result};
use cinematch_core::config::{IdfScheme, IndexConfig, SourceColumns, TokenPattern, TokenizerConfig, DEFAULT_TOP_N};
use cinematch_core::corpus;
use cinematch_core::persist::{load_index, save_index, IndexPaths};
use cinematch_core::{ReadyIndex, Recommender};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query TF-IDF item similarity snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a snapshot from a CSV/JSON/JSONL file or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output snapshot directory
        #[arg(long)]
        output: PathBuf,
        /// IDF variant: smooth, plain or unsmoothed
        #[arg(long, default_value = "smooth")]
        idf: IdfScheme,
        /// Use 1 + ln(tf) instead of the raw term count
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
        /// Apply English stemming to descriptor terms
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Token rule: word (letters, digits, underscore) or letter (letter-led, apostrophes kept)
        #[arg(long, default_value = "word")]
        token_pattern: TokenPattern,
        /// Drop tokens shorter than this many characters
        #[arg(long, default_value_t = 2)]
        min_token_len: usize,
        /// Column holding the unique item key
        #[arg(long, default_value = "title")]
        key_column: String,
        /// Column holding the descriptor text
        #[arg(long, default_value = "soup")]
        descriptor_column: String,
    },
    /// Print the items most similar to a title as JSON
    Recommend {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        k: usize,
    },
    /// Print every title in the snapshot, sorted
    Titles {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
    },
}

#[derive(Serialize)]
struct Hit<'a> {
    title: &'a str,
    score: f32,
    metadata: &'a BTreeMap<String, String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, idf, sublinear_tf, stem, token_pattern, min_token_len, key_column, descriptor_column } => {
            let columns = SourceColumns { key: key_column, descriptor: descriptor_column };
            let config = IndexConfig { tokenizer: TokenizerConfig { pattern: token_pattern, min_token_len, stem }, idf, sublinear_tf };
            build_snapshot(&input, &output, &columns, &config)
        }
        Commands::Recommend { index, title, k } => recommend(&index, &title, k),
        Commands::Titles { index } => {
            let index = load_index(&IndexPaths::new(&index))?;
            for key in index.corpus().all_keys() {
                println!("{key}");
            }
            Ok(())
        }
    }
}

fn build_snapshot(input: &Path, output: &Path, columns: &SourceColumns, config: &IndexConfig) -> Result<()> {
    let corpus = corpus::load(input, columns).with_context(|| format!("loading {}", input.display()))?;
    let index = ReadyIndex::build(corpus, config);
    let meta = save_index(&IndexPaths::new(output), &index)?;
    tracing::info!(output = %output.display(), items = meta.num_items, vocabulary = meta.vocabulary_size, "index build complete");
    Ok(())
}

fn recommend(index_dir: &Path, title: &str, k: usize) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir))?;
    let recommender = Recommender::new(Arc::new(index));
    let results = recommender.recommend_scored(title, k);
    if results.is_empty() {
        tracing::warn!(title, "no recommendations found");
    }
    let hits: Vec<Hit> = results
        .iter()
        .map(|r| Hit { title: &r.record.key, score: r.score, metadata: &r.record.metadata })
        .collect();
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}
