use anyhow::{bail, Result};
use axum::Router;
use cinematch_core::config::{IdfScheme, IndexConfig, SourceColumns, TokenPattern, TokenizerConfig};
use clap::Parser;
use server::{build_app, AppOptions, IndexSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Item table to load and index at startup (csv, json, jsonl or a directory)
    #[arg(long)]
    data: Option<PathBuf>,
    /// Prebuilt snapshot directory, used when --data is not given
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// IDF variant used when building from --data
    #[arg(long, default_value = "smooth")]
    idf: IdfScheme,
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    #[arg(long, default_value_t = false)]
    stem: bool,
    #[arg(long, default_value = "word")]
    token_pattern: TokenPattern,
    #[arg(long, default_value_t = 2)]
    min_token_len: usize,
    #[arg(long, default_value = "title")]
    key_column: String,
    #[arg(long, default_value = "soup")]
    descriptor_column: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let source = match args.data {
        Some(path) => IndexSource::Data {
            path,
            columns: SourceColumns { key: args.key_column, descriptor: args.descriptor_column },
        },
        None if args.index.exists() => IndexSource::Snapshot(args.index),
        None => bail!("no --data given and snapshot directory {} does not exist", args.index.display()),
    };
    let options = AppOptions {
        source,
        config: IndexConfig {
            tokenizer: TokenizerConfig { pattern: args.token_pattern, min_token_len: args.min_token_len, stem: args.stem },
            idf: args.idf,
            sublinear_tf: args.sublinear_tf,
        },
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = tokio::task::spawn_blocking(move || build_app(options)).await??;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
