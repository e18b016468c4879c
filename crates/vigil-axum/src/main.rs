use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vigil::{Config, Moderator};
use vigil_store::{FileStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve the Vigil moderation API over HTTP")]
struct Args {
    /// Path to a KDL rules file (built-in rules when omitted)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Path to the JSON store file (in-memory when omitted)
    #[arg(short = 's', long)]
    store: Option<PathBuf>,

    /// Address to listen on
    #[arg(short = 'b', long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(EnvFilter::from_env("VIGIL_LOG"))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::builtin()?,
    };

    let app = match &args.store {
        Some(path) => vigil_axum::router(Moderator::new(config, FileStore::open(path).await?)),
        None => {
            tracing::warn!("no --store given, moderation state will not survive a restart");
            vigil_axum::router(Moderator::new(config, MemoryStore::new()))
        }
    }
    .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %args.bind, "listening");
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}
