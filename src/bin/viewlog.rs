//! Viewer server: post-process a getquotes log into sessions and serve
//! them as JSON over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use getquotes::viewer::{load_sessions_from_path, router};

#[derive(Debug, Parser)]
#[command(name = "viewlog", about = "Browse getquotes log sessions over HTTP", version)]
struct Args {
    /// Log file to post-process.
    #[arg(short = 'l', long, default_value = "getquotes.log")]
    logfile: PathBuf,

    /// Listen address.
    #[arg(short = 'a', long, default_value = "127.0.0.1:8888")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(error) = serve(args).await {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

async fn serve(args: Args) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let sessions = load_sessions_from_path(&args.logfile)
        .with_context(|| format!("cannot load {}", args.logfile.display()))?;
    info!(sessions = sessions.len(), logfile = %args.logfile.display(), "log loaded");

    let app = router(Arc::new(sessions));
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("cannot bind {}", args.addr))?;
    info!(addr = %args.addr, "viewer listening");
    axum::serve(listener, app).await?;
    Ok(())
}
