use std::path::PathBuf;

use clap::Parser;
use taskflow_core::{Config, Database};
use taskflow_server::ApiServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskflow-server", version, about = "TaskFlow CRUD API server")]
struct Args {
    /// Address to listen on (defaults to `server.bind`)
    #[arg(long)]
    bind: Option<String>,
    /// SQLite database file (defaults to `server.database`)
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let path = match args.database {
        Some(path) => path,
        None => config.database_path()?,
    };
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let db = Database::open(&path)?;
    info!(database = %path.display(), "database ready");

    let server = ApiServer::start(db, &bind).await?;
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    Ok(())
}
