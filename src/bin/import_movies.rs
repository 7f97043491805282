use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recsys_api::{
    config::Config,
    db::{create_pool, PgStore},
    services::catalog::{import_catalog, read_catalog},
};

/// Seeds the movie catalog from a CSV export
#[derive(Parser, Debug)]
#[clap(name = "import-movies")]
#[clap(about = "Load movies from a CSV file into the catalog database")]
struct Args {
    /// CSV file with title, genres, actors and directors columns
    #[clap(value_name = "FILE")]
    path: PathBuf,

    /// Movies stored per transaction
    #[clap(long, env = "IMPORT_BATCH_SIZE", default_value = "500")]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recsys_api=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let file = File::open(&args.path)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;
    let movies = read_catalog(file)?;
    tracing::info!(path = %args.path.display(), rows = movies.len(), "Catalog file read");

    let pool = create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let store = PgStore::new(pool);

    let imported = import_catalog(&store, movies, args.batch_size)
        .await
        .context("Failed to store catalog")?;
    tracing::info!(imported, "Catalog import complete");

    Ok(())
}
