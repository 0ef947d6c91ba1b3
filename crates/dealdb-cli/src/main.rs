use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dealdb_catalog::{CatalogStore, RefreshCoordinator};
use dealdb_core::SortKey;
use dealdb_scraper::UpstreamClient;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealdb-cli")]
#[command(about = "dealdb command line interface")]
struct Cli {
    /// Overrides `DEALDB_SOURCES_PATH`.
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate and list the configured upstream sources.
    Sources,
    /// Fetch every source once and print the merged catalog as JSON.
    Catalog {
        /// lowest-price, biggest-discount-amount, or highest-percentage.
        #[arg(long)]
        sort: Option<String>,
        /// Print the refresh report to stderr.
        #[arg(long)]
        report: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = dealdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let sources_path = cli.sources.unwrap_or_else(|| config.sources_path.clone());
    let sources = dealdb_core::load_sources(&sources_path)?.sources;

    match cli.command {
        Commands::Sources => {
            for source in &sources {
                println!("{}\t{}", source.name, source.url);
            }
        }
        Commands::Catalog { sort, report } => {
            let client = UpstreamClient::from_app_config(&config)?;
            let store = Arc::new(CatalogStore::new());
            let coordinator = RefreshCoordinator::new(client, sources, Arc::clone(&store));

            let refresh = coordinator.refresh().await;
            if report {
                eprintln!("{}", serde_json::to_string_pretty(&refresh)?);
            }
            if refresh.all_failed() {
                tracing::error!(
                    sources = refresh.sources,
                    "catalog: no source returned products"
                );
                anyhow::bail!("every upstream source failed; see logs for details");
            }

            let products = store.read(SortKey::from_param(sort.as_deref())).await;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
    }

    Ok(())
}
