use crate::{error::CliError, output::JsonLinesImporter};
use clap::Parser;
use commands::Commands;
use connectors::{connector::DriverConnector, sql::base::adapter::DatabaseKind};
use engine_config::store::memory::MemoryStore;
use engine_core::engine::PollingEngine;
use std::{path::PathBuf, str::FromStr, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod inventory;
mod output;

#[derive(Parser)]
#[command(name = "sqlpoll", version = "0.1.0", about = "Incremental SQL polling connector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            tree,
            driver,
            output,
            report,
        } => {
            let path = tree_path(tree)?;
            let kind = DatabaseKind::from_str(&driver).map_err(CliError::InvalidDriver)?;
            info!(tree = %path.display(), %kind, "Loading configuration tree");

            let store = Arc::new(MemoryStore::load(&path).await?);
            let engine = PollingEngine::new(
                store.clone(),
                store.root(),
                Arc::new(DriverConnector::new(kind)),
                Arc::new(JsonLinesImporter::new(output)),
            )
            .with_schema(store.schema().clone());

            let run_report = engine.run().await?;

            // watermarks live in the tree
            store.save(&path).await?;

            output::print_summary(&run_report);
            if let Some(report) = report {
                output::write_report(&run_report, &report).await?;
            }
        }
        Commands::Channels { tree, json } => {
            let path = tree_path(tree)?;
            let store = Arc::new(MemoryStore::load(&path).await?);
            let root = store.root();
            let schema = store.schema().clone();

            let listings = inventory::list_channels(store, root, schema).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else {
                inventory::print_listing(&listings);
            }
        }
    }

    Ok(())
}

fn tree_path(tree: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match tree {
        Some(path) => Ok(path),
        None => {
            let home = dirs::home_dir()
                .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into()))?;
            Ok(home.join(".sqlpoll/tree.json"))
        }
    }
}
