#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the callejero offline tools.

use std::path::PathBuf;

use callejero_catalog::{CatalogSnapshot, open_catalog_db};
use callejero_suggest::{SuggestIndex, builder};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "callejero", about = "Street catalog and geocoding tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) the suggestion index from the street catalog
    BuildIndex {
        /// Path to the read-only catalog database
        #[arg(long, default_value = "data/callejero.duckdb")]
        catalog_db: PathBuf,
        /// Directory the suggestion index is written to
        #[arg(long, default_value = "data/suggest_index")]
        index_dir: PathBuf,
        /// Number of documents per bulk flush
        #[arg(long, default_value = "2000")]
        batch_size: usize,
        /// Index writer heap size in megabytes
        #[arg(long, default_value = "128")]
        writer_heap_mb: usize,
    },
    /// Query the suggestion index from the terminal
    Suggest {
        /// Search text
        query: String,
        /// Directory the suggestion index lives in
        #[arg(long, default_value = "data/suggest_index")]
        index_dir: PathBuf,
        /// Maximum number of unique suggestions
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Geocode a house number on a street against the catalog
    Geocode {
        /// Street name query
        calle: String,
        /// House number
        altura: u32,
        /// Path to the read-only catalog database
        #[arg(long, default_value = "data/callejero.duckdb")]
        catalog_db: PathBuf,
        /// Optional exact street code restriction
        #[arg(long)]
        numero_cal: Option<String>,
        /// Allow relaxed fallback matching
        #[arg(long)]
        fallback: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildIndex {
            catalog_db,
            index_dir,
            batch_size,
            writer_heap_mb,
        } => {
            log::info!("Loading street catalog from {}", catalog_db.display());
            let conn = open_catalog_db(&catalog_db)?;
            let catalog = CatalogSnapshot::load(&conn)?;
            log::info!("Loaded {} street segments", catalog.len());

            let stats = builder::build(
                &index_dir,
                catalog.segments(),
                batch_size,
                writer_heap_mb * 1024 * 1024,
            )?;
            log::info!(
                "Wrote {} documents in {} flushes ({} skipped) in {:.1}s",
                stats.documents_written,
                stats.batches_flushed,
                stats.skipped_rows,
                stats.build_time_secs
            );
        }
        Commands::Suggest {
            query,
            index_dir,
            limit,
        } => {
            let index = SuggestIndex::open(&index_dir)?;
            let hits = index.suggest(&query, limit).await?;
            for hit in hits {
                println!(
                    "{:>8.3}  {} ({})",
                    hit.score, hit.document.nombre_cal, hit.document.numero_cal
                );
            }
        }
        Commands::Geocode {
            calle,
            altura,
            catalog_db,
            numero_cal,
            fallback,
        } => {
            let conn = open_catalog_db(&catalog_db)?;
            let catalog = CatalogSnapshot::load(&conn)?;
            let result = callejero_geocoder::geocode(
                catalog.segments(),
                &calle,
                altura,
                numero_cal.as_deref(),
                fallback,
            )?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
