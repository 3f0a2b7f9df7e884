#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the callejero geocoding service.
//!
//! Serves street-name suggestions, house-number geocoding, and street
//! intersection resolution over the in-memory catalog snapshot and the
//! Tantivy suggestion index. Both backends are opened once at startup;
//! every request path is read-only.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use callejero_catalog::{CatalogSnapshot, open_catalog_db};
use callejero_suggest::SuggestIndex;
use std::path::Path;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// Immutable street catalog snapshot loaded at startup.
    pub catalog: Arc<CatalogSnapshot>,
    /// Suggestion index reader, absent when the index has not been
    /// built yet. The service still geocodes in that case; suggestion
    /// endpoints answer 502 and health reports degraded.
    pub suggest: Option<Arc<SuggestIndex>>,
}

/// Starts the callejero API server.
///
/// Loads the street catalog from the read-only `DuckDB` file into
/// memory, opens the suggestion index if one exists, and starts the
/// Actix-Web HTTP server. This is a regular async function — the
/// caller is responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// Configuration comes from the environment: `CATALOG_DB` (path to the
/// catalog database), `SUGGEST_INDEX_DIR` (path to the suggestion
/// index), `BIND_ADDR` and `PORT`.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the catalog database cannot be opened or the snapshot
/// fails to load.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let catalog_path =
        std::env::var("CATALOG_DB").unwrap_or_else(|_| "data/callejero.duckdb".to_string());
    log::info!("Loading street catalog from {catalog_path}...");
    let conn = open_catalog_db(Path::new(&catalog_path)).expect("Failed to open catalog database");
    let catalog = CatalogSnapshot::load(&conn).expect("Failed to load catalog snapshot");
    log::info!("Loaded {} street segments", catalog.len());

    let index_dir = std::env::var("SUGGEST_INDEX_DIR")
        .unwrap_or_else(|_| format!("data/{}", callejero_suggest::DEFAULT_INDEX_DIR_NAME));
    let suggest = match SuggestIndex::open(&index_dir) {
        Ok(index) => {
            log::info!(
                "Opened suggestion index at {index_dir} ({} documents)",
                index.num_docs()
            );
            Some(Arc::new(index))
        }
        Err(e) => {
            log::warn!("Suggestion index unavailable at {index_dir}: {e}");
            None
        }
    };

    let state = web::Data::new(AppState {
        catalog: Arc::new(catalog),
        suggest,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/health", web::get().to(handlers::health))
            .route("/sugerencias", web::get().to(handlers::sugerencias))
            .route("/sugerencias_es2", web::get().to(handlers::sugerencias_es2))
            .route(
                "/geocode_direccion",
                web::get().to(handlers::geocode_direccion),
            )
            .route(
                "/geocode_interseccion",
                web::get().to(handlers::geocode_interseccion),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
