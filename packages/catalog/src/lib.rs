#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Street catalog for the callejero geocoder.
//!
//! The catalog is the canonical set of street segments for one
//! municipality: display names, block codes, WGS84 geometry, and the
//! even/odd house-number ranges used for address interpolation. It is
//! loaded from a read-only `DuckDB` file into an immutable in-memory
//! snapshot at process startup and shared across request handlers.

pub mod segment;
pub mod store;

pub use segment::{Parity, ParityRange, ParityRangeError, SegmentGeometry, StreetSegment};
pub use store::CatalogSnapshot;

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Catalog database file not found.
    #[error("Catalog database not found: {0}")]
    NotFound(String),
}

/// Opens the catalog `DuckDB` file read-only.
///
/// # Errors
///
/// Returns [`CatalogError::NotFound`] if the file does not exist, or a
/// [`CatalogError::DuckDb`] if the connection cannot be opened.
pub fn open_catalog_db(path: &std::path::Path) -> Result<duckdb::Connection, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.display().to_string()));
    }
    let conn = duckdb::Connection::open_with_flags(
        path,
        duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?,
    )?;
    Ok(conn)
}
