//! Offline index construction.
//!
//! Projects the catalog snapshot into suggestion documents and bulk
//! writes them to the Tantivy index in batches. This is a single-writer
//! job: running two builds concurrently against the same directory
//! would race on the creation check and on commits. Concurrent readers
//! are fine — they observe the previous generation of documents until
//! the terminal refresh.

use std::path::Path;
use std::time::Instant;

use callejero_catalog::StreetSegment;
use callejero_suggest_models::IndexBuildStats;
use tantivy::{Index, IndexWriter, TantivyDocument, Term, doc};

use crate::SuggestError;
use crate::schema::{self, SuggestFields};

/// Default number of documents per bulk flush.
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// How many failing documents to include in an integrity diagnostic.
const MAX_REPORTED_FAILURES: usize = 3;

/// Builds (or incrementally rebuilds) the suggestion index from the
/// catalog snapshot.
///
/// - If no index exists at `index_dir`, one is created from the fixed
///   schema. An existing index is opened as-is; this function never
///   migrates a schema.
/// - Each segment becomes one document keyed by its stable id. The
///   write is delete-then-add, so rerunning over an unchanged catalog
///   is idempotent: the document count does not grow.
/// - The writer commits every `batch_size` documents and once more for
///   the remainder. If any document in a batch fails, the whole run
///   aborts before that batch's commit and no refresh is issued.
/// - After the last successful commit, an explicit reader reload makes
///   the new documents visible to already-open searchers in this
///   process.
///
/// # Errors
///
/// Returns [`SuggestError::IndexIntegrity`] on per-document failures,
/// or another [`SuggestError`] for index/storage failures.
pub fn build(
    index_dir: &Path,
    segments: &[StreetSegment],
    batch_size: usize,
    writer_heap_bytes: usize,
) -> Result<IndexBuildStats, SuggestError> {
    let start = Instant::now();
    let batch_size = batch_size.max(1);

    let index = ensure_index(index_dir)?;
    let fields = SuggestFields::from_schema(&index.schema());
    let mut writer: IndexWriter = index.writer(writer_heap_bytes)?;

    let total = segments.len();
    log::info!(
        "Indexing {total} catalog segments into {} (batch size {batch_size})",
        index_dir.display()
    );

    let mut written = 0u64;
    let mut skipped = 0u64;
    let mut flushes = 0u64;

    for batch in segments.chunks(batch_size) {
        let mut failures: Vec<String> = Vec::new();

        for segment in batch {
            let centroid = segment.geometry.centroid();
            let (lon, lat) = (centroid.x(), centroid.y());
            if !usable_coordinates(lon, lat) {
                log::warn!(
                    "Skipping segment {}: centroid ({lon}, {lat}) outside WGS84 bounds",
                    segment.id
                );
                skipped += 1;
                continue;
            }

            // Upsert: any previous document for this id is replaced.
            writer.delete_term(Term::from_field_text(fields.id, &segment.id));

            let document: TantivyDocument = doc!(
                fields.id => segment.id.as_str(),
                fields.name => segment.name.as_str(),
                fields.name_prefix => segment.name.as_str(),
                fields.code => segment.segment_code.as_str(),
                fields.lat => lat,
                fields.lon => lon,
            );

            if let Err(e) = writer.add_document(document) {
                failures.push(format!("{}: {e}", segment.id));
                if failures.len() > MAX_REPORTED_FAILURES {
                    break;
                }
            } else {
                written += 1;
            }
        }

        if !failures.is_empty() {
            // Fail fast: never commit a half-written batch.
            failures.truncate(MAX_REPORTED_FAILURES);
            return Err(SuggestError::IndexIntegrity { failures });
        }

        writer.commit()?;
        flushes += 1;

        let elapsed = start.elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let rate = if elapsed > 0.0 {
            (written + skipped) as f64 / elapsed
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let eta = if rate > 0.0 {
            (total as f64 - (written + skipped) as f64) / rate
        } else {
            0.0
        };
        log::info!(
            "Progress: {}/{total} ({rate:.0} docs/s, ETA {eta:.0}s)",
            written + skipped
        );
    }

    writer.wait_merging_threads()?;

    // Explicit refresh: make the new generation immediately visible.
    index.reader()?.reload()?;

    let build_time_secs = start.elapsed().as_secs_f64();
    log::info!(
        "Index build finished: {written} documents, {flushes} flushes, {skipped} skipped, {build_time_secs:.1}s"
    );

    Ok(IndexBuildStats {
        documents_written: written,
        batches_flushed: flushes,
        skipped_rows: skipped,
        build_time_secs,
    })
}

/// Opens the index at `index_dir`, creating it from the fixed schema
/// if it does not exist yet. An existing index is left untouched.
fn ensure_index(index_dir: &Path) -> Result<Index, SuggestError> {
    let index = if index_dir.join("meta.json").exists() {
        log::info!("Index already exists at {}", index_dir.display());
        Index::open_in_dir(index_dir)?
    } else {
        log::info!("Creating index at {}", index_dir.display());
        std::fs::create_dir_all(index_dir)?;
        Index::create_in_dir(index_dir, schema::build_schema())?
    };
    schema::register_tokenizers(&index);
    Ok(index)
}

/// Coordinates must already be geographic (WGS84). Anything outside
/// the valid range means the source row was never reprojected and the
/// document would be unusable.
fn usable_coordinates(lon: f64, lat: f64) -> bool {
    lon.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callejero_catalog::SegmentGeometry;
    use geo::Point;

    fn segment(id: &str, name: &str, lon: f64, lat: f64) -> StreetSegment {
        StreetSegment {
            id: id.to_string(),
            name: name.to_string(),
            segment_code: format!("c-{id}"),
            geometry: SegmentGeometry::Centroid(Point::new(lon, lat)),
            even_range: None,
            odd_range: None,
        }
    }

    fn fixture(count: usize) -> Vec<StreetSegment> {
        (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let offset = i as f64 * 1e-4;
                segment(&format!("s{i}"), &format!("CALLE {i}"), -58.4 + offset, -34.6)
            })
            .collect()
    }

    #[test]
    fn flush_count_matches_batching() {
        let tmp = std::env::temp_dir().join("callejero_builder_test_batches");
        let _ = std::fs::remove_dir_all(&tmp);

        let segments = fixture(10);
        let stats = build(&tmp, &segments, 4, 50_000_000).unwrap();

        assert_eq!(stats.documents_written, 10);
        assert_eq!(stats.batches_flushed, 3); // 4 + 4 + 2
        assert_eq!(stats.skipped_rows, 0);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let tmp = std::env::temp_dir().join("callejero_builder_test_idempotent");
        let _ = std::fs::remove_dir_all(&tmp);

        let segments = fixture(6);
        build(&tmp, &segments, 2000, 50_000_000).unwrap();
        build(&tmp, &segments, 2000, 50_000_000).unwrap();

        let index = Index::open_in_dir(&tmp).unwrap();
        let reader = index.reader().unwrap();
        assert_eq!(reader.searcher().num_docs(), 6);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn out_of_bounds_coordinates_are_skipped() {
        let tmp = std::env::temp_dir().join("callejero_builder_test_bounds");
        let _ = std::fs::remove_dir_all(&tmp);

        let mut segments = fixture(2);
        // projected coordinates that were never reprojected to WGS84
        segments.push(segment("bad", "CALLE MALA", 5_400_000.0, 6_100_000.0));

        let stats = build(&tmp, &segments, 2000, 50_000_000).unwrap();
        assert_eq!(stats.documents_written, 2);
        assert_eq!(stats.skipped_rows, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_catalog_builds_empty_index() {
        let tmp = std::env::temp_dir().join("callejero_builder_test_empty");
        let _ = std::fs::remove_dir_all(&tmp);

        let stats = build(&tmp, &[], 2000, 50_000_000).unwrap();
        assert_eq!(stats.documents_written, 0);
        assert_eq!(stats.batches_flushed, 0);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
