//! Batch re-derivation of record fields from stored enrichment payloads.

use serde::Serialize;
use tracing::{info, warn};

use crate::enrichment::PlaceAnalysis;
use crate::error::{EnrichmentError, StoreError};
use crate::record::{PlaceRecord, CURRENT_SCHEMA_VERSION};
use crate::store::PlaceStore;

/// Recompute derived fields from the record's raw payload.
///
/// Returns `Ok(false)` for records without a payload.
pub fn rederive(record: &mut PlaceRecord) -> Result<bool, EnrichmentError> {
    let Some(raw) = record.raw_enrichment.clone() else {
        return Ok(false);
    };
    let analysis = PlaceAnalysis::from_value(raw)?;
    record.apply_details(&analysis.details);
    record.schema_version = CURRENT_SCHEMA_VERSION;
    Ok(true)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReparseReport {
    pub updated: usize,
    /// No raw payload to work from
    pub skipped: usize,
    /// Payload present but undecodable
    pub failed: usize,
}

pub async fn reparse_all(store: &dyn PlaceStore) -> Result<ReparseReport, StoreError> {
    let mut report = ReparseReport::default();

    for mut record in store.list().await? {
        match rederive(&mut record) {
            Ok(true) => {
                store.update(&record).await?;
                report.updated += 1;
            }
            Ok(false) => report.skipped += 1,
            Err(e) => {
                warn!(id = %record.id, error = %e, "Stored payload could not be re-derived");
                report.failed += 1;
            }
        }
    }

    info!(
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "Re-derivation finished"
    );
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub with_raw: usize,
    pub legacy: usize,
    pub categories: Vec<(String, usize)>,
}

pub async fn stats(store: &dyn PlaceStore) -> Result<StoreStats, StoreError> {
    let records = store.list().await?;
    Ok(StoreStats {
        total: store.count().await?,
        with_raw: records.iter().filter(|r| r.raw_enrichment.is_some()).count(),
        legacy: records.iter().filter(|r| r.is_legacy()).count(),
        categories: store.category_frequencies().await?,
    })
}
