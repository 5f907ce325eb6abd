//! The asset catalog store: durable mapping of `(catalog, id)` to records.
//!
//! All mutation flows through [`CatalogWriter`]; the writer is not `Clone`,
//! so the publish pipeline is the only component that can hold it. Readers
//! observe a consistent snapshot taken under a single read guard.
//!
//! A record with `publish_state == Ready` always has statistics. A stored
//! record observed violating that is corruption and is treated as fatal —
//! the store panics rather than repairing silently.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use stac_common::{
    AssetKey, AssetRecord, BoundingBox, CatalogError, CatalogResult, PublishState, RasterStats,
    TimeFilter,
};

use crate::index::SpatioTemporalIndex;

struct CatalogInner {
    records: BTreeMap<AssetKey, Arc<AssetRecord>>,
    index: SpatioTemporalIndex,
}

/// Constructor for the store's two handles.
pub struct Catalog;

impl Catalog {
    /// Create an empty catalog, returning the single write handle and a
    /// cloneable read handle.
    pub fn new() -> (CatalogWriter, CatalogReader) {
        let inner = Arc::new(RwLock::new(CatalogInner {
            records: BTreeMap::new(),
            index: SpatioTemporalIndex::new(),
        }));

        (
            CatalogWriter {
                inner: Arc::clone(&inner),
            },
            CatalogReader { inner },
        )
    }
}

/// Exclusive write access to the catalog. Held by the publish pipeline.
pub struct CatalogWriter {
    inner: Arc<RwLock<CatalogInner>>,
}

impl CatalogWriter {
    /// Insert or replace a record.
    ///
    /// Fails with `Conflict` when the key exists and `force` is false. The
    /// record and its index entry commit in the same critical section; the
    /// lock is held only for the in-memory mutation, so upserts to distinct
    /// keys never wait on each other's I/O.
    ///
    /// A record that is not yet ready carries a placeholder bbox, so it is
    /// indexed temporally only; its spatial entry appears once ingestion
    /// supplies the real extent.
    pub fn upsert(&self, record: AssetRecord, force: bool) -> CatalogResult<()> {
        assert_ready_invariant(&record);

        let mut inner = write_lock(&self.inner);

        if !force && inner.records.contains_key(&record.key) {
            return Err(CatalogError::Conflict(record.key.to_string()));
        }

        let key = record.key.clone();
        let extent = record.is_ready().then_some(record.bbox);
        inner.index.insert(key.clone(), extent, record.datetime);
        inner.records.insert(key.clone(), Arc::new(record));

        debug!(key = %key, force, "Upserted catalog record");
        Ok(())
    }

    /// Transition a record to `Ready` with its ingested extent and stats.
    ///
    /// Applies only if the stored revision still matches the revision the
    /// ingestion was spawned for; a stale completion (the record was
    /// force-republished meanwhile) is dropped. Returns whether it applied.
    pub fn complete_ingest(
        &self,
        key: &AssetKey,
        revision: Uuid,
        bbox: BoundingBox,
        stats: RasterStats,
    ) -> bool {
        let mut inner = write_lock(&self.inner);

        let Some(current) = inner.records.get(key) else {
            warn!(key = %key, "Ingestion completed for a removed record");
            return false;
        };
        if current.revision != revision {
            info!(key = %key, "Dropping stale ingestion completion");
            return false;
        }

        let mut updated = AssetRecord::clone(current);
        updated.bbox = bbox;
        updated.publish_state = PublishState::Ready;
        updated.raster_stats = Some(stats);
        updated.error_detail = None;

        inner.index.insert(key.clone(), Some(updated.bbox), updated.datetime);
        inner.records.insert(key.clone(), Arc::new(updated));

        info!(key = %key, "Record ready");
        true
    }

    /// Transition a record to `Failed`, recording the failure detail.
    ///
    /// Revision-gated like [`complete_ingest`](Self::complete_ingest). The
    /// record stays queryable but is unusable for fetch and pixel sampling
    /// until republished.
    pub fn fail_ingest(&self, key: &AssetKey, revision: Uuid, detail: String) -> bool {
        let mut inner = write_lock(&self.inner);

        let Some(current) = inner.records.get(key) else {
            warn!(key = %key, "Ingestion failed for a removed record");
            return false;
        };
        if current.revision != revision {
            info!(key = %key, "Dropping stale ingestion failure");
            return false;
        }

        let mut updated = AssetRecord::clone(current);
        updated.publish_state = PublishState::Failed;
        updated.raster_stats = None;
        updated.error_detail = Some(detail);

        inner.records.insert(key.clone(), Arc::new(updated));

        warn!(key = %key, "Record failed ingestion");
        true
    }

    /// Administrative removal. Not exposed through the service contract.
    pub fn remove(&self, key: &AssetKey) -> bool {
        let mut inner = write_lock(&self.inner);
        inner.index.remove(key);
        inner.records.remove(key).is_some()
    }
}

/// Shared read access to the catalog.
#[derive(Clone)]
pub struct CatalogReader {
    inner: Arc<RwLock<CatalogInner>>,
}

impl CatalogReader {
    /// Look up a single record.
    pub fn get(&self, key: &AssetKey) -> Option<Arc<AssetRecord>> {
        let inner = read_lock(&self.inner);
        let record = inner.records.get(key).cloned();
        if let Some(record) = &record {
            assert_ready_invariant(record);
        }
        record
    }

    /// Full scan in key order, keeping records the predicate accepts.
    ///
    /// Fallback path for searches the index cannot narrow; the caller's
    /// predicate carries any substring filters.
    pub fn scan<F>(&self, predicate: F) -> Vec<Arc<AssetRecord>>
    where
        F: Fn(&AssetRecord) -> bool,
    {
        let inner = read_lock(&self.inner);
        inner
            .records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Index-narrowed lookup: records matching the spatial and temporal
    /// filters, resolved against the same snapshot the index was read from.
    pub fn query_index(
        &self,
        bbox: Option<&BoundingBox>,
        time: Option<&TimeFilter>,
    ) -> Vec<Arc<AssetRecord>> {
        let inner = read_lock(&self.inner);
        inner
            .index
            .query(bbox, time)
            .into_iter()
            .filter_map(|key| inner.records.get(&key).cloned())
            .collect()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        read_lock(&self.inner).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Datetimes currently present, ascending. Diagnostic surface.
    pub fn datetimes(&self) -> Vec<DateTime<Utc>> {
        let inner = read_lock(&self.inner);
        let mut times: Vec<_> = inner.records.values().map(|r| r.datetime).collect();
        times.sort();
        times
    }
}

fn assert_ready_invariant(record: &AssetRecord) {
    if record.publish_state == PublishState::Ready && record.raster_stats.is_none() {
        panic!(
            "catalog invariant violated: {} is Ready without raster stats",
            record.key
        );
    }
}

// A poisoned lock means a writer panicked mid-mutation; the store may be
// corrupt and must not be silently repaired.
fn write_lock(inner: &RwLock<CatalogInner>) -> RwLockWriteGuard<'_, CatalogInner> {
    inner.write().expect("catalog store corrupted (poisoned lock)")
}

fn read_lock(inner: &RwLock<CatalogInner>) -> RwLockReadGuard<'_, CatalogInner> {
    inner.read().expect("catalog store corrupted (poisoned lock)")
}
