//! Secondary spatiotemporal index over the catalog store.
//!
//! A fixed-size degree grid narrows spatial queries; a `BTreeMap` keyed by
//! datetime narrows temporal ones. Grid cells are an approximation, so
//! candidates are always verified against the exact bbox/datetime held in
//! the index entry. Entries reference records by identity only; the store
//! owns the records.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use chrono::{DateTime, Utc};

use stac_common::{AssetKey, BoundingBox, TimeFilter};

/// Grid cell edge length in degrees.
const CELL_SIZE_DEG: f64 = 5.0;

#[derive(Debug, Clone)]
struct IndexEntry {
    /// `None` while the record's true extent is unknown (ingestion has not
    /// supplied it yet); such entries never match a spatial filter.
    bbox: Option<BoundingBox>,
    datetime: DateTime<Utc>,
}

/// Derived index over asset identities, keyed by spatial cell and datetime.
///
/// Never mutated directly by callers: the store updates it inside the same
/// critical section as the record mutation it derives from.
#[derive(Debug, Default)]
pub struct SpatioTemporalIndex {
    cells: HashMap<(i64, i64), HashSet<AssetKey>>,
    by_time: BTreeMap<DateTime<Utc>, HashSet<AssetKey>>,
    entries: HashMap<AssetKey, IndexEntry>,
}

impl SpatioTemporalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index a record's identity under its datetime, and under its bbox
    /// when the extent is known, superseding any previous entry for the
    /// same key.
    pub fn insert(&mut self, key: AssetKey, bbox: Option<BoundingBox>, datetime: DateTime<Utc>) {
        self.remove(&key);

        if let Some(bbox) = &bbox {
            for cell in covered_cells(bbox) {
                self.cells.entry(cell).or_default().insert(key.clone());
            }
        }
        self.by_time.entry(datetime).or_default().insert(key.clone());
        self.entries.insert(key, IndexEntry { bbox, datetime });
    }

    /// Drop every trace of a key. No-op if the key is unindexed.
    pub fn remove(&mut self, key: &AssetKey) {
        let Some(entry) = self.entries.remove(key) else {
            return;
        };

        if let Some(bbox) = &entry.bbox {
            for cell in covered_cells(bbox) {
                if let Some(keys) = self.cells.get_mut(&cell) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.cells.remove(&cell);
                    }
                }
            }
        }

        if let Some(keys) = self.by_time.get_mut(&entry.datetime) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_time.remove(&entry.datetime);
            }
        }
    }

    /// Identities matching the spatial AND temporal filters. An absent
    /// filter matches everything. The spatial test is bounding-box
    /// intersection, not containment.
    pub fn query(
        &self,
        bbox: Option<&BoundingBox>,
        time: Option<&TimeFilter>,
    ) -> HashSet<AssetKey> {
        match (bbox, time) {
            (None, None) => self.entries.keys().cloned().collect(),
            (Some(bbox), None) => self.spatial_candidates(bbox),
            (None, Some(time)) => self.temporal_candidates(time),
            (Some(bbox), Some(time)) => {
                let spatial = self.spatial_candidates(bbox);
                let temporal = self.temporal_candidates(time);
                spatial.intersection(&temporal).cloned().collect()
            }
        }
    }

    fn spatial_candidates(&self, filter: &BoundingBox) -> HashSet<AssetKey> {
        let mut matches = HashSet::new();

        for cell in covered_cells(filter) {
            let Some(keys) = self.cells.get(&cell) else {
                continue;
            };
            for key in keys {
                if matches.contains(key) {
                    continue;
                }
                // Cells over-approximate; verify against the exact bbox.
                if self.entries[key].bbox.is_some_and(|b| b.intersects(filter)) {
                    matches.insert(key.clone());
                }
            }
        }

        matches
    }

    fn temporal_candidates(&self, filter: &TimeFilter) -> HashSet<AssetKey> {
        let start = filter.start.map_or(Bound::Unbounded, Bound::Included);
        let end = filter.end.map_or(Bound::Unbounded, Bound::Included);

        self.by_time
            .range((start, end))
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }
}

fn covered_cells(bbox: &BoundingBox) -> impl Iterator<Item = (i64, i64)> {
    let min_cx = cell_coord(bbox.min_x);
    let max_cx = cell_coord(bbox.max_x);
    let min_cy = cell_coord(bbox.min_y);
    let max_cy = cell_coord(bbox.max_y);

    (min_cx..=max_cx).flat_map(move |cx| (min_cy..=max_cy).map(move |cy| (cx, cy)))
}

fn cell_coord(coord: f64) -> i64 {
    (coord / CELL_SIZE_DEG).floor() as i64
}
