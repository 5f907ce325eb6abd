//! RasterAccess: cached raster opening, pixel sampling, and statistics.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use stac_common::{CatalogError, CatalogResult, RasterStats};

use crate::geotiff::GeoTiff;
use crate::source::{RasterSource, S3Config};

const DEFAULT_CACHE_CAPACITY: usize = 32;

/// A single sampled pixel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Raw sample value (the nodata sentinel is passed through).
    pub value: f64,
    /// Band index the value was read from (always 0 for now).
    pub band: usize,
    /// Whether the value is the raster's nodata sentinel.
    pub is_nodata: bool,
}

/// Cache hit/miss counters for the decoded-raster cache.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Opens rasters addressed by URI and answers pixel and statistics queries.
///
/// Decoded rasters are kept in an LRU cache keyed by URI so that a publish
/// followed by pixel picks does not refetch the payload.
pub struct RasterAccess {
    source: RasterSource,
    cache: Mutex<LruCache<String, Arc<GeoTiff>>>,
    stats: Mutex<CacheStats>,
}

impl RasterAccess {
    pub fn new(s3: Option<S3Config>) -> Self {
        Self::with_capacity(s3, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(s3: Option<S3Config>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            source: RasterSource::new(s3),
            cache: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Open (or retrieve from cache) the raster behind a URI.
    #[instrument(skip(self), fields(uri = %uri))]
    pub async fn open(&self, uri: &str) -> CatalogResult<Arc<GeoTiff>> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(raster) = cache.get(uri) {
                self.stats.lock().await.hits += 1;
                return Ok(Arc::clone(raster));
            }
        }

        let bytes = self.source.fetch(uri).await?;
        let raster = Arc::new(GeoTiff::from_bytes(&bytes)?);
        self.stats.lock().await.misses += 1;

        let mut cache = self.cache.lock().await;
        cache.put(uri.to_string(), Arc::clone(&raster));
        debug!(
            width = raster.width,
            height = raster.height,
            "Cached decoded raster"
        );

        Ok(raster)
    }

    /// Read a single pixel value at a geographic coordinate.
    ///
    /// Fails `OutOfBounds` if the coordinate falls outside the raster's
    /// spatial extent, `UnreadableRaster`/`StorageError` if the raster
    /// cannot be opened.
    pub async fn sample(&self, uri: &str, lng: f64, lat: f64) -> CatalogResult<PixelSample> {
        let raster = self.open(uri).await?;

        let value = raster.value_at(lng, lat, 0).ok_or_else(|| {
            CatalogError::OutOfBounds(format!("({}, {}) outside raster extent", lng, lat))
        })?;

        Ok(PixelSample {
            value,
            band: 0,
            is_nodata: raster.is_nodata(value),
        })
    }

    /// Compute aggregate statistics over all valid band-0 pixels.
    ///
    /// Nodata-marked and NaN pixels are excluded from min, max, mean, and
    /// stdev. Stdev is the population standard deviation. A raster with no
    /// valid pixels is unusable and fails `UnreadableRaster`.
    pub async fn statistics(&self, uri: &str) -> CatalogResult<RasterStats> {
        let raster = self.open(uri).await?;
        compute_statistics(&raster)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.stats.lock().await.clone()
    }
}

fn compute_statistics(raster: &GeoTiff) -> CatalogResult<RasterStats> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in raster.band0_values() {
        if raster.is_nodata(value) {
            continue;
        }
        min = min.min(value);
        max = max.max(value);
        sum += value;
        count += 1;
    }

    if count == 0 {
        return Err(CatalogError::UnreadableRaster(
            "raster contains no valid pixels".to_string(),
        ));
    }

    let mean = sum / count as f64;

    // Second pass for numerically stable population variance
    let mut sum_sq_dev = 0.0;
    for value in raster.band0_values() {
        if raster.is_nodata(value) {
            continue;
        }
        let dev = value - mean;
        sum_sq_dev += dev * dev;
    }
    let stdev = (sum_sq_dev / count as f64).sqrt();

    Ok(RasterStats {
        min,
        max,
        mean,
        stdev,
    })
}
