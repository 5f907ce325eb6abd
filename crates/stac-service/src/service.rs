//! The catalog service facade.
//!
//! Wires the store, query engine, raster access, link resolver, and publish
//! pipeline together and exposes the logical operations a transport layer
//! would serialize. Write access to the catalog never leaves the pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use catalog_store::{Catalog, CatalogReader, QueryEngine};
use raster_access::{CacheStats, RasterAccess};
use stac_common::{AssetKey, AssetRecord, CatalogError, CatalogResult, RasterStats};
use stac_protocol::{
    Feature, FetchResponse, FetchType, JobStatusResponse, LinkResolver, PixelPickResponse,
    PublishRequest, PublishResponse, SearchRequest, SearchResponse,
};

use crate::config::ServiceConfig;
use crate::jobs::JobTable;
use crate::pipeline::PublishPipeline;

/// One fully wired catalog engine.
pub struct CatalogService {
    reader: CatalogReader,
    engine: QueryEngine,
    raster: Arc<RasterAccess>,
    resolver: LinkResolver,
    pipeline: PublishPipeline,
    jobs: Arc<JobTable>,
}

impl CatalogService {
    pub fn new(config: ServiceConfig) -> Self {
        let (writer, reader) = Catalog::new();
        let engine = QueryEngine::with_max_results(reader.clone(), config.max_results);
        let raster = Arc::new(RasterAccess::with_capacity(
            config.s3.clone(),
            config.raster_cache_capacity,
        ));
        let resolver = LinkResolver::new(&config.wms_endpoint);
        let jobs = Arc::new(JobTable::new(config.job_retention));
        let pipeline = PublishPipeline::new(
            writer,
            Arc::clone(&raster),
            Arc::clone(&jobs),
            &config.callback_base,
            Duration::from_secs(config.ingest_deadline_secs),
        );

        Self {
            reader,
            engine,
            raster,
            resolver,
            pipeline,
            jobs,
        }
    }

    /// Evaluate a search against the current catalog snapshot.
    #[instrument(skip(self, request))]
    pub fn search(&self, request: &SearchRequest) -> CatalogResult<SearchResponse> {
        let records = self.engine.search(request)?;
        let features = records.iter().map(|r| Feature::from(r.as_ref())).collect();
        Ok(SearchResponse { features })
    }

    /// Resolve a fetch link plus the precomputed raster statistics.
    ///
    /// Fails `NotFound` for an unknown key and `AssetNotReady` until the
    /// asynchronous ingestion has transitioned the record to ready.
    #[instrument(skip(self))]
    pub fn fetch(
        &self,
        catalog: &str,
        asset_id: &str,
        fetch_type: FetchType,
    ) -> CatalogResult<FetchResponse> {
        let record = self.ready_record(catalog, asset_id)?;
        let stats = ready_stats(&record)?;
        let link = self.resolver.resolve(&record, fetch_type)?;

        Ok(FetchResponse {
            fetch_type,
            link: link.url,
            raster_min: stats.min,
            raster_max: stats.max,
            raster_mean: stats.mean,
            raster_stdev: stats.stdev,
        })
    }

    /// Sample one pixel of a published raster at a geographic coordinate.
    #[instrument(skip(self))]
    pub async fn pixel_pick(
        &self,
        catalog: &str,
        asset_id: &str,
        lng: f64,
        lat: f64,
    ) -> CatalogResult<PixelPickResponse> {
        let record = self.ready_record(catalog, asset_id)?;
        let sample = self.raster.sample(&record.uri, lng, lat).await?;

        Ok(PixelPickResponse {
            catalog: record.key.catalog.clone(),
            asset_id: record.key.id.clone(),
            band: sample.band,
            value: sample.value,
            is_nodata: sample.is_nodata,
            lng,
            lat,
        })
    }

    /// Accept a publish request; see [`PublishPipeline::publish`].
    pub fn publish(&self, request: PublishRequest) -> CatalogResult<PublishResponse> {
        self.pipeline.publish(request)
    }

    /// Non-blocking poll of a publish job token.
    pub fn poll_job(&self, token: Uuid) -> CatalogResult<JobStatusResponse> {
        self.jobs.poll(token)
    }

    /// Decoded-raster cache counters.
    pub async fn cache_stats(&self) -> CacheStats {
        self.raster.cache_stats().await
    }

    /// Read handle for diagnostics and tests.
    pub fn reader(&self) -> &CatalogReader {
        &self.reader
    }

    fn ready_record(&self, catalog: &str, asset_id: &str) -> CatalogResult<Arc<AssetRecord>> {
        let key = AssetKey::new(catalog, asset_id);
        let record = self
            .reader
            .get(&key)
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))?;

        if !record.is_ready() {
            return Err(CatalogError::AssetNotReady(format!(
                "{} is {:?}",
                key, record.publish_state
            )));
        }

        Ok(record)
    }
}

// The reader's invariant check guarantees stats exist on ready records;
// this keeps the fallback an explicit error instead of an unwrap.
fn ready_stats(record: &AssetRecord) -> CatalogResult<RasterStats> {
    record.raster_stats.ok_or_else(|| {
        CatalogError::InternalError(format!("{} ready without statistics", record.key))
    })
}
