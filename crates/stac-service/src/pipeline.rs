//! The publish pipeline: validate, upsert, schedule ingestion.
//!
//! Validation failures surface synchronously and leave no state behind.
//! Once a request is accepted the caller immediately gets a callback token;
//! the statistics precomputation runs on a detached task and lands in the
//! job table and the record's publish state, never in the original call.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use catalog_store::CatalogWriter;
use raster_access::{validate_scheme, RasterAccess};
use stac_common::{
    time::parse_publish_datetime, AssetKey, AssetRecord, CatalogError, CatalogResult, MediaType,
};
use stac_protocol::{PublishRequest, PublishResponse};

use crate::jobs::JobTable;

/// Accepts publish requests and drives them through ingestion.
pub struct PublishPipeline {
    writer: Arc<CatalogWriter>,
    raster: Arc<RasterAccess>,
    jobs: Arc<JobTable>,
    callback_base: String,
    ingest_deadline: Duration,
}

impl PublishPipeline {
    pub fn new(
        writer: CatalogWriter,
        raster: Arc<RasterAccess>,
        jobs: Arc<JobTable>,
        callback_base: impl Into<String>,
        ingest_deadline: Duration,
    ) -> Self {
        let mut callback_base = callback_base.into();
        while callback_base.ends_with('/') {
            callback_base.pop();
        }

        Self {
            writer: Arc::new(writer),
            raster,
            jobs,
            callback_base,
            ingest_deadline,
        }
    }

    /// Validate and accept a publish request.
    ///
    /// On success the record is upserted as `Pending`, a detached ingestion
    /// task is spawned, and the returned callback URL embeds the token to
    /// poll. A `Conflict` (existing key without `force`) is reported before
    /// any asynchronous work starts.
    #[instrument(skip(self, request), fields(catalog = %request.catalog, id = %request.id))]
    pub fn publish(&self, request: PublishRequest) -> CatalogResult<PublishResponse> {
        let record = validate(&request)?;
        let key = record.key.clone();
        let revision = record.revision;
        let uri = record.uri.clone();

        self.writer.upsert(record, request.force)?;

        let token = self.jobs.create(key.clone());
        info!(%key, %token, "Publish accepted, ingestion scheduled");

        self.spawn_ingestion(key, revision, uri, token);

        Ok(PublishResponse {
            callback_url: format!("{}/{}", self.callback_base, token),
        })
    }

    fn spawn_ingestion(&self, key: AssetKey, revision: Uuid, uri: String, token: Uuid) {
        let writer = Arc::clone(&self.writer);
        let raster = Arc::clone(&self.raster);
        let jobs = Arc::clone(&self.jobs);
        let deadline = self.ingest_deadline;

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(deadline, async {
                let tif = raster.open(&uri).await?;
                let stats = raster.statistics(&uri).await?;
                Ok::<_, CatalogError>((tif.bbox(), stats))
            })
            .await;

            match outcome {
                Ok(Ok((bbox, stats))) => {
                    writer.complete_ingest(&key, revision, bbox, stats);
                    jobs.complete(token);
                    info!(%key, %token, "Ingestion complete");
                }
                Ok(Err(err)) => {
                    let detail = err.to_string();
                    writer.fail_ingest(&key, revision, detail.clone());
                    jobs.fail(token, detail);
                    warn!(%key, %token, error = %err, "Ingestion failed");
                }
                Err(_) => {
                    let detail = format!("ingestion timed out after {:?}", deadline);
                    writer.fail_ingest(&key, revision, detail.clone());
                    jobs.fail(token, detail);
                    error!(%key, %token, "Ingestion deadline exceeded");
                }
            }
        });
    }
}

/// Synchronous publish validation. Produces the pending record to upsert,
/// touching no shared state.
fn validate(request: &PublishRequest) -> CatalogResult<AssetRecord> {
    if request.catalog.trim().is_empty() {
        return Err(CatalogError::InvalidQuery(
            "publish: catalog must be non-empty".to_string(),
        ));
    }
    if request.id.trim().is_empty() {
        return Err(CatalogError::InvalidQuery(
            "publish: id must be non-empty".to_string(),
        ));
    }

    let mediatype: MediaType = request.mediatype.parse()?;
    validate_scheme(&request.uri)?;

    let datetime = match &request.utc_datetime {
        Some(raw) => parse_publish_datetime(raw)?,
        None => Utc::now(),
    };

    Ok(AssetRecord::pending(
        AssetKey::new(request.catalog.trim(), request.id.trim()),
        datetime,
        request.description.clone(),
        mediatype,
        request.uri.clone(),
        request.attribute_dict.clone(),
        request.default_style.clone(),
    ))
}
