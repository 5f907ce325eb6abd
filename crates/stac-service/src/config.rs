//! Service configuration.

use std::env;

use serde::{Deserialize, Serialize};

use raster_access::S3Config;

/// Top-level catalog service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the WMS rendering endpoint fetch links point at.
    pub wms_endpoint: String,

    /// Base URL callback tokens are appended to in publish responses.
    pub callback_base: String,

    /// S3-compatible storage credentials for `s3://` raster URIs. When
    /// absent, the standard AWS environment variables apply.
    pub s3: Option<S3Config>,

    /// Hard cap on unlimited search results.
    pub max_results: usize,

    /// Decoded-raster LRU cache capacity.
    pub raster_cache_capacity: usize,

    /// Deadline for a single ingestion, in seconds. An ingestion that
    /// exceeds it transitions the job and record to failed.
    pub ingest_deadline_secs: u64,

    /// How many completed publish jobs stay pollable before the oldest
    /// are dropped.
    pub job_retention: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            wms_endpoint: "http://wms:8080/wms".to_string(),
            callback_base: "http://catalog:8080/jobs".to_string(),
            s3: None,
            max_results: 10_000,
            raster_cache_capacity: 32,
            ingest_deadline_secs: 300,
            job_retention: 1024,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above. S3 credentials are picked up only when
    /// `S3_ENDPOINT` is set.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let s3 = env::var("S3_ENDPOINT").ok().map(|endpoint| S3Config {
            endpoint,
            access_key_id: env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_access_key: env::var("S3_SECRET_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            allow_http: env::var("S3_ALLOW_HTTP")
                .map(|v| v == "true")
                .unwrap_or(true),
        });

        Self {
            wms_endpoint: env::var("WMS_ENDPOINT").unwrap_or(defaults.wms_endpoint),
            callback_base: env::var("CALLBACK_BASE").unwrap_or(defaults.callback_base),
            s3,
            max_results: parse_env("MAX_SEARCH_RESULTS", defaults.max_results),
            raster_cache_capacity: parse_env("RASTER_CACHE_CAPACITY", defaults.raster_cache_capacity),
            ingest_deadline_secs: parse_env("INGEST_DEADLINE_SECS", defaults.ingest_deadline_secs),
            job_retention: parse_env("JOB_RETENTION", defaults.job_retention),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
