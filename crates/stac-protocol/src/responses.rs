//! Response shapes for the four logical catalog operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stac_common::AssetRecord;

use crate::requests::FetchType;

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub catalog: String,
    pub bbox: [f64; 4],
    pub datetime: DateTime<Utc>,
    pub description: String,
    pub attribute_dict: HashMap<String, serde_json::Value>,
}

impl From<&AssetRecord> for Feature {
    fn from(record: &AssetRecord) -> Self {
        Self {
            id: record.key.id.clone(),
            catalog: record.key.catalog.clone(),
            bbox: record.bbox.to_array(),
            datetime: record.datetime,
            description: record.description.clone(),
            attribute_dict: record.attribute_dict.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub features: Vec<Feature>,
}

/// Fetch result: a resolved link plus the precomputed raster statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(rename = "type")]
    pub fetch_type: FetchType,
    pub link: String,
    pub raster_min: f64,
    pub raster_max: f64,
    pub raster_mean: f64,
    pub raster_stdev: f64,
}

/// Pixel-pick result: the sampled value and its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelPickResponse {
    pub catalog: String,
    pub asset_id: String,
    pub band: usize,
    pub value: f64,
    /// True when the sampled pixel carries the raster's nodata sentinel.
    pub is_nodata: bool,
    pub lng: f64,
    pub lat: f64,
}

/// Publish acknowledgement: a pollable callback reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub callback_url: String,
}

/// Publish job lifecycle as seen by a polling caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    InProgress,
    Done,
    Error,
}

/// Poll result for a publish job token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub token: Uuid,
    pub status: JobState,
    /// When the publish request was accepted.
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}
