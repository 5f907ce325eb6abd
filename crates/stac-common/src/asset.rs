//! Catalog asset records and their lifecycle types.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BoundingBox, CatalogError};

/// Unique identity of an asset: `(catalog, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    pub catalog: String,
    pub id: String,
}

impl AssetKey {
    pub fn new(catalog: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.catalog, self.id)
    }
}

/// Supported raster media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    GeoTiff,
}

impl FromStr for MediaType {
    type Err = CatalogError;

    /// Accepts the bare `"GeoTIFF"` label or the STAC media type
    /// `"image/tiff; application=geotiff"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        if normalized.eq_ignore_ascii_case("geotiff")
            || normalized.eq_ignore_ascii_case("image/tiff; application=geotiff")
        {
            Ok(MediaType::GeoTiff)
        } else {
            Err(CatalogError::UnsupportedMediaType(s.to_string()))
        }
    }
}

/// Publish lifecycle state of an asset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishState {
    /// Upserted, ingestion not yet complete.
    Pending,
    /// Ingestion succeeded; raster statistics are populated.
    Ready,
    /// Ingestion failed; record is queryable but unusable for fetch or
    /// pixel sampling until republished.
    Failed,
}

/// Aggregate statistics over the valid (non-nodata) pixels of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stdev: f64,
}

/// A catalog asset record.
///
/// Created by the publish pipeline and mutated only by it (directly, or via
/// the ingestion completion callback). Every other component holds read
/// access only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub key: AssetKey,
    /// Spatial extent in WGS 84 degrees. Derived from the raster's
    /// georeferencing when ingestion completes; a zero-area placeholder at
    /// the record's origin until then.
    pub bbox: BoundingBox,
    pub datetime: DateTime<Utc>,
    pub description: String,
    pub mediatype: MediaType,
    /// Remote blob reference for the raster bytes.
    pub uri: String,
    pub attribute_dict: HashMap<String, serde_json::Value>,
    pub default_style: Option<String>,
    pub publish_state: PublishState,
    /// Populated exactly when `publish_state == Ready`.
    pub raster_stats: Option<RasterStats>,
    /// Detail of the most recent ingestion failure, if any.
    pub error_detail: Option<String>,
    /// Stamped per upsert; ingestion completions carrying a stale revision
    /// are dropped.
    pub revision: Uuid,
}

impl AssetRecord {
    /// Create a fresh pending record as the publish pipeline does on upsert.
    pub fn pending(
        key: AssetKey,
        datetime: DateTime<Utc>,
        description: String,
        mediatype: MediaType,
        uri: String,
        attribute_dict: HashMap<String, serde_json::Value>,
        default_style: Option<String>,
    ) -> Self {
        Self {
            key,
            bbox: BoundingBox::new(0.0, 0.0, 0.0, 0.0),
            datetime,
            description,
            mediatype,
            uri,
            attribute_dict,
            default_style,
            publish_state: PublishState::Pending,
            raster_stats: None,
            error_detail: None,
            revision: Uuid::new_v4(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.publish_state == PublishState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mediatype_parsing() {
        assert_eq!("GeoTIFF".parse::<MediaType>().unwrap(), MediaType::GeoTiff);
        assert_eq!("geotiff".parse::<MediaType>().unwrap(), MediaType::GeoTiff);
        assert_eq!(
            "image/tiff; application=geotiff".parse::<MediaType>().unwrap(),
            MediaType::GeoTiff
        );
        assert!(matches!(
            "image/png".parse::<MediaType>(),
            Err(CatalogError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_pending_record_shape() {
        let record = AssetRecord::pending(
            AssetKey::new("sentinel", "scene-1"),
            Utc::now(),
            "test scene".to_string(),
            MediaType::GeoTiff,
            "file:///tmp/scene.tif".to_string(),
            HashMap::new(),
            None,
        );

        assert_eq!(record.publish_state, PublishState::Pending);
        assert!(record.raster_stats.is_none());
        assert_eq!(record.key.to_string(), "sentinel/scene-1");
    }
}
