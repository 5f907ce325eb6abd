//! Common request and record fixtures.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};

use stac_common::{AssetKey, AssetRecord, BoundingBox, MediaType, PublishState, RasterStats};
use stac_protocol::PublishRequest;

/// A minimal valid publish request for the given identity and URI.
pub fn publish_request(catalog: &str, id: &str, uri: &str) -> PublishRequest {
    PublishRequest {
        catalog: catalog.to_string(),
        id: id.to_string(),
        mediatype: "GeoTIFF".to_string(),
        uri: uri.to_string(),
        description: format!("fixture asset {}", id),
        force: false,
        utc_datetime: None,
        default_style: None,
        attribute_dict: HashMap::new(),
    }
}

/// A `Ready` asset record with plausible stats, bbox, and datetime.
pub fn ready_record(catalog: &str, id: &str, bbox: BoundingBox, datetime: &str) -> AssetRecord {
    let naive = chrono::NaiveDateTime::parse_from_str(datetime, "%Y-%m-%dT%H:%M:%S")
        .expect("fixture datetime");

    let mut record = AssetRecord::pending(
        AssetKey::new(catalog, id),
        Utc.from_utc_datetime(&naive),
        format!("fixture asset {}", id),
        MediaType::GeoTiff,
        format!("s3://imagery/{}/{}.tif", catalog, id),
        HashMap::new(),
        None,
    );

    record.bbox = bbox;
    record.publish_state = PublishState::Ready;
    record.raster_stats = Some(RasterStats {
        min: 0.0,
        max: 100.0,
        mean: 50.0,
        stdev: 10.0,
    });

    record
}
