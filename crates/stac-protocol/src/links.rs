//! Link resolution for fetch operations.
//!
//! Builds URLs without touching raster bytes: the WMS endpoint is treated
//! purely as a link target and is never invoked from here.

use serde::{Deserialize, Serialize};

use stac_common::{AssetRecord, CatalogResult};

use crate::requests::FetchType;

const WMS_VERSION: &str = "1.3.0";
const MAP_WIDTH: u32 = 1024;
const MAP_HEIGHT: u32 = 1024;
const PREVIEW_WIDTH: u32 = 256;
const PREVIEW_HEIGHT: u32 = 256;

/// A resolved fetch link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub fetch_type: FetchType,
    pub url: String,
}

/// Resolves asset records to fetchable URLs.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    /// Base URL of the WMS rendering endpoint, without query string.
    wms_endpoint: String,
}

impl LinkResolver {
    pub fn new(wms_endpoint: impl Into<String>) -> Self {
        let mut wms_endpoint = wms_endpoint.into();
        while wms_endpoint.ends_with('/') {
            wms_endpoint.pop();
        }
        Self { wms_endpoint }
    }

    /// Produce the URL for the requested fetch type.
    ///
    /// `Uri` returns the stored blob reference verbatim; `Wms` and
    /// `Preview` construct GetMap-style URLs over the configured endpoint.
    pub fn resolve(&self, record: &AssetRecord, fetch_type: FetchType) -> CatalogResult<ResolvedLink> {
        let url = match fetch_type {
            FetchType::Uri => record.uri.clone(),
            FetchType::Wms => self.getmap_url(record, MAP_WIDTH, MAP_HEIGHT, false),
            FetchType::Preview => self.getmap_url(record, PREVIEW_WIDTH, PREVIEW_HEIGHT, true),
        };

        Ok(ResolvedLink { fetch_type, url })
    }

    fn getmap_url(&self, record: &AssetRecord, width: u32, height: u32, transparent: bool) -> String {
        let bbox = &record.bbox;
        let style = record.default_style.as_deref().unwrap_or("");

        // WMS 1.3.0 orders EPSG:4326 axes latitude-first.
        let mut url = format!(
            "{}?SERVICE=WMS&VERSION={}&REQUEST=GetMap&LAYERS={}:{}&STYLES={}&CRS=EPSG:4326&BBOX={},{},{},{}&WIDTH={}&HEIGHT={}&FORMAT=image/png",
            self.wms_endpoint,
            WMS_VERSION,
            record.key.catalog,
            record.key.id,
            style,
            bbox.min_y,
            bbox.min_x,
            bbox.max_y,
            bbox.max_x,
            width,
            height,
        );

        if transparent {
            url.push_str("&TRANSPARENT=TRUE");
        }

        url
    }
}
