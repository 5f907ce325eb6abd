//! Request shapes for the four logical catalog operations.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use stac_common::CatalogError;

/// Search request. All filter fields are optional; an empty string is
/// equivalent to an absent filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// `"xmin, ymin, xmax, ymax"` in WGS 84 degrees.
    #[serde(default)]
    pub bounding_box: String,

    /// Comma-separated set of catalog names to restrict to.
    #[serde(default)]
    pub catalog_list: String,

    /// Substring match (complete or partial) against asset ids.
    #[serde(default)]
    pub asset_id: String,

    /// One of `"T"`, `"T1/T2"`, `"T1/.."`, `"../T2"` (RFC 3339 instants).
    #[serde(default)]
    pub datetime: String,

    /// Substring match against descriptions (case-insensitive).
    #[serde(default)]
    pub description: String,

    /// Optional cap on the number of returned features.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Publish request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub catalog: String,
    pub id: String,
    /// Must designate GeoTIFF (`"GeoTIFF"` or the STAC media type string).
    pub mediatype: String,
    /// Remote blob reference; scheme must be file, http(s), or s3.
    pub uri: String,
    #[serde(default)]
    pub description: String,
    /// Overwrite an existing `(catalog, id)` record.
    #[serde(default)]
    pub force: bool,
    /// `"Y-m-d H:M:S TZ"`; the publish acceptance time when absent.
    #[serde(default)]
    pub utc_datetime: Option<String>,
    #[serde(default)]
    pub default_style: Option<String>,
    #[serde(default)]
    pub attribute_dict: HashMap<String, serde_json::Value>,
}

/// The link flavor a fetch operation resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchType {
    /// Thumbnail-rendering URL.
    Preview,
    /// The stored blob reference, verbatim.
    Uri,
    /// WMS GetMap endpoint URL.
    Wms,
}

impl FromStr for FetchType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(FetchType::Preview),
            "uri" => Ok(FetchType::Uri),
            "wms" => Ok(FetchType::Wms),
            other => Err(CatalogError::UnsupportedFetchType(other.to_string())),
        }
    }
}

impl fmt::Display for FetchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchType::Preview => "preview",
            FetchType::Uri => "uri",
            FetchType::Wms => "wms",
        };
        f.write_str(s)
    }
}
