//! Common types and utilities shared across all raster-catalog crates.

pub mod asset;
pub mod bbox;
pub mod error;
pub mod time;

pub use asset::{AssetKey, AssetRecord, MediaType, PublishState, RasterStats};
pub use bbox::BoundingBox;
pub use error::{CatalogError, CatalogResult};
pub use time::TimeFilter;
