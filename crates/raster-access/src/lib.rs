//! Raster access layer: opens URI-addressed GeoTIFFs, samples pixel values
//! at geographic coordinates, and computes full-raster statistics.
//!
//! This is a leaf crate; it knows nothing about the catalog. The publish
//! pipeline uses it to precompute statistics during ingestion, and the
//! pixel-pick operation uses it for on-demand sampling.

pub mod access;
pub mod geotiff;
pub mod source;

pub use access::{CacheStats, PixelSample, RasterAccess};
pub use geotiff::{GeoTiff, GeoTransform};
pub use source::{validate_scheme, RasterSource, S3Config};
