//! Shared test utilities for the raster-catalog workspace.
//!
//! Provides a synthetic GeoTIFF builder and common request/record fixtures.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod geotiff;

pub use fixtures::*;
pub use geotiff::GeoTiffFixture;
