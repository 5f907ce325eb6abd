//! Raster access over real encoded GeoTIFFs on local storage.

use raster_access::{GeoTiff, RasterAccess};
use stac_common::CatalogError;
use test_utils::geotiff::GeoTiffFixture;

#[tokio::test]
async fn test_open_decodes_dimensions_and_extent() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::gradient(8, 4).write_to(&dir.path().join("grad.tif"));

    let access = RasterAccess::new(None);
    let tif = access.open(&uri).await.unwrap();

    assert_eq!(tif.width, 8);
    assert_eq!(tif.height, 4);
    // gradient() anchors the origin at (0, height) with one degree pixels
    let bbox = tif.bbox();
    assert_eq!(bbox.min_x, 0.0);
    assert_eq!(bbox.max_x, 8.0);
    assert_eq!(bbox.min_y, 0.0);
    assert_eq!(bbox.max_y, 4.0);
}

#[tokio::test]
async fn test_sample_inside_extent_returns_pixel_value() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(4, 4, 7.5).write_to(&dir.path().join("const.tif"));

    let access = RasterAccess::new(None);
    let sample = access.sample(&uri, 1.5, 2.5).await.unwrap();

    assert_eq!(sample.value, 7.5);
    assert_eq!(sample.band, 0);
    assert!(!sample.is_nodata);
}

#[tokio::test]
async fn test_sample_outside_extent_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(4, 4, 1.0).write_to(&dir.path().join("const.tif"));

    let access = RasterAccess::new(None);
    let err = access.sample(&uri, 100.0, 100.0).await.unwrap_err();
    assert!(matches!(err, CatalogError::OutOfBounds(_)));
}

#[tokio::test]
async fn test_sample_on_nodata_pixel_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(4, 4, 5.0)
        .with_nodata(-9999.0)
        .set_pixel(0, 0, -9999.0)
        .write_to(&dir.path().join("holes.tif"));

    let access = RasterAccess::new(None);

    // top-left pixel covers x in [0,1), y in (3,4]
    let hole = access.sample(&uri, 0.5, 3.5).await.unwrap();
    assert!(hole.is_nodata);
    assert_eq!(hole.value, -9999.0);

    let valid = access.sample(&uri, 2.5, 0.5).await.unwrap();
    assert!(!valid.is_nodata);
    assert_eq!(valid.value, 5.0);
}

#[tokio::test]
async fn test_statistics_exclude_nodata() {
    let dir = tempfile::tempdir().unwrap();
    // 2x2: three valid pixels {2, 4, 6} and one nodata hole
    let uri = GeoTiffFixture::constant(2, 2, 0.0)
        .with_nodata(-1.0)
        .with_pixels(vec![2.0, 4.0, 6.0, -1.0])
        .write_to(&dir.path().join("stats.tif"));

    let access = RasterAccess::new(None);
    let stats = access.statistics(&uri).await.unwrap();

    assert_eq!(stats.min, 2.0);
    assert_eq!(stats.max, 6.0);
    assert!((stats.mean - 4.0).abs() < 1e-9);
    // population stdev of {2, 4, 6}
    assert!((stats.stdev - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
}

#[tokio::test]
async fn test_statistics_of_all_nodata_raster_fail() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(2, 2, -1.0)
        .with_nodata(-1.0)
        .write_to(&dir.path().join("empty.tif"));

    let access = RasterAccess::new(None);
    let err = access.statistics(&uri).await.unwrap_err();
    assert!(matches!(err, CatalogError::UnreadableRaster(_)));
}

#[tokio::test]
async fn test_repeated_opens_hit_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::gradient(4, 4).write_to(&dir.path().join("grad.tif"));

    let access = RasterAccess::new(None);
    access.open(&uri).await.unwrap();
    access.sample(&uri, 1.5, 1.5).await.unwrap();
    access.statistics(&uri).await.unwrap();

    let stats = access.cache_stats().await;
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert!((stats.hit_rate() - 200.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_sampled_values_lie_within_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::gradient(8, 8).write_to(&dir.path().join("grad.tif"));

    let access = RasterAccess::new(None);
    let stats = access.statistics(&uri).await.unwrap();

    for (lng, lat) in [(0.5, 0.5), (3.5, 4.5), (7.5, 7.5)] {
        let sample = access.sample(&uri, lng, lat).await.unwrap();
        assert!(sample.value >= stats.min && sample.value <= stats.max);
    }
}

#[tokio::test]
async fn test_missing_file_surfaces_storage_error() {
    let access = RasterAccess::new(None);
    let err = access.open("file:///nonexistent/missing.tif").await.unwrap_err();
    assert!(matches!(err, CatalogError::StorageError(_)));
}

#[test]
fn test_fixture_bytes_decode_directly() {
    let fixture = GeoTiffFixture::gradient(3, 2);
    let bytes = bytes::Bytes::from(fixture.to_bytes());
    let tif = GeoTiff::from_bytes(&bytes).unwrap();

    assert_eq!(tif.width, 3);
    assert_eq!(tif.height, 2);
    assert_eq!(tif.bands, 1);
    // row-major ramp starts at zero
    assert_eq!(tif.value_at_pixel(0, 0, 0), Some(0.0));
}
