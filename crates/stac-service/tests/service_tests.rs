//! Search, fetch, and pixel-pick behavior through the service facade.

use std::time::Duration;

use uuid::Uuid;

use stac_common::CatalogError;
use stac_protocol::{FetchType, JobState, SearchRequest};
use stac_service::{CatalogService, ServiceConfig};
use test_utils::fixtures::publish_request;
use test_utils::geotiff::GeoTiffFixture;

fn service() -> CatalogService {
    CatalogService::new(ServiceConfig {
        wms_endpoint: "http://wms.test/wms".to_string(),
        ..ServiceConfig::default()
    })
}

async fn publish_and_wait(service: &CatalogService, catalog: &str, id: &str, uri: &str) {
    let response = service.publish(publish_request(catalog, id, uri)).unwrap();
    let token: Uuid = response
        .callback_url
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap();

    for _ in 0..500 {
        let status = service.poll_job(token).unwrap();
        match status.status {
            JobState::InProgress => tokio::time::sleep(Duration::from_millis(5)).await,
            JobState::Done => return,
            JobState::Error => panic!("fixture ingestion failed: {:?}", status.error_detail),
        }
    }
    panic!("fixture ingestion never finished");
}

#[tokio::test]
async fn test_search_sees_published_records() {
    let dir = tempfile::tempdir().unwrap();
    // 10x10 degrees anchored at (0, 0) and (20, 20)
    let near = GeoTiffFixture::gradient(10, 10).write_to(&dir.path().join("near.tif"));
    let far = GeoTiffFixture::gradient(10, 10)
        .with_origin(20.0, 30.0)
        .write_to(&dir.path().join("far.tif"));

    let service = service();
    publish_and_wait(&service, "flood", "near", &near).await;
    publish_and_wait(&service, "flood", "far", &far).await;

    // Everything, in deterministic key order
    let all = service.search(&SearchRequest::default()).unwrap();
    let ids: Vec<&str> = all.features.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["far", "near"]);

    // Spatial filter keeps the overlapping record only
    let mut req = SearchRequest::default();
    req.bounding_box = "0,0,10,10".to_string();
    let hits = service.search(&req).unwrap();
    assert_eq!(hits.features.len(), 1);
    assert_eq!(hits.features[0].id, "near");
    assert_eq!(hits.features[0].bbox, [0.0, 0.0, 10.0, 10.0]);
}

#[tokio::test]
async fn test_fetch_uri_round_trips_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(4, 4, 2.5).write_to(&dir.path().join("c.tif"));

    let service = service();
    publish_and_wait(&service, "c", "a", &uri).await;

    let fetched = service.fetch("c", "a", FetchType::Uri).unwrap();
    assert_eq!(fetched.link, uri);
    assert_eq!(fetched.raster_min, 2.5);
    assert_eq!(fetched.raster_max, 2.5);
    assert_eq!(fetched.raster_mean, 2.5);
    assert_eq!(fetched.raster_stdev, 0.0);
}

#[tokio::test]
async fn test_fetch_wms_and_preview_links() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::gradient(4, 4).write_to(&dir.path().join("g.tif"));

    let service = service();
    publish_and_wait(&service, "c", "a", &uri).await;

    let wms = service.fetch("c", "a", FetchType::Wms).unwrap();
    assert!(wms.link.starts_with("http://wms.test/wms?SERVICE=WMS"));
    assert!(wms.link.contains("LAYERS=c:a"));

    let preview = service.fetch("c", "a", FetchType::Preview).unwrap();
    assert!(preview.link.contains("TRANSPARENT=TRUE"));
}

#[tokio::test]
async fn test_fetch_unknown_asset_is_not_found() {
    let service = service();
    assert!(matches!(
        service.fetch("c", "missing", FetchType::Uri),
        Err(CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_fetch_pending_asset_is_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(2, 2, 1.0).write_to(&dir.path().join("p.tif"));

    let service = service();
    service.publish(publish_request("c", "a", &uri)).unwrap();

    // Ingestion is still queued on the current-thread runtime
    assert!(matches!(
        service.fetch("c", "a", FetchType::Uri),
        Err(CatalogError::AssetNotReady(_))
    ));
}

#[tokio::test]
async fn test_pixel_pick_inside_and_outside_extent() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::gradient(8, 8).write_to(&dir.path().join("g.tif"));

    let service = service();
    publish_and_wait(&service, "c", "a", &uri).await;

    let picked = service.pixel_pick("c", "a", 3.5, 4.5).await.unwrap();
    assert_eq!(picked.catalog, "c");
    assert_eq!(picked.asset_id, "a");
    assert_eq!(picked.band, 0);
    assert!(!picked.is_nodata);

    // Consistent with the ingested statistics
    let fetched = service.fetch("c", "a", FetchType::Uri).unwrap();
    assert!(picked.value >= fetched.raster_min && picked.value <= fetched.raster_max);

    assert!(matches!(
        service.pixel_pick("c", "a", 500.0, 500.0).await,
        Err(CatalogError::OutOfBounds(_))
    ));
}

#[tokio::test]
async fn test_pixel_pick_reports_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let uri = GeoTiffFixture::constant(4, 4, 5.0)
        .with_nodata(-9999.0)
        .set_pixel(0, 0, -9999.0)
        .write_to(&dir.path().join("holes.tif"));

    let service = service();
    publish_and_wait(&service, "c", "a", &uri).await;

    // top-left pixel covers x in [0,1), y in (3,4]
    let hole = service.pixel_pick("c", "a", 0.5, 3.5).await.unwrap();
    assert!(hole.is_nodata);
    assert_eq!(hole.value, -9999.0);
}

#[tokio::test]
async fn test_pixel_pick_on_failed_asset_is_not_ready() {
    let service = service();
    let response = service
        .publish(publish_request("c", "bad", "file:///nonexistent/bad.tif"))
        .unwrap();
    let token: Uuid = response
        .callback_url
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap();

    for _ in 0..500 {
        if service.poll_job(token).unwrap().status != JobState::InProgress {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(matches!(
        service.pixel_pick("c", "bad", 0.5, 0.5).await,
        Err(CatalogError::AssetNotReady(_))
    ));
}
