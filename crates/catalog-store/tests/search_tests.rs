//! End-to-end search behavior over a populated catalog.

use catalog_store::{Catalog, CatalogWriter, QueryEngine};
use stac_common::{BoundingBox, CatalogError};
use stac_protocol::SearchRequest;
use test_utils::fixtures::ready_record;

fn request() -> SearchRequest {
    SearchRequest {
        bounding_box: String::new(),
        catalog_list: String::new(),
        asset_id: String::new(),
        datetime: String::new(),
        description: String::new(),
        limit: None,
    }
}

fn seed(writer: &CatalogWriter) {
    // Two catalogs, spread across space and time.
    let fixtures = vec![
        ready_record(
            "flood",
            "extent-2020-06",
            BoundingBox::new(5.0, 5.0, 15.0, 15.0),
            "2020-06-15T00:00:00",
        ),
        ready_record(
            "flood",
            "extent-2021-01",
            BoundingBox::new(20.0, 20.0, 30.0, 30.0),
            "2021-01-01T00:00:00",
        ),
        ready_record(
            "fire",
            "burn-severity-2020",
            BoundingBox::new(-120.0, 35.0, -110.0, 40.0),
            "2020-09-01T12:00:00",
        ),
    ];

    for mut record in fixtures {
        record.description = format!("Raster layer {}", record.key.id);
        writer.upsert(record, false).unwrap();
    }
}

#[test]
fn test_empty_search_returns_everything_in_key_order() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let results = engine.search(&request()).unwrap();
    let ids: Vec<String> = results.iter().map(|r| r.key.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "fire/burn-severity-2020",
            "flood/extent-2020-06",
            "flood/extent-2021-01",
        ]
    );

    // Deterministic across repeated evaluation
    let again: Vec<String> = engine
        .search(&request())
        .unwrap()
        .iter()
        .map(|r| r.key.to_string())
        .collect();
    assert_eq!(ids, again);
}

#[test]
fn test_bbox_filter_keeps_overlapping_excludes_disjoint() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.bounding_box = "0,0,10,10".to_string();
    let results = engine.search(&req).unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.key.id.as_str()).collect();
    assert_eq!(ids, vec!["extent-2020-06"]);
}

#[test]
fn test_datetime_range_is_inclusive_of_year() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.datetime = "2020-01-01/2020-12-31".to_string();
    let results = engine.search(&req).unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.key.id.as_str()).collect();
    assert_eq!(ids, vec!["burn-severity-2020", "extent-2020-06"]);
}

#[test]
fn test_open_ended_datetime_range() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.datetime = "2021-01-01/..".to_string();
    let results = engine.search(&req).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key.id, "extent-2021-01");
}

#[test]
fn test_catalog_list_restricts_membership() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.catalog_list = "fire".to_string();
    let results = engine.search(&req).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key.catalog, "fire");
}

#[test]
fn test_asset_id_substring_is_case_sensitive() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.asset_id = "extent".to_string();
    assert_eq!(engine.search(&req).unwrap().len(), 2);

    req.asset_id = "EXTENT".to_string();
    assert!(engine.search(&req).unwrap().is_empty());
}

#[test]
fn test_description_substring_is_case_insensitive() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.description = "RASTER LAYER BURN".to_string();
    let results = engine.search(&req).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key.id, "burn-severity-2020");
}

#[test]
fn test_combined_bbox_and_catalog_filters() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.bounding_box = "-130,30,-100,45".to_string();
    req.catalog_list = "flood".to_string();
    assert!(engine.search(&req).unwrap().is_empty());

    req.catalog_list = "fire".to_string();
    assert_eq!(engine.search(&req).unwrap().len(), 1);
}

#[test]
fn test_limit_truncates_after_ordering() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::new(reader);

    let mut req = request();
    req.limit = Some(2);
    let results = engine.search(&req).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].key.to_string(), "fire/burn-severity-2020");
    assert_eq!(results[1].key.to_string(), "flood/extent-2020-06");
}

#[test]
fn test_record_awaiting_ingestion_is_excluded_from_bbox_search() {
    use chrono::Utc;
    use stac_common::{AssetKey, AssetRecord, MediaType};
    use std::collections::HashMap;

    let (writer, reader) = Catalog::new();
    seed(&writer);

    // Upserted as the publish pipeline would: extent not yet known
    let queued = AssetRecord::pending(
        AssetKey::new("flood", "queued-1"),
        Utc::now(),
        "queued for ingestion".to_string(),
        MediaType::GeoTiff,
        "s3://imagery/queued-1.tif".to_string(),
        HashMap::new(),
        None,
    );
    writer.upsert(queued, false).unwrap();

    let engine = QueryEngine::new(reader);

    // A bbox filter touching the origin must not pick up the placeholder
    let mut req = request();
    req.bounding_box = "-1,-1,1,1".to_string();
    assert!(engine.search(&req).unwrap().is_empty());

    // Non-spatial filters still reach the record
    let mut req = request();
    req.asset_id = "queued".to_string();
    let results = engine.search(&req).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key.id, "queued-1");
}

#[test]
fn test_unlimited_search_over_cap_is_rejected() {
    let (writer, reader) = Catalog::new();
    seed(&writer);
    let engine = QueryEngine::with_max_results(reader, 2);

    let err = engine.search(&request()).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::ResultTooLarge { count: 3, max: 2 }
    ));

    // An explicit limit inside the cap still succeeds
    let mut req = request();
    req.limit = Some(2);
    assert_eq!(engine.search(&req).unwrap().len(), 2);
}
