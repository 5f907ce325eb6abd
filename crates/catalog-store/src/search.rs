//! Search request parsing and evaluation.
//!
//! A request parses into a [`SearchQuery`] up front so malformed filters are
//! rejected before any catalog access. Evaluation narrows through the
//! spatiotemporal index when a bbox or datetime filter is present and falls
//! back to a full scan otherwise, then applies the remaining filters and
//! orders results by key.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use stac_common::{AssetRecord, BoundingBox, CatalogError, CatalogResult, TimeFilter};
use stac_protocol::SearchRequest;

use crate::store::CatalogReader;

/// Upper bound on an unlimited search. Requests that would exceed this are
/// rejected rather than silently truncated.
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

/// A validated, normalized search. Empty request strings mean "no filter".
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub bbox: Option<BoundingBox>,
    pub time: Option<TimeFilter>,
    pub catalogs: Option<HashSet<String>>,
    pub asset_id: Option<String>,
    /// Description matching is case-insensitive; the needle is lowered once
    /// at parse time.
    pub description_lower: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn parse(request: &SearchRequest) -> CatalogResult<Self> {
        let bbox = match request.bounding_box.trim() {
            "" => None,
            raw => Some(BoundingBox::from_search_string(raw)?),
        };

        let time = match request.datetime.trim() {
            "" => None,
            raw => Some(TimeFilter::from_search_string(raw)?),
        };

        let catalogs = match request.catalog_list.trim() {
            "" => None,
            raw => {
                let names: HashSet<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    return Err(CatalogError::InvalidQuery(
                        "catalog_list contains only blank names".to_string(),
                    ));
                }
                Some(names)
            }
        };

        let asset_id = non_empty(&request.asset_id);
        let description_lower = non_empty(&request.description).map(|s| s.to_lowercase());

        if let Some(limit) = request.limit {
            if limit == 0 {
                return Err(CatalogError::InvalidQuery(
                    "limit must be at least 1".to_string(),
                ));
            }
        }

        Ok(Self {
            bbox,
            time,
            catalogs,
            asset_id,
            description_lower,
            limit: request.limit,
        })
    }

    fn uses_index(&self) -> bool {
        self.bbox.is_some() || self.time.is_some()
    }

    /// Filters the index cannot answer: catalog membership and the two
    /// substring matches.
    fn accepts(&self, record: &AssetRecord) -> bool {
        if let Some(catalogs) = &self.catalogs {
            if !catalogs.contains(&record.key.catalog) {
                return false;
            }
        }
        if let Some(needle) = &self.asset_id {
            if !record.key.id.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.description_lower {
            if !record.description.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Evaluates searches against a catalog snapshot.
#[derive(Clone)]
pub struct QueryEngine {
    reader: CatalogReader,
    max_results: usize,
}

impl QueryEngine {
    pub fn new(reader: CatalogReader) -> Self {
        Self::with_max_results(reader, DEFAULT_MAX_RESULTS)
    }

    pub fn with_max_results(reader: CatalogReader, max_results: usize) -> Self {
        Self {
            reader,
            max_results,
        }
    }

    /// Run a search. Results are ordered by `(catalog, id)` so identical
    /// requests against an unchanged catalog return identical pages.
    pub fn search(&self, request: &SearchRequest) -> CatalogResult<Vec<Arc<AssetRecord>>> {
        let query = SearchQuery::parse(request)?;

        let mut matches = if query.uses_index() {
            let mut hits = self
                .reader
                .query_index(query.bbox.as_ref(), query.time.as_ref());
            hits.retain(|record| query.accepts(record));
            hits
        } else {
            self.reader.scan(|record| query.accepts(record))
        };

        matches.sort_by(|a, b| a.key.cmp(&b.key));

        debug!(
            matched = matches.len(),
            indexed = query.uses_index(),
            "Search evaluated"
        );

        match query.limit {
            Some(limit) => {
                matches.truncate(limit.min(self.max_results));
                Ok(matches)
            }
            None if matches.len() > self.max_results => Err(CatalogError::ResultTooLarge {
                count: matches.len(),
                max: self.max_results,
            }),
            None => Ok(matches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stac_protocol::SearchRequest;

    fn empty_request() -> SearchRequest {
        SearchRequest {
            bounding_box: String::new(),
            catalog_list: String::new(),
            asset_id: String::new(),
            datetime: String::new(),
            description: String::new(),
            limit: None,
        }
    }

    #[test]
    fn test_parse_empty_request_has_no_filters() {
        let query = SearchQuery::parse(&empty_request()).unwrap();
        assert!(query.bbox.is_none());
        assert!(query.time.is_none());
        assert!(query.catalogs.is_none());
        assert!(query.asset_id.is_none());
        assert!(query.description_lower.is_none());
        assert!(!query.uses_index());
    }

    #[test]
    fn test_parse_rejects_malformed_bbox() {
        let mut request = empty_request();
        request.bounding_box = "0,0,10".to_string();
        assert!(matches!(
            SearchQuery::parse(&request),
            Err(CatalogError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_parse_rejects_zero_limit() {
        let mut request = empty_request();
        request.limit = Some(0);
        assert!(matches!(
            SearchQuery::parse(&request),
            Err(CatalogError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_parse_rejects_blank_catalog_list() {
        let mut request = empty_request();
        request.catalog_list = " , ,".to_string();
        assert!(matches!(
            SearchQuery::parse(&request),
            Err(CatalogError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_catalog_list_splits_on_commas() {
        let mut request = empty_request();
        request.catalog_list = "flood, fire,flood".to_string();
        let query = SearchQuery::parse(&request).unwrap();

        let catalogs = query.catalogs.unwrap();
        assert_eq!(catalogs.len(), 2);
        assert!(catalogs.contains("flood"));
        assert!(catalogs.contains("fire"));
    }

    #[test]
    fn test_description_needle_is_lowered() {
        let mut request = empty_request();
        request.description = "Flood Extent".to_string();
        let query = SearchQuery::parse(&request).unwrap();
        assert_eq!(query.description_lower.as_deref(), Some("flood extent"));
    }

    #[test]
    fn test_bbox_or_time_selects_index_path() {
        let mut request = empty_request();
        request.datetime = "2020-01-01/2020-12-31".to_string();
        assert!(SearchQuery::parse(&request).unwrap().uses_index());

        let mut request = empty_request();
        request.bounding_box = "0,0,10,10".to_string();
        assert!(SearchQuery::parse(&request).unwrap().uses_index());
    }
}
