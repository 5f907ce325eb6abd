//! Datetime parsing for search filters and publish requests.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{CatalogError, CatalogResult};

/// A temporal filter parsed from the search `datetime` grammar.
///
/// Supports four forms:
/// - exact instant: `"2020-06-15T00:00:00Z"`
/// - bounded range: `"2020-01-01T00:00:00Z/2020-12-31T23:59:59Z"`
/// - open lower bound: `"2020-01-01T00:00:00Z/.."`
/// - open upper bound: `"../2020-12-31T23:59:59Z"`
///
/// A record matches if its datetime falls in `[start, end]` inclusive; an
/// absent bound matches everything on that side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeFilter {
    /// Parse the search `datetime` grammar. Fails with `InvalidQuery` on
    /// malformed input, including a fully open `"../.."` range.
    pub fn from_search_string(s: &str) -> CatalogResult<Self> {
        let invalid = |msg: &str| CatalogError::InvalidQuery(format!("datetime '{}': {}", s, msg));

        if let Some((start, end)) = s.split_once('/') {
            let start = match start {
                ".." => None,
                _ => Some(parse_iso8601(start)?),
            };
            let end = match end {
                ".." => None,
                _ => Some(parse_iso8601(end)?),
            };

            if start.is_none() && end.is_none() {
                return Err(invalid("both bounds open"));
            }
            if let (Some(t1), Some(t2)) = (start, end) {
                if t1 > t2 {
                    return Err(invalid("start after end"));
                }
            }

            return Ok(Self { start, end });
        }

        // Exact instant degenerates to start == end
        let instant = parse_iso8601(s)?;
        Ok(Self {
            start: Some(instant),
            end: Some(instant),
        })
    }

    /// Check whether a datetime falls within the filter (inclusive bounds).
    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        if let Some(start) = &self.start {
            if dt < start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if dt > end {
                return false;
            }
        }
        true
    }
}

/// Parse an ISO 8601 / RFC 3339 datetime string.
///
/// Accepts a full datetime with timezone, a naive datetime (assumed UTC),
/// or a bare date (midnight UTC).
pub fn parse_iso8601(s: &str) -> CatalogResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S")
    {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(CatalogError::InvalidQuery(format!(
        "invalid datetime: {}",
        s
    )))
}

/// Parse the publish request `utc_datetime` field: `"Y-m-d H:M:S TZ"`.
///
/// The zone designator may be `UTC`, `Z`, or a numeric offset; it may also
/// be omitted entirely, in which case UTC is assumed. Fails with
/// `InvalidDatetime` on anything else.
pub fn parse_publish_datetime(s: &str) -> CatalogResult<DateTime<Utc>> {
    let trimmed = s.trim();

    // Numeric offset form, e.g. "2020-06-15 12:00:00 +02:00"
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive_part = trimmed
        .strip_suffix(" UTC")
        .or_else(|| trimmed.strip_suffix(" Z"))
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed)
        .trim_end();

    NaiveDateTime::parse_from_str(naive_part, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|_| CatalogError::InvalidDatetime(s.to_string()))
}
