//! JSONL session scripts.
//!
//! Each line is one operation against the in-memory catalog. Responses and
//! errors print as JSON so script output is easy to diff and pipe.
//!
//! ```text
//! {"op":"publish","catalog":"flood","id":"a","mediatype":"GeoTIFF","uri":"file:///tmp/a.tif","wait":true}
//! {"op":"search","bounding_box":"0,0,10,10"}
//! {"op":"fetch","catalog":"flood","asset_id":"a","type":"uri"}
//! {"op":"pick","catalog":"flood","asset_id":"a","lng":1.5,"lat":2.5}
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use stac_common::{CatalogError, CatalogResult};
use stac_protocol::{FetchType, JobState, PublishRequest, SearchRequest};
use stac_service::CatalogService;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const WAIT_MAX_POLLS: usize = 600;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ScriptOp {
    Publish {
        #[serde(flatten)]
        request: PublishRequest,
        /// Poll the job to a terminal state before the next op runs.
        #[serde(default)]
        wait: bool,
    },
    Poll {
        token: Uuid,
    },
    Search {
        #[serde(flatten)]
        request: SearchRequest,
    },
    Fetch {
        catalog: String,
        asset_id: String,
        #[serde(rename = "type")]
        fetch_type: String,
    },
    Pick {
        catalog: String,
        asset_id: String,
        lng: f64,
        lat: f64,
    },
}

/// Execute every line of the script in order, printing one JSON document
/// per op. Catalog errors are printed and do not abort the session.
pub async fn run(service: &CatalogService, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let op: ScriptOp = serde_json::from_str(line)
            .with_context(|| format!("line {}: malformed operation", lineno + 1))?;

        match execute(service, op).await {
            Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
            Err(err) => {
                warn!(line = lineno + 1, error = %err, "Operation failed");
                let output = json!({
                    "error": { "status": err.status_code(), "message": err.to_string() }
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
    }

    Ok(())
}

async fn execute(service: &CatalogService, op: ScriptOp) -> CatalogResult<serde_json::Value> {
    match op {
        ScriptOp::Publish { request, wait } => {
            let response = service.publish(request)?;
            if wait {
                let token = token_of(&response.callback_url)?;
                let status = await_terminal(service, token).await?;
                return Ok(json!({
                    "callback_url": response.callback_url,
                    "job": status,
                }));
            }
            Ok(serde_json::to_value(response)?)
        }
        ScriptOp::Poll { token } => Ok(serde_json::to_value(service.poll_job(token)?)?),
        ScriptOp::Search { request } => Ok(serde_json::to_value(service.search(&request)?)?),
        ScriptOp::Fetch {
            catalog,
            asset_id,
            fetch_type,
        } => {
            let fetch_type: FetchType = fetch_type.parse()?;
            Ok(serde_json::to_value(
                service.fetch(&catalog, &asset_id, fetch_type)?,
            )?)
        }
        ScriptOp::Pick {
            catalog,
            asset_id,
            lng,
            lat,
        } => Ok(serde_json::to_value(
            service.pixel_pick(&catalog, &asset_id, lng, lat).await?,
        )?),
    }
}

fn token_of(callback_url: &str) -> CatalogResult<Uuid> {
    callback_url
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CatalogError::InternalError(format!("malformed callback url {}", callback_url)))
}

async fn await_terminal(
    service: &CatalogService,
    token: Uuid,
) -> CatalogResult<stac_protocol::JobStatusResponse> {
    for _ in 0..WAIT_MAX_POLLS {
        let status = service.poll_job(token)?;
        if status.status != JobState::InProgress {
            return Ok(status);
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }

    // Give the caller the live state rather than inventing a timeout.
    service.poll_job(token)
}
