//! Publish job tracking.
//!
//! Every accepted publish request gets an opaque token into this table.
//! Callers poll the token until the job reaches a terminal state; the poll
//! never blocks on the ingestion itself. Completed jobs stay pollable until
//! the retention window pushes them out.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use stac_common::{AssetKey, CatalogError, CatalogResult};
use stac_protocol::{JobState, JobStatusResponse};

/// One publish job as tracked across its lifetime.
#[derive(Debug, Clone)]
pub struct PublishJob {
    pub token: Uuid,
    pub target: AssetKey,
    pub status: JobState,
    pub error_detail: Option<String>,
    pub started_at: DateTime<Utc>,
}

struct JobsInner {
    jobs: HashMap<Uuid, PublishJob>,
    // Terminal jobs in completion order, oldest first.
    finished: VecDeque<Uuid>,
}

/// Token-keyed table of publish jobs.
pub struct JobTable {
    inner: Mutex<JobsInner>,
    retention: usize,
}

impl JobTable {
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Mutex::new(JobsInner {
                jobs: HashMap::new(),
                finished: VecDeque::new(),
            }),
            retention: retention.max(1),
        }
    }

    /// Register a new in-progress job and hand back its token.
    pub fn create(&self, target: AssetKey) -> Uuid {
        let token = Uuid::new_v4();
        let job = PublishJob {
            token,
            target: target.clone(),
            status: JobState::InProgress,
            error_detail: None,
            started_at: Utc::now(),
        };

        self.lock().jobs.insert(token, job);
        debug!(%token, %target, "Created publish job");
        token
    }

    /// Mark a job done.
    pub fn complete(&self, token: Uuid) {
        self.finish(token, JobState::Done, None);
    }

    /// Mark a job failed with the ingestion error detail.
    pub fn fail(&self, token: Uuid, detail: String) {
        self.finish(token, JobState::Error, Some(detail));
    }

    fn finish(&self, token: Uuid, status: JobState, detail: Option<String>) {
        let mut inner = self.lock();

        let Some(job) = inner.jobs.get_mut(&token) else {
            // Retention already dropped it; nothing left to record.
            debug!(%token, "Completion for an evicted job");
            return;
        };
        job.status = status;
        job.error_detail = detail;

        inner.finished.push_back(token);
        while inner.finished.len() > self.retention {
            if let Some(evicted) = inner.finished.pop_front() {
                inner.jobs.remove(&evicted);
            }
        }
    }

    /// Non-blocking poll. Unknown (or since-evicted) tokens are
    /// distinguishable from every real job state.
    pub fn poll(&self, token: Uuid) -> CatalogResult<JobStatusResponse> {
        let inner = self.lock();
        let job = inner
            .jobs
            .get(&token)
            .ok_or_else(|| CatalogError::UnknownToken(token.to_string()))?;

        Ok(JobStatusResponse {
            token,
            status: job.status,
            started_at: job.started_at,
            error_detail: job.error_detail.clone(),
        })
    }

    /// Number of tracked jobs, terminal ones included.
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock means a panicking writer; the table may be
    // inconsistent and must not be silently repaired.
    fn lock(&self) -> MutexGuard<'_, JobsInner> {
        self.inner.lock().expect("job table corrupted (poisoned lock)")
    }
}
