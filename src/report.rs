use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::travis::{JobFetch, JobRecord, MiningProgress};

/// JSON document written by `buildmine jobs`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobsReport {
    pub provider: String,
    pub repo: String,
    pub collected_at: DateTime<Utc>,
    pub progress: MiningProgress,
    pub jobs: Vec<JobRecord>,
}

impl JobsReport {
    pub fn new(repo: &str, fetch: JobFetch) -> Self {
        Self {
            provider: "Travis CI".to_string(),
            repo: repo.to_string(),
            collected_at: Utc::now(),
            progress: fetch.progress,
            jobs: fetch.jobs,
        }
    }
}
