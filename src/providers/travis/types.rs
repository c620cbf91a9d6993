use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Language recorded for jobs whose config does not name one.
pub const DEFAULT_LANGUAGE: &str = "ruby";

/// Event type Travis assigns to pull request builds.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// A Travis CI build as listed for a repository.
///
/// Listing data is joined with its commit (sha, branch, message). Once the
/// per-build detail has been downloaded it is attached as `build_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// Travis build ID
    pub id: u64,
    /// Build number within the repository (e.g., "1234")
    pub number: String,
    /// Commit SHA the build ran against
    pub commit: String,
    /// Branch name
    pub branch: String,
    /// Trigger event (e.g., "push", "pull_request", "cron")
    pub event_type: String,
    /// Commit message
    pub message: String,
    /// Detailed build info, present once enriched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_info: Option<BuildDetail>,
}

impl Build {
    pub fn is_pull_request(&self) -> bool {
        self.event_type == PULL_REQUEST_EVENT
    }
}

/// Detailed build document returned by `GET /builds/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDetail {
    /// Overall result: 0 on success, anything else (or null) otherwise
    pub result: Option<i64>,
    pub event_type: String,
    pub committed_at: Option<String>,
    pub compare_url: Option<String>,
    pub committer_name: Option<String>,
    /// Jobs of the build, one per configuration
    pub matrix: Vec<MatrixJob>,
}

/// A single job of a build matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixJob {
    pub id: u64,
    /// Job number (e.g., "1234.2")
    pub number: String,
    /// Job configuration as written in `.travis.yml` after expansion
    pub config: Value,
    /// 0 on success; null when the job errored
    pub result: Option<i64>,
    pub finished_at: Option<String>,
}

impl MatrixJob {
    pub fn language(&self) -> Option<&str> {
        self.config.get("language").and_then(Value::as_str)
    }

    pub fn is_failed(&self) -> bool {
        self.result != Some(0)
    }
}

/// A job joined with its build and commit data.
///
/// Mirrors a row of `jobs ⋈ builds ⋈ commits`, so downstream steps can treat
/// API-mined data exactly like database rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: u64,
    pub job_number: String,
    pub config: Value,
    pub result: Option<i64>,
    pub build_id: u64,
    pub number: String,
    pub finished_at: Option<String>,
    pub commit: String,
    pub message: String,
    pub branch: String,
    pub event_type: String,
    pub committed_at: Option<String>,
    pub compare_at: Option<String>,
    pub committer_name: Option<String>,
    pub language: String,
}

/// Aggregate counts describing how much of a repository was mined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningProgress {
    pub builds: usize,
    pub jobs: usize,
    pub failed_builds: usize,
    pub failed_jobs: usize,
    pub failed_pr_builds: usize,
    pub failed_pr_jobs: usize,
}

/// Result of a successful job fetch.
#[derive(Debug, Clone)]
pub struct JobFetch {
    pub jobs: Vec<JobRecord>,
    pub progress: MiningProgress,
}
