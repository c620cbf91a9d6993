use crate::error::Result;

use super::types::{Build, BuildDetail};

/// Capability interface over a CI provider's build API.
///
/// The fetcher only needs these two calls, so an alternate provider or a test
/// double can stand in for [`TravisClient`](super::client::TravisClient).
#[allow(async_fn_in_trait)]
pub trait BuildSource {
    /// Lists every build of `repo`, following pagination to the end.
    async fn list_builds(&self, repo: &str) -> Result<Vec<Build>>;

    /// Fetches the job matrix and commit metadata of a single build.
    async fn build_detail(&self, build_id: u64) -> Result<BuildDetail>;
}
