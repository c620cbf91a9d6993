use std::path::PathBuf;
use std::time::Instant;

use log::{info, warn};

use crate::auth::Token;
use crate::error::{BuildMineError, Result};

use super::cache::BuildCache;
use super::client::TravisClient;
use super::jobs::flatten_jobs;
use super::progress_bar::PhaseProgress;
use super::source::BuildSource;
use super::types::{Build, JobFetch, MiningProgress};

/// Log a progress line every this many downloaded build details.
const DETAIL_LOG_INTERVAL: usize = 500;

/// Travis CI job miner.
///
/// Reconstructs the job/build/commit rows of a repository from the Travis API,
/// checkpointing the raw API results on disk so reruns never hit the network.
pub struct TravisProvider<S = TravisClient> {
    pub source: S,
    pub cache_dir: PathBuf,
}

impl TravisProvider<TravisClient> {
    /// Creates a provider backed by the Travis HTTP API.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Travis API base URL (e.g., <https://api.travis-ci.org>)
    /// * `cache_dir` - Directory holding the per-repository checkpoints
    /// * `token` - Optional API token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the URL is invalid.
    pub fn new(base_url: &str, cache_dir: PathBuf, token: Option<Token>) -> Result<Self> {
        let client = TravisClient::new(base_url, token)?;
        Ok(Self::with_source(client, cache_dir))
    }
}

impl<S: BuildSource> TravisProvider<S> {
    pub fn with_source(source: S, cache_dir: PathBuf) -> Self {
        Self { source, cache_dir }
    }

    /// Fetches every job of `repo` as a flattened record.
    ///
    /// Steps:
    /// 1. Load the build list checkpoint, or list builds and save it
    /// 2. Load the build info checkpoint, or download each build's detail and save it
    /// 3. Flatten builds into job records and compute the mining progress
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Listing builds fails (`BuildListing`, nothing is cached)
    /// - Any build detail download fails (`BuildDetail`, nothing is cached)
    /// - A checkpoint cannot be read or written
    /// - No jobs were found (`NoJobs`, which still carries the progress counters)
    pub async fn fetch_jobs(&self, repo: &str) -> Result<JobFetch> {
        let cache = BuildCache::new(&self.cache_dir, repo)?;

        let builds = self.load_or_list_builds(repo, &cache).await?;
        let builds = self.load_or_fetch_build_info(builds, &cache).await?;

        let jobs = flatten_jobs(&builds)?;
        let progress = MiningProgress::from_builds(&builds, jobs.len());

        if jobs.is_empty() {
            let err = BuildMineError::NoJobs {
                repo: repo.to_string(),
                progress,
            };
            warn!("{err}");
            return Err(err);
        }

        info!(
            "Mined {} jobs from {} builds for {repo}",
            progress.jobs, progress.builds
        );

        Ok(JobFetch { jobs, progress })
    }

    async fn load_or_list_builds(&self, repo: &str, cache: &BuildCache) -> Result<Vec<Build>> {
        if let Some(builds) = cache.load_builds()? {
            info!("Using cached build list: {}", cache.builds_file().display());
            return Ok(builds);
        }

        info!("Getting the list of builds...");
        let start = Instant::now();
        let progress = PhaseProgress::start_listing(repo);

        let builds = match self.source.list_builds(repo).await {
            Ok(builds) => builds,
            Err(source) => {
                progress.abandon();
                return Err(BuildMineError::BuildListing {
                    repo: repo.to_string(),
                    source: Box::new(source),
                });
            }
        };
        progress.finish_listing(builds.len());

        cache.save_builds(&builds)?;
        info!(
            "Got the list of builds in {:.2} seconds.",
            start.elapsed().as_secs_f64()
        );

        Ok(builds)
    }

    async fn load_or_fetch_build_info(
        &self,
        mut builds: Vec<Build>,
        cache: &BuildCache,
    ) -> Result<Vec<Build>> {
        if let Some(enriched) = cache.load_build_info()? {
            info!("Using cached build info: {}", cache.build_info_file().display());
            return Ok(enriched);
        }

        info!(
            "Downloading build info for {} builds... This step may take several minutes for large repositories.",
            builds.len()
        );
        let start = Instant::now();
        let progress = PhaseProgress::start_details(builds.len());

        for (idx, build) in builds.iter_mut().enumerate() {
            let detail = match self.source.build_detail(build.id).await {
                Ok(detail) => detail,
                Err(source) => {
                    progress.abandon();
                    return Err(BuildMineError::BuildDetail {
                        build_id: build.id,
                        source: Box::new(source),
                    });
                }
            };
            build.build_info = Some(detail);
            progress.inc();

            if (idx + 1) % DETAIL_LOG_INTERVAL == 0 {
                info!("Downloaded build info for {} builds so far...", idx + 1);
            }
        }
        progress.finish_details();

        cache.save_build_info(&builds)?;
        info!(
            "Downloaded build info in {:.2} seconds.",
            start.elapsed().as_secs_f64()
        );

        Ok(builds)
    }
}
