use std::collections::HashMap;

use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::error::{BuildMineError, Result};

use super::source::BuildSource;
use super::types::{Build, BuildDetail};

/// Media type that makes the build listing return `{builds, commits}` pages.
const LISTING_MEDIA_TYPE: &str = "application/vnd.travis-ci.2.1+json";
/// The detail endpoint keeps the flat legacy document (with `matrix`) under plain JSON.
const DETAIL_MEDIA_TYPE: &str = "application/json";

pub struct TravisClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl TravisClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("buildmine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BuildMineError::Config(format!("Failed to create HTTP client: {e}")))?;

        // A missing trailing slash would make `join` drop the last path segment.
        let base = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };

        let api_url = Url::parse(&base)
            .map_err(|e| BuildMineError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.header(AUTHORIZATION, format!("token {}", token.as_str()))
        } else {
            request
        }
    }

    fn builds_url(&self, repo: &str) -> Result<Url> {
        let parts: Vec<&str> = repo.split('/').collect();
        if parts.len() != 2 || parts.iter().any(|part| part.is_empty()) {
            return Err(BuildMineError::Config(format!(
                "Repository must be in format 'owner/name', got '{repo}'"
            )));
        }

        self.api_url
            .join(&format!("repos/{}/{}/builds", parts[0], parts[1]))
            .map_err(|e| BuildMineError::Config(format!("Invalid builds URL: {e}")))
    }

    fn build_url(&self, build_id: u64) -> Result<Url> {
        self.api_url
            .join(&format!("builds/{build_id}"))
            .map_err(|e| BuildMineError::Config(format!("Invalid build URL: {e}")))
    }

    async fn get_json<T>(&self, url: Url, accept: &'static str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.auth_request(self.client.get(url).header(ACCEPT, accept));
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(BuildMineError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json().await?)
    }
}

impl BuildSource for TravisClient {
    async fn list_builds(&self, repo: &str) -> Result<Vec<Build>> {
        let mut all_builds = Vec::new();
        let mut after_number: Option<String> = None;

        loop {
            let mut url = self.builds_url(repo)?;
            if let Some(after) = &after_number {
                url.query_pairs_mut().append_pair("after_number", after);
            }

            let page: BuildsPage = self.get_json(url, LISTING_MEDIA_TYPE).await?;

            let Some(last) = page.builds.last() else {
                break;
            };
            after_number = Some(last.number.clone());

            let builds = page.into_builds()?;
            debug!(
                "Fetched {} builds for {repo} (up to #{})",
                builds.len(),
                after_number.as_deref().unwrap_or_default()
            );
            all_builds.extend(builds);
        }

        Ok(all_builds)
    }

    async fn build_detail(&self, build_id: u64) -> Result<BuildDetail> {
        let url = self.build_url(build_id)?;
        self.get_json(url, DETAIL_MEDIA_TYPE).await
    }
}

/// One page of `GET /repos/{owner}/{name}/builds`.
#[derive(Deserialize)]
struct BuildsPage {
    builds: Vec<ListedBuild>,
    #[serde(default)]
    commits: Vec<ListedCommit>,
}

#[derive(Deserialize)]
struct ListedBuild {
    id: u64,
    number: String,
    commit_id: u64,
    event_type: String,
}

#[derive(Deserialize)]
struct ListedCommit {
    id: u64,
    sha: String,
    branch: String,
    message: String,
}

impl BuildsPage {
    /// Joins every build with the commit it references.
    fn into_builds(self) -> Result<Vec<Build>> {
        let commits: HashMap<u64, ListedCommit> = self
            .commits
            .into_iter()
            .map(|commit| (commit.id, commit))
            .collect();

        self.builds
            .into_iter()
            .map(|build| {
                let commit = commits.get(&build.commit_id).ok_or_else(|| {
                    BuildMineError::Api(format!(
                        "Build {} references unknown commit {}",
                        build.id, build.commit_id
                    ))
                })?;

                Ok(Build {
                    id: build.id,
                    number: build.number,
                    commit: commit.sha.clone(),
                    branch: commit.branch.clone(),
                    event_type: build.event_type,
                    message: commit.message.clone(),
                    build_info: None,
                })
            })
            .collect()
    }
}
