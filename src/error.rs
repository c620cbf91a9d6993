use std::path::PathBuf;

use thiserror::Error;

use crate::providers::travis::MiningProgress;

#[derive(Error, Debug)]
pub enum BuildMineError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Travis API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Encountered an error while downloading builds for repository {repo}.")]
    BuildListing {
        repo: String,
        #[source]
        source: Box<BuildMineError>,
    },

    #[error("Encountered an error while downloading build info for build {build_id}.")]
    BuildDetail {
        build_id: u64,
        #[source]
        source: Box<BuildMineError>,
    },

    #[error("Did not get any jobs for {repo}.")]
    NoJobs {
        repo: String,
        progress: MiningProgress,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("{} is not a file.", .0.display())]
    NotAFile(PathBuf),
}

pub type Result<T> = std::result::Result<T, BuildMineError>;
