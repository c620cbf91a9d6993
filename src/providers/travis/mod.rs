mod cache;
mod client;
mod jobs;
mod progress_bar;
mod provider;
mod source;
mod types;


pub use cache::BuildCache;
pub use provider::TravisProvider;
pub use source::BuildSource;
pub use types::{Build, BuildDetail, JobFetch, JobRecord, MatrixJob, MiningProgress};
