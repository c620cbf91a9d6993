use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::build_script::{self, UnflaggedMavenLine};
use crate::config::Config;
use crate::error::BuildMineError;
use crate::output;
use crate::providers::travis::{BuildCache, TravisProvider};
use crate::report::JobsReport;

#[derive(Parser)]
#[command(name = "buildmine")]
#[command(author, version, about = "Travis job mining and build script patching", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./buildmine.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine every job of a repository from the Travis API
    Jobs {
        /// Repository slug (e.g., "owner/name")
        #[arg(short, long)]
        repo: String,

        #[arg(short, long, env = "TRAVIS_TOKEN")]
        token: Option<String>,

        /// Travis API base URL
        #[arg(short, long)]
        url: Option<String>,

        /// Directory for the build list checkpoints
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Remove the repository's checkpoints before mining
        #[arg(long, default_value_t = false)]
        clear_cache: bool,
    },

    /// Replace the checkout section of a build script with a cd into the repository
    RewriteCheckout {
        /// Repository slug (e.g., "owner/name")
        #[arg(short, long)]
        repo: String,

        /// Build script to rewrite in place
        #[arg(long)]
        path: PathBuf,
    },

    /// Force TLS 1.2 for every mvn invocation of a build script
    PatchTls {
        /// Build script to rewrite in place
        #[arg(long)]
        path: PathBuf,

        /// Drop mvn lines without any flag instead of keeping them
        #[arg(long, default_value_t = false)]
        drop_unflagged: bool,
    },
}

impl Cli {
    #[allow(clippy::too_many_arguments)]
    async fn execute_jobs(
        &self,
        config: &Config,
        repo: &str,
        token: Option<&str>,
        url: Option<&str>,
        cache_dir: Option<&Path>,
        clear_cache: bool,
    ) -> Result<()> {
        info!("Mining Travis jobs for repository: {}", repo);

        let token = token
            .or(config.travis.token.as_deref())
            .map(Token::from);
        let base_url = url.unwrap_or(&config.travis.base_url);
        let cache_dir = match cache_dir.or(config.travis.cache_dir.as_deref()) {
            Some(dir) => dir.to_path_buf(),
            None => BuildCache::default_dir()?,
        };

        if clear_cache {
            BuildCache::new(&cache_dir, repo)?.clear()?;
        }

        let provider = TravisProvider::new(base_url, cache_dir, token)?;

        let result = provider.fetch_jobs(repo).await;
        if let Err(BuildMineError::NoJobs { progress, .. }) = &result {
            output::print_progress(repo, progress);
        }
        let fetch = result?;
        output::print_progress(repo, &fetch.progress);

        let report = JobsReport::new(repo, fetch);
        let json_output = if self.pretty || config.output.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Jobs written to: {}", output_path.display());
        } else {
            println!("{}", json_output);
        }

        Ok(())
    }

    fn execute_rewrite_checkout(&self, repo: &str, path: &Path) -> Result<()> {
        build_script::rewrite_checkout(repo, path)
            .with_context(|| format!("Failed to rewrite checkout in {}", path.display()))?;
        eprintln!(
            "{} {}",
            output::bright_green("✓ Rewrote checkout section of"),
            path.display()
        );
        Ok(())
    }

    fn execute_patch_tls(&self, config: &Config, path: &Path, drop_unflagged: bool) -> Result<()> {
        let policy = if drop_unflagged {
            UnflaggedMavenLine::Drop
        } else {
            config.build_script.unflagged_policy()
        };

        build_script::patch_maven_tls(path, policy)
            .with_context(|| format!("Failed to patch mvn commands in {}", path.display()))?;
        eprintln!(
            "{} {}",
            output::bright_green("✓ Patched mvn commands in"),
            path.display()
        );
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Jobs {
                repo,
                token,
                url,
                cache_dir,
                clear_cache,
            } => {
                self.execute_jobs(
                    &config,
                    repo,
                    token.as_deref(),
                    url.as_deref(),
                    cache_dir.as_deref(),
                    *clear_cache,
                )
                .await
            }
            Commands::RewriteCheckout { repo, path } => self.execute_rewrite_checkout(repo, path),
            Commands::PatchTls {
                path,
                drop_unflagged,
            } => self.execute_patch_tls(&config, path, *drop_unflagged),
        }
    }
}
