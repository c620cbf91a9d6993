use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::build_script::UnflaggedMavenLine;

/// Configuration file names searched in the working directory, in order.
const CANDIDATES: [&str; 4] = [
    "buildmine.toml",
    "buildmine.json",
    "buildmine.yaml",
    "buildmine.yml",
];

/// Configuration file structure for buildmine.
///
/// Every value can be overridden from the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Travis API access and checkpoint location
    #[serde(default)]
    pub travis: TravisConfig,

    /// Build script patching options
    #[serde(default)]
    pub build_script: BuildScriptConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TravisConfig {
    /// Travis API token
    pub token: Option<String>,

    /// Travis API base URL
    #[serde(default = "default_travis_base_url")]
    pub base_url: String,

    /// Directory for the build list checkpoints (platform cache dir when unset)
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildScriptConfig {
    /// Drop mvn lines that have no flag to anchor the TLS option on
    #[serde(default)]
    pub drop_unflagged_mvn_lines: bool,
}

impl BuildScriptConfig {
    pub fn unflagged_policy(&self) -> UnflaggedMavenLine {
        if self.drop_unflagged_mvn_lines {
            UnflaggedMavenLine::Drop
        } else {
            UnflaggedMavenLine::PassThrough
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

impl Default for TravisConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_travis_base_url(),
            cache_dir: None,
        }
    }
}

fn default_travis_base_url() -> String {
    "https://api.travis-ci.org".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Uses `path` when given, otherwise the first of `buildmine.toml`,
    /// `buildmine.json`, `buildmine.yaml`, `buildmine.yml` found in the current
    /// directory. Returns the default configuration if none exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::discover(Path::new(".")),
        }
    }

    fn discover(dir: &Path) -> Result<Self> {
        for candidate in &CANDIDATES {
            let path = dir.join(candidate);
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}
