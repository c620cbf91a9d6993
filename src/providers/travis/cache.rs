use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{BuildMineError, Result};

use super::types::Build;

/// On-disk checkpoints of the Travis API results for one repository.
///
/// Two files per repository:
/// - `{owner}-{name}-builds.json`: the build list
/// - `{owner}-{name}-build-info.json`: the build list with `build_info` attached
///
/// A present file is trusted as-is. Files are only ever written whole, through
/// a temporary file renamed into place, so a crash never leaves a partial
/// checkpoint behind.
pub struct BuildCache {
    builds_file: PathBuf,
    build_info_file: PathBuf,
}

impl BuildCache {
    /// Creates the cache for `repo` inside `cache_dir`, creating the directory if needed.
    pub fn new(cache_dir: &Path, repo: &str) -> Result<Self> {
        fs::create_dir_all(cache_dir)?;

        let slug = repo.replace('/', "-");

        Ok(Self {
            builds_file: cache_dir.join(format!("{slug}-builds.json")),
            build_info_file: cache_dir.join(format!("{slug}-build-info.json")),
        })
    }

    /// Platform cache directory used when none is configured:
    /// - Linux: `~/.cache/buildmine/travis`
    /// - macOS: `~/Library/Caches/buildmine/travis`
    pub fn default_dir() -> Result<PathBuf> {
        Ok(dirs::cache_dir()
            .ok_or_else(|| BuildMineError::Cache("No cache directory found".into()))?
            .join("buildmine")
            .join("travis"))
    }

    pub fn builds_file(&self) -> &Path {
        &self.builds_file
    }

    pub fn build_info_file(&self) -> &Path {
        &self.build_info_file
    }

    pub fn load_builds(&self) -> Result<Option<Vec<Build>>> {
        load(&self.builds_file)
    }

    pub fn save_builds(&self, builds: &[Build]) -> Result<()> {
        save(&self.builds_file, builds)
    }

    pub fn load_build_info(&self) -> Result<Option<Vec<Build>>> {
        load(&self.build_info_file)
    }

    pub fn save_build_info(&self, builds: &[Build]) -> Result<()> {
        save(&self.build_info_file, builds)
    }

    /// Removes both checkpoint files, if present.
    pub fn clear(&self) -> Result<()> {
        for file in [&self.builds_file, &self.build_info_file] {
            if file.exists() {
                fs::remove_file(file)?;
                info!("Cache cleared: {}", file.display());
            }
        }
        Ok(())
    }
}

fn load<T: DeserializeOwned>(file: &Path) -> Result<Option<T>> {
    if !file.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(file)?;
    let value = serde_json::from_str(&content).map_err(|e| {
        BuildMineError::Cache(format!("Failed to parse {}: {e}", file.display()))
    })?;

    debug!("Loaded cache from: {}", file.display());
    Ok(Some(value))
}

fn save<T: Serialize + ?Sized>(file: &Path, value: &T) -> Result<()> {
    let dir = file
        .parent()
        .ok_or_else(|| BuildMineError::Cache(format!("No parent for {}", file.display())))?;

    let content = serde_json::to_string(value)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(file).map_err(|e| e.error)?;

    debug!("Saved cache: {}", file.display());
    Ok(())
}
