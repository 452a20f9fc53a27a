use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    config::app::{AppConfig, CameraProfile, IntegrationConfig},
    foundation::error::GeoseqResult,
    ingest::directory::is_raster_file,
};

/// Payload of the `load_config` command.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoadedConfig {
    pub cameras: Vec<CameraProfile>,
    /// Stock nadir logos found in the configured directory.
    pub nadirs: Vec<PathBuf>,
    pub integrations: Vec<IntegrationConfig>,
    /// Workspace root.
    pub basepath: PathBuf,
    pub tokens: BTreeMap<String, String>,
}

impl LoadedConfig {
    pub fn assemble(config: &AppConfig, tokens: BTreeMap<String, String>) -> GeoseqResult<Self> {
        let nadirs = match &config.nadir_dir {
            Some(dir) => list_nadirs(dir)?,
            None => Vec::new(),
        };
        Ok(Self {
            cameras: config.cameras.clone(),
            nadirs,
            integrations: config.integrations.clone(),
            basepath: config.root_dir.clone(),
            tokens,
        })
    }
}

/// Raster files directly inside `dir`, sorted by path. A missing directory lists as empty.
pub fn list_nadirs(dir: &Path) -> GeoseqResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "nadir directory not found");
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read nadir dir '{}'", dir.display()))? {
        let path = entry
            .with_context(|| format!("read nadir dir '{}'", dir.display()))?
            .path();
        if path.is_file() && is_raster_file(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/config/loaded.rs"]
mod tests;
