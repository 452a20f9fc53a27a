use std::path::{Path, PathBuf};

use crate::{
    destination::mapillary::MapillaryConfig,
    foundation::{
        core::Threading,
        error::{GeoseqError, GeoseqResult},
    },
    manifest::layout::WorkspaceLayout,
    nadir::preview::PreviewSweep,
    sequence::model::DestinationKind,
};

/// A camera the user can attribute a sequence to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CameraProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A configured destination service.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntegrationConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DestinationKind,
    #[serde(default)]
    pub mapillary: MapillaryConfig,
}

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Application configuration, read from a JSON file. Every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Workspace root holding sequences, scratch files and tokens.
    pub root_dir: PathBuf,
    pub cameras: Vec<CameraProfile>,
    /// Directory of stock nadir logos offered to the user.
    pub nadir_dir: Option<PathBuf>,
    pub integrations: Vec<IntegrationConfig>,
    pub preview: PreviewSweep,
    /// Worker threads for compositing; `None` lets rayon decide.
    pub threads: Option<usize>,
    /// Seconds between frames sampled from a video.
    pub video_frame_interval_sec: f64,
    /// Camera clock offset from UTC in minutes, applied to EXIF capture times that record no
    /// offset of their own. Cameras usually run on local time.
    pub capture_utc_offset_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("geoseq-data"),
            cameras: Vec::new(),
            nadir_dir: None,
            integrations: Vec::new(),
            preview: PreviewSweep::default(),
            threads: None,
            video_frame_interval_sec: 1.0,
            capture_utc_offset_minutes: 0,
        }
    }
}

impl AppConfig {
    pub fn from_json_str(s: &str) -> GeoseqResult<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| GeoseqError::validation(format!("parse config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file. Relative `root_dir`/`nadir_dir` resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> GeoseqResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GeoseqError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        let mut config = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            if config.root_dir.is_relative() {
                config.root_dir = base.join(&config.root_dir);
            }
            if let Some(dir) = config.nadir_dir.as_mut()
                && dir.is_relative()
            {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> GeoseqResult<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(GeoseqError::validation("root_dir must be set"));
        }
        if self.threads == Some(0) {
            return Err(GeoseqError::validation(
                "threads must be >= 1 when set",
            ));
        }
        if !(self.video_frame_interval_sec.is_finite() && self.video_frame_interval_sec > 0.0) {
            return Err(GeoseqError::validation(format!(
                "video_frame_interval_sec must be > 0, got {}",
                self.video_frame_interval_sec
            )));
        }
        if self.capture_utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(GeoseqError::validation(format!(
                "capture_utc_offset_minutes must be within +/-{MAX_UTC_OFFSET_MINUTES}, got {}",
                self.capture_utc_offset_minutes
            )));
        }
        self.preview.validate()?;

        let mut names = std::collections::BTreeSet::new();
        for i in &self.integrations {
            if i.name.trim().is_empty() {
                return Err(GeoseqError::validation("integration name must be non-empty"));
            }
            if !names.insert(i.name.as_str()) {
                return Err(GeoseqError::validation(format!(
                    "duplicate integration '{}'",
                    i.name
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(&self.root_dir)
    }

    pub fn threading(&self) -> Threading {
        Threading {
            threads: self.threads,
        }
    }

    /// First integration serving `kind`.
    pub fn integration(&self, kind: DestinationKind) -> Option<&IntegrationConfig> {
        self.integrations.iter().find(|i| i.kind == kind)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/app.rs"]
mod tests;
