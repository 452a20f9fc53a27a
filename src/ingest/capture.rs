use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{GeoseqError, GeoseqResult},
    ingest::{directory::ingest_directory, video::ingest_video},
};

/// One extracted frame or photo, ready to become a `Photo`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapturePoint {
    pub file_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_altitude: Option<f64>,
}

impl CapturePoint {
    /// Native position, when the capture carried both latitude and longitude.
    pub fn native_position(&self) -> Option<(f64, f64)> {
        Some((self.native_latitude?, self.native_longitude?))
    }
}

/// Kind of raw capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// A single video file, sampled at a fixed interval.
    Video,
    /// A directory of still photographs.
    Images,
}

/// Ingest tuning.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Drop (and report) photos that fail to decode instead of failing the ingest.
    pub skip_corrupted: bool,
    /// Seconds between sampled video frames.
    pub frame_interval_sec: f64,
    /// Camera clock offset from UTC, in minutes, for EXIF times that carry no offset.
    pub capture_utc_offset_minutes: i32,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            skip_corrupted: false,
            frame_interval_sec: 1.0,
            capture_utc_offset_minutes: 0,
        }
    }
}

/// Ingest output: ordered capture points plus any inputs that were explicitly dropped.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ingested {
    pub points: Vec<CapturePoint>,
    pub removed_files: Vec<PathBuf>,
}

/// Ingest `source` into `dest_dir`, dispatching on `mode`.
pub fn ingest(
    source: &Path,
    dest_dir: &Path,
    mode: IngestMode,
    opts: &IngestOptions,
) -> GeoseqResult<Ingested> {
    if !source.exists() {
        return Err(GeoseqError::ingest(format!(
            "source '{}' does not exist",
            source.display()
        )));
    }
    match mode {
        IngestMode::Video => ingest_video(source, dest_dir, opts.frame_interval_sec),
        IngestMode::Images => ingest_directory(source, dest_dir, opts),
    }
}
