use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{GeoseqError, GeoseqResult},
    ingest::capture::{CapturePoint, Ingested},
};

/// Facts about a video needed to sample it.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    pub duration_sec: f64,
    /// Recording start time from the container's `creation_time` tag.
    pub creation_time: Option<DateTime<Utc>>,
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run `ffprobe` on `path` and extract the first video stream's geometry and the start time.
pub fn probe_video(path: &Path) -> GeoseqResult<VideoProbe> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| GeoseqError::ingest(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(GeoseqError::ingest(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

pub(crate) fn parse_probe_json(bytes: &[u8]) -> GeoseqResult<VideoProbe> {
    #[derive(serde::Deserialize)]
    struct ProbeTags {
        creation_time: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        tags: Option<ProbeTags>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
        tags: Option<ProbeTags>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| GeoseqError::ingest(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| GeoseqError::ingest("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| GeoseqError::ingest("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| GeoseqError::ingest("missing video height from ffprobe"))?;

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let creation_time = parsed
        .format
        .as_ref()
        .and_then(|f| f.tags.as_ref())
        .and_then(|t| t.creation_time.as_deref())
        .or_else(|| {
            stream
                .tags
                .as_ref()
                .and_then(|t| t.creation_time.as_deref())
        })
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(VideoProbe {
        width,
        height,
        duration_sec,
        creation_time,
    })
}

/// Sample one JPEG every `interval_sec` from `video` into `dest_dir`.
///
/// Frame `i` is stamped `start + i * interval_sec`, where `start` is the container creation time
/// (file mtime when the container has none).
pub fn ingest_video(video: &Path, dest_dir: &Path, interval_sec: f64) -> GeoseqResult<Ingested> {
    if !interval_sec.is_finite() || interval_sec <= 0.0 {
        return Err(GeoseqError::validation(
            "video frame interval must be finite and > 0",
        ));
    }
    if !is_ffmpeg_on_path() {
        return Err(GeoseqError::ingest(
            "ffmpeg is required for video ingest, but was not found on PATH",
        ));
    }

    let probe = probe_video(video)?;
    let start = match probe.creation_time {
        Some(t) => t,
        None => {
            let modified = std::fs::metadata(video)
                .and_then(|m| m.modified())
                .map_err(|e| GeoseqError::ingest(format!("stat '{}': {e}", video.display())))?;
            DateTime::<Utc>::from(modified)
        }
    };

    std::fs::create_dir_all(dest_dir).map_err(|e| {
        GeoseqError::ingest(format!("create '{}': {e}", dest_dir.display()))
    })?;

    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-i"])
        .arg(video)
        .args([
            "-vf",
            &format!("fps=1/{interval_sec}"),
            "-q:v",
            "2",
        ])
        .arg(dest_dir.join("%06d.jpg"))
        .output()
        .map_err(|e| GeoseqError::ingest(format!("failed to run ffmpeg for frame extraction: {e}")))?;
    if !out.status.success() {
        return Err(GeoseqError::ingest(format!(
            "ffmpeg frame extraction failed for '{}': {}",
            video.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frames = extracted_frames(dest_dir)?;
    if frames.is_empty() {
        return Err(GeoseqError::ingest(format!(
            "ffmpeg produced no frames for '{}'",
            video.display()
        )));
    }

    let step_us = (interval_sec * 1e6).round() as i64;
    let mut points = Vec::with_capacity(frames.len());
    for (i, path) in frames.into_iter().enumerate() {
        let (width, height) = image::image_dimensions(&path).unwrap_or((probe.width, probe.height));
        points.push(CapturePoint {
            file_path: path,
            width,
            height,
            captured_at: start + chrono::Duration::microseconds(step_us * i as i64),
            native_latitude: None,
            native_longitude: None,
            native_altitude: None,
        });
    }

    tracing::info!(
        frames = points.len(),
        duration_sec = probe.duration_sec,
        "ingested video"
    );
    Ok(Ingested {
        points,
        removed_files: Vec::new(),
    })
}

fn extracted_frames(dir: &Path) -> GeoseqResult<Vec<PathBuf>> {
    let mut frames = std::fs::read_dir(dir)
        .map_err(|e| GeoseqError::ingest(format!("read '{}': {e}", dir.display())))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|x| x == "jpg"))
        .collect::<Vec<_>>();
    frames.sort();
    Ok(frames)
}

#[cfg(test)]
#[path = "../../tests/unit/ingest/video.rs"]
mod tests;
