use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{GeoseqError, GeoseqResult},
    ingest::{
        capture::{CapturePoint, IngestOptions, Ingested},
        exif_meta::read_exif_meta,
    },
};

const RASTER_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub(crate) fn is_raster_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| RASTER_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// List the candidate images of a capture directory, enforcing the directory preconditions:
/// every regular, non-hidden file must be png/jpg/jpeg and there must be at least two of them.
pub fn list_capture_images(dir: &Path) -> GeoseqResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| GeoseqError::ingest(format!("read directory '{}': {e}", dir.display())))?;

    let mut images = Vec::new();
    let mut rejected = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| GeoseqError::ingest(format!("read '{}': {e}", dir.display())))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden {
            continue;
        }
        if is_raster_file(&path) {
            images.push(path);
        } else {
            rejected.push(path);
        }
    }

    if let Some(first) = rejected.first() {
        return Err(GeoseqError::ingest(format!(
            "the images should be png, jpeg or jpg ('{}' and {} other file(s) are not)",
            first.display(),
            rejected.len() - 1
        )));
    }
    if images.len() < 2 {
        return Err(GeoseqError::ingest(
            "more than one image is required to create a sequence",
        ));
    }

    images.sort();
    Ok(images)
}

/// Copy the photos of `src_dir` into `dest_dir` and describe each as a [`CapturePoint`].
///
/// Capture time comes from EXIF `DateTimeOriginal` (file mtime otherwise); native GPS comes from
/// the EXIF GPS block when present. Points are ordered by capture time, then file name.
pub fn ingest_directory(
    src_dir: &Path,
    dest_dir: &Path,
    opts: &IngestOptions,
) -> GeoseqResult<Ingested> {
    let images = list_capture_images(src_dir)?;
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("create '{}'", dest_dir.display()))?;

    let mut points = Vec::with_capacity(images.len());
    let mut removed_files = Vec::new();

    for src in images {
        let decoded = if opts.skip_corrupted {
            match image::open(&src) {
                Ok(img) => Some((img.width(), img.height())),
                Err(e) => {
                    tracing::warn!(path = %src.display(), error = %e, "dropping undecodable image");
                    removed_files.push(src);
                    continue;
                }
            }
        } else {
            None
        };
        let (width, height) = match decoded {
            Some(dims) => dims,
            None => image::image_dimensions(&src).map_err(|e| {
                GeoseqError::ingest(format!("unreadable image '{}': {e}", src.display()))
            })?,
        };

        let meta = read_exif_meta(&src, opts.capture_utc_offset_minutes);
        let captured_at = match meta.captured_at {
            Some(t) => t,
            None => file_mtime(&src)?,
        };

        let file_name = src
            .file_name()
            .ok_or_else(|| GeoseqError::ingest(format!("'{}' has no file name", src.display())))?;
        let dest = dest_dir.join(file_name);
        std::fs::copy(&src, &dest).map_err(|e| {
            GeoseqError::ingest(format!(
                "copy '{}' -> '{}': {e}",
                src.display(),
                dest.display()
            ))
        })?;

        points.push(CapturePoint {
            file_path: dest,
            width,
            height,
            captured_at,
            native_latitude: meta.latitude,
            native_longitude: meta.longitude,
            native_altitude: meta.altitude,
        });
    }

    if points.len() < 2 {
        return Err(GeoseqError::ingest(format!(
            "more than one readable image is required to create a sequence ({} dropped as corrupted)",
            removed_files.len()
        )));
    }

    points.sort_by(|a, b| {
        a.captured_at
            .cmp(&b.captured_at)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });

    tracing::info!(
        count = points.len(),
        removed = removed_files.len(),
        "ingested photo directory"
    );
    Ok(Ingested {
        points,
        removed_files,
    })
}

fn file_mtime(path: &Path) -> GeoseqResult<DateTime<Utc>> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| GeoseqError::ingest(format!("stat '{}': {e}", path.display())))?;
    Ok(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
#[path = "../../tests/unit/ingest/directory.rs"]
mod tests;
