use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use chrono::Utc;
use image::RgbaImage;
use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
    destination::service::Session,
    foundation::core::{CancelFlag, Position, Threading},
    foundation::error::{GeoseqError, GeoseqResult},
    foundation::geo::initial_bearing_deg,
    ingest::capture::CapturePoint,
    nadir::composite::{composite_file, validate_fraction},
    sequence::model::{Destination, Photo, SequenceConfig, SequenceMetadata, SequenceResult},
    track::{correlate::correlate, model::Track},
};

/// Everything a build consumes.
#[derive(Clone, Copy)]
pub struct BuildInputs<'a> {
    /// Ingested captures, in ingest order.
    pub points: &'a [CapturePoint],
    pub config: &'a SequenceConfig,
    /// Sequence asset directory; recorded as `uploader_sequence_name`.
    pub sequence_dir: &'a Path,
    /// GPS track; when present it overrides native geotags.
    pub track: Option<&'a Track>,
    /// Decoded nadir logo; required when `config.nadir` is set.
    pub logo: Option<&'a RgbaImage>,
    pub session: Option<&'a Session>,
}

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub threading: Threading,
    pub cancel: CancelFlag,
}

/// Stable, order-derived photo id. Zero-padded index first, so ids sort in ingest order. The pad
/// is at least six digits and widens to fit the last index of a `total`-photo sequence.
pub fn photo_id(index: usize, total: usize, file_path: &Path) -> String {
    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let width = total.saturating_sub(1).to_string().len().max(6);
    format!("{index:0width$}-{:016x}", xxh3_64(name.as_bytes()))
}

/// Resolve a position for every capture, or fail on the first one that cannot be placed.
pub fn resolve_positions(
    points: &[CapturePoint],
    track: Option<&Track>,
) -> GeoseqResult<Vec<Position>> {
    points
        .iter()
        .map(|p| match track {
            Some(track) => correlate(track, p.captured_at),
            None => match p.native_position() {
                Some((latitude, longitude)) => Ok(Position {
                    latitude,
                    longitude,
                    elevation: p.native_altitude.unwrap_or(0.0),
                }),
                None => Err(GeoseqError::missing_geotag(p.file_path.display().to_string())),
            },
        })
        .collect()
}

/// Bearing from each photo to the next; the last photo repeats the previous bearing.
pub fn headings(positions: &[Position]) -> Vec<Option<f64>> {
    let n = positions.len();
    if n < 2 {
        return vec![None; n];
    }
    let mut out = Vec::with_capacity(n);
    for pair in positions.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.latitude == b.latitude && a.longitude == b.longitude {
            out.push(None);
        } else {
            out.push(Some(initial_bearing_deg(
                a.latitude,
                a.longitude,
                b.latitude,
                b.longitude,
            )));
        }
    }
    out.push(out[n - 2]);
    out
}

fn composited_path(sequence_dir: &Path, src: &Path) -> GeoseqResult<PathBuf> {
    let name = src.file_name().ok_or_else(|| {
        GeoseqError::composite(format!("'{}' has no file name", src.display()))
    })?;
    let dst = sequence_dir.join(name);
    if dst == src {
        return Ok(sequence_dir.join(format!("nadir_{}", name.to_string_lossy())));
    }
    Ok(dst)
}

/// Turn ingested captures into a finished [`SequenceResult`].
///
/// Positions are resolved for every photo before any image is written, so a missing geotag
/// never leaves composited files behind. With a nadir step, each photo is stamped at its own
/// dimensions and the manifest records the stamped file.
#[tracing::instrument(skip_all, fields(sequence = %inputs.config.name, photos = inputs.points.len()))]
pub fn build(inputs: BuildInputs<'_>, opts: &BuildOptions) -> GeoseqResult<SequenceResult> {
    let BuildInputs {
        points,
        config,
        sequence_dir,
        track,
        logo,
        session,
    } = inputs;

    config.validate()?;
    if points.is_empty() {
        return Err(GeoseqError::ingest("no capture points to build a sequence from"));
    }
    opts.cancel.check("build")?;

    let positions = resolve_positions(points, track)?;
    let headings = headings(&positions);

    let file_paths: Vec<PathBuf> = match &config.nadir {
        None => points.iter().map(|p| p.file_path.clone()).collect(),
        Some(step) => {
            validate_fraction(step.height_fraction)?;
            let logo = logo.ok_or_else(|| {
                GeoseqError::validation("nadir step configured but no logo image was supplied")
            })?;
            std::fs::create_dir_all(sequence_dir).map_err(|e| {
                GeoseqError::composite(format!("create '{}': {e}", sequence_dir.display()))
            })?;

            let pool = opts.threading.build_pool()?;
            pool.install(|| {
                points
                    .par_iter()
                    .map(|p| {
                        opts.cancel.check("nadir compositing")?;
                        let dst = composited_path(sequence_dir, &p.file_path)?;
                        composite_file(&p.file_path, &dst, logo, step.height_fraction)?;
                        tracing::debug!(src = %p.file_path.display(), dst = %dst.display(), "stamped nadir");
                        Ok(dst)
                    })
                    .collect::<GeoseqResult<Vec<_>>>()
            })?
        }
    };
    opts.cancel.check("build")?;

    let mut photo = BTreeMap::new();
    for (index, ((point, pos), (file_path, heading))) in points
        .iter()
        .zip(&positions)
        .zip(file_paths.into_iter().zip(headings))
        .enumerate()
    {
        let id = photo_id(index, points.len(), &point.file_path);
        photo.insert(
            id.clone(),
            Photo {
                id,
                file_path,
                latitude: pos.latitude,
                longitude: pos.longitude,
                altitude: pos.elevation,
                captured_at: point.captured_at,
                heading,
            },
        );
    }

    let destination = Destination {
        kind: config.destination.kind,
        external_sequence_id: session
            .map(|s| s.key.clone())
            .or_else(|| config.destination.external_sequence_id.clone()),
    };

    let result = SequenceResult {
        sequence: SequenceMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            name: config.name.clone(),
            camera: config.camera.clone(),
            created: Utc::now(),
            uploader_sequence_name: sequence_dir.to_path_buf(),
            destination,
        },
        photo,
    };
    tracing::info!(id = %result.sequence.id, "built sequence");
    Ok(result)
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/builder.rs"]
mod tests;
