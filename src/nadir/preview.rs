use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use image::{RgbaImage, imageops::FilterType};
use rayon::prelude::*;

use crate::{
    foundation::core::{CancelFlag, Threading},
    foundation::error::{GeoseqError, GeoseqResult},
    nadir::composite::{composite, load_rgba, save_image},
};

/// The set of candidate height fractions tried when previewing a nadir logo.
///
/// Fractions are `(start_percent + k * step_percent) / 100` for `k in 0..count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewSweep {
    /// First fraction, in percent of frame height.
    pub start_percent: u32,
    /// Increment between candidates, in percent.
    pub step_percent: u32,
    /// Number of candidates.
    pub count: u32,
}

impl Default for PreviewSweep {
    fn default() -> Self {
        Self {
            start_percent: 10,
            step_percent: 1,
            count: 16,
        }
    }
}

impl PreviewSweep {
    pub fn validate(&self) -> GeoseqResult<()> {
        if self.count == 0 {
            return Err(GeoseqError::validation("preview sweep count must be >= 1"));
        }
        if self.start_percent == 0 {
            return Err(GeoseqError::validation(
                "preview sweep start_percent must be >= 1",
            ));
        }
        if self.count > 1 && self.step_percent == 0 {
            return Err(GeoseqError::validation(
                "preview sweep step_percent must be >= 1 when count > 1",
            ));
        }
        let last = u64::from(self.start_percent)
            + u64::from(self.step_percent) * u64::from(self.count - 1);
        if last > 100 {
            return Err(GeoseqError::validation(format!(
                "preview sweep ends at {last}%, past the full frame height"
            )));
        }
        Ok(())
    }

    /// Candidate fractions in sweep order.
    pub fn fractions(&self) -> Vec<f64> {
        (0..self.count)
            .map(|k| f64::from(self.start_percent + k * self.step_percent) / 100.0)
            .collect()
    }
}

/// Display label for a fraction (`0.1`, `0.11`, ...).
pub fn fraction_key(fraction: f64) -> String {
    fraction.to_string()
}

/// Result of a preview sweep.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NadirPreview {
    /// Normalized logo written to the scratch area; a later commit reads it back.
    pub logo_file: PathBuf,
    /// Composited candidate per fraction label.
    pub items: BTreeMap<String, PathBuf>,
}

/// Normalize the user's logo into an RGBA PNG under `scratch_dir`.
pub fn prepare_logo(src: &Path, scratch_dir: &Path) -> GeoseqResult<(PathBuf, RgbaImage)> {
    let logo = load_rgba(src)?;
    std::fs::create_dir_all(scratch_dir).map_err(|e| {
        GeoseqError::composite(format!(
            "create scratch dir '{}': {e}",
            scratch_dir.display()
        ))
    })?;
    let out = scratch_dir.join(format!("{}.png", uuid::Uuid::new_v4()));
    save_image(&logo, &out)?;
    Ok((out, logo))
}

/// Composite `logo` onto `base` once per sweep fraction, writing each candidate to `out_dir`.
///
/// Fails fast: after the first error no new variant starts, variants already written are removed,
/// and the first error is returned.
pub fn preview_sweep(
    logo: &RgbaImage,
    base: &RgbaImage,
    sweep: &PreviewSweep,
    out_dir: &Path,
    threading: Threading,
    cancel: &CancelFlag,
) -> GeoseqResult<BTreeMap<String, PathBuf>> {
    sweep.validate()?;
    std::fs::create_dir_all(out_dir).map_err(|e| {
        GeoseqError::composite(format!("create preview dir '{}': {e}", out_dir.display()))
    })?;

    let pool = threading.build_pool()?;
    let fractions = sweep.fractions();
    let failed = AtomicBool::new(false);
    let first_err = Mutex::new(None::<GeoseqError>);
    let items = Mutex::new(BTreeMap::<String, PathBuf>::new());

    let record = |e: GeoseqError| {
        failed.store(true, Ordering::SeqCst);
        let mut slot = first_err.lock().unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            *slot = Some(e);
        }
    };

    pool.install(|| {
        fractions.par_iter().for_each(|&fraction| {
            if failed.load(Ordering::SeqCst) {
                return;
            }
            if let Err(e) = cancel.check("preview sweep") {
                record(e);
                return;
            }

            let out = out_dir.join(format!("{}.png", uuid::Uuid::new_v4()));
            match composite(base, logo, fraction).and_then(|img| save_image(&img, &out)) {
                Ok(()) => {
                    tracing::debug!(fraction, path = %out.display(), "nadir preview variant");
                    items
                        .lock()
                        .unwrap_or_else(|p| p.into_inner())
                        .insert(fraction_key(fraction), out);
                }
                Err(e) => {
                    let _ = std::fs::remove_file(&out);
                    record(e);
                }
            }
        });
    });

    let items = items.into_inner().unwrap_or_else(|p| p.into_inner());
    if let Some(e) = first_err.into_inner().unwrap_or_else(|p| p.into_inner()) {
        for path in items.values() {
            let _ = std::fs::remove_file(path);
        }
        return Err(e);
    }
    Ok(items)
}

/// Preview-mode entry point: normalize the logo, load the sample frame at `width x height`, and
/// run the sweep.
#[allow(clippy::too_many_arguments)]
pub fn preview_nadir(
    logo_path: &Path,
    image_path: &Path,
    width: u32,
    height: u32,
    sweep: &PreviewSweep,
    scratch_dir: &Path,
    threading: Threading,
    cancel: &CancelFlag,
) -> GeoseqResult<NadirPreview> {
    if width == 0 || height == 0 {
        return Err(GeoseqError::validation(
            "preview width/height must be non-zero",
        ));
    }
    let (logo_file, logo) = prepare_logo(logo_path, scratch_dir)?;
    let items = load_rgba(image_path).and_then(|mut base| {
        if base.dimensions() != (width, height) {
            base = image::imageops::resize(&base, width, height, FilterType::Triangle);
        }
        preview_sweep(&logo, &base, sweep, scratch_dir, threading, cancel)
    });
    match items {
        Ok(items) => Ok(NadirPreview { logo_file, items }),
        Err(e) => {
            // The caller never learns the logo path on failure.
            let _ = std::fs::remove_file(&logo_file);
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nadir/preview.rs"]
mod tests;
