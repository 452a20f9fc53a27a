use std::path::Path;

use image::{DynamicImage, RgbaImage, imageops::FilterType};

use crate::{
    foundation::error::{GeoseqError, GeoseqResult},
    nadir::pixel::{over, premultiply, unpremultiply},
};

/// Validate a nadir height fraction (`0 < f <= 1`).
pub fn validate_fraction(fraction: f64) -> GeoseqResult<()> {
    if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
        return Err(GeoseqError::composite(format!(
            "nadir height fraction must be in (0, 1], got {fraction}"
        )));
    }
    Ok(())
}

/// Height in rows of the logo band for a frame of `height` rows.
pub fn band_height(height: u32, fraction: f64) -> u32 {
    (f64::from(height) * fraction).round() as u32
}

/// Stamp `logo` across the bottom of `base`.
///
/// The logo is stretched to the full base width and to `round(base.height * fraction)` rows (no
/// aspect preservation) and blended source-over with its bottom-left corner on the base's
/// bottom-left corner. `base` is left untouched.
pub fn composite(base: &RgbaImage, logo: &RgbaImage, fraction: f64) -> GeoseqResult<RgbaImage> {
    validate_fraction(fraction)?;
    let (width, height) = base.dimensions();
    if width == 0 || height == 0 {
        return Err(GeoseqError::composite("base image has zero size"));
    }
    if logo.width() == 0 || logo.height() == 0 {
        return Err(GeoseqError::composite("logo image has zero size"));
    }

    let band = band_height(height, fraction);
    if band == 0 {
        return Err(GeoseqError::composite(format!(
            "nadir band for fraction {fraction} rounds to zero rows on a {height}px frame"
        )));
    }

    let scaled = image::imageops::resize(logo, width, band, FilterType::Triangle);
    let y0 = height - band;

    let mut out = base.clone();
    for (x, y, src) in scaled.enumerate_pixels() {
        let dst = out.get_pixel_mut(x, y0 + y);
        let blended = over(premultiply(dst.0), premultiply(src.0));
        dst.0 = unpremultiply(blended);
    }
    Ok(out)
}

/// Decode any supported raster file as RGBA8.
pub fn load_rgba(path: &Path) -> GeoseqResult<RgbaImage> {
    let img = image::open(path)
        .map_err(|e| GeoseqError::composite(format!("decode '{}': {e}", path.display())))?;
    Ok(img.to_rgba8())
}

/// Encode `img` to `path`, choosing the format from the extension. JPEG output drops alpha.
pub fn save_image(img: &RgbaImage, path: &Path) -> GeoseqResult<()> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));

    let res = if is_jpeg {
        DynamicImage::ImageRgba8(img.clone()).to_rgb8().save(path)
    } else {
        img.save(path)
    };
    res.map_err(|e| GeoseqError::composite(format!("write '{}': {e}", path.display())))
}

/// Final-mode compositing: stamp `logo` onto the image at `src`, sized to that image, and write
/// the result to `dst`.
pub fn composite_file(src: &Path, dst: &Path, logo: &RgbaImage, fraction: f64) -> GeoseqResult<()> {
    let base = load_rgba(src)?;
    let out = composite(&base, logo, fraction)?;
    save_image(&out, dst)
}

#[cfg(test)]
#[path = "../../tests/unit/nadir/composite.rs"]
mod tests;
