use image::Rgba;

use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(px))
}

#[test]
fn output_keeps_base_dimensions_and_only_touches_band() {
    let base = solid(40, 30, [10, 20, 30, 255]);
    let logo = solid(7, 3, [250, 240, 230, 255]);

    for fraction in [0.1, 0.15, 0.25, 1.0] {
        let out = composite(&base, &logo, fraction).unwrap();
        assert_eq!(out.dimensions(), base.dimensions());

        let band = band_height(30, fraction);
        let y0 = 30 - band;
        for (x, y, px) in out.enumerate_pixels() {
            if y < y0 {
                assert_eq!(px, base.get_pixel(x, y), "row {y} above band changed");
            } else {
                assert_ne!(px, base.get_pixel(x, y), "row {y} inside band unchanged");
            }
        }
    }
}

#[test]
fn base_is_not_mutated() {
    let base = solid(8, 8, [1, 2, 3, 255]);
    let before = base.clone();
    let _ = composite(&base, &solid(2, 2, [200, 0, 0, 255]), 0.5).unwrap();
    assert_eq!(base, before);
}

#[test]
fn transparent_logo_pixels_leave_base_visible() {
    let base = solid(4, 4, [10, 20, 30, 255]);
    let logo = solid(4, 4, [255, 255, 255, 0]);
    let out = composite(&base, &logo, 0.5).unwrap();
    assert_eq!(out, base);
}

#[test]
fn band_height_rounds() {
    assert_eq!(band_height(1000, 0.1), 100);
    assert_eq!(band_height(200, 0.12), 24);
    assert_eq!(band_height(10, 0.25), 3);
}

#[test]
fn invalid_fractions_are_composite_errors() {
    let base = solid(10, 10, [0, 0, 0, 255]);
    let logo = solid(1, 1, [255, 255, 255, 255]);
    for f in [0.0, -0.1, 1.5, f64::NAN] {
        let err = composite(&base, &logo, f).unwrap_err();
        assert_eq!(err.kind(), "composite");
    }
    // rounds to zero rows
    assert!(composite(&base, &logo, 0.01).is_err());
}

#[test]
fn composite_file_writes_jpeg_and_png() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("frame.png");
    solid(16, 12, [0, 0, 0, 255]).save(&src).unwrap();
    let logo = solid(4, 4, [255, 255, 255, 255]);

    let png = dir.path().join("out.png");
    composite_file(&src, &png, &logo, 0.25).unwrap();
    let out = image::open(&png).unwrap().to_rgba8();
    assert_eq!(out.dimensions(), (16, 12));
    assert!(out.get_pixel(0, 11).0[0] >= 250);
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);

    let jpg = dir.path().join("out.jpg");
    composite_file(&src, &jpg, &logo, 0.25).unwrap();
    assert_eq!(image::image_dimensions(&jpg).unwrap(), (16, 12));
}
