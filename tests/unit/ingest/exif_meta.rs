use chrono::TimeZone;

use super::*;

fn local(raw: &[u8]) -> exif::DateTime {
    exif::DateTime::from_ascii(raw).unwrap()
}

#[test]
fn times_without_an_offset_use_the_camera_offset() {
    let dt = local(b"2021:05:01 10:00:00");
    assert_eq!(
        exif_time_to_utc(&dt, 0),
        Some(Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap())
    );
    // camera clock at UTC+02:00
    assert_eq!(
        exif_time_to_utc(&dt, 120),
        Some(Utc.with_ymd_and_hms(2021, 5, 1, 8, 0, 0).unwrap())
    );
    // UTC-05:30 crosses midnight
    let dt = local(b"2021:05:01 22:00:00");
    assert_eq!(
        exif_time_to_utc(&dt, -330),
        Some(Utc.with_ymd_and_hms(2021, 5, 2, 3, 30, 0).unwrap())
    );
}

#[test]
fn recorded_offset_wins_over_the_camera_offset() {
    let mut dt = local(b"2021:05:01 10:00:00");
    dt.parse_offset(b"+09:00").unwrap();
    assert_eq!(
        exif_time_to_utc(&dt, 120),
        Some(Utc.with_ymd_and_hms(2021, 5, 1, 1, 0, 0).unwrap())
    );
}

#[test]
fn files_without_exif_have_no_capture_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.png");
    image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]))
        .save(&path)
        .unwrap();
    assert_eq!(read_exif_meta(&path, 60), ExifMeta::default());
}
