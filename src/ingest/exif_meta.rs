use std::{fs::File, io::BufReader, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use exif::{In, Tag, Value};

/// Capture metadata read from a photo's EXIF block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ExifMeta {
    pub(crate) captured_at: Option<DateTime<Utc>>,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) altitude: Option<f64>,
}

/// Read EXIF from `path`. Files without EXIF (e.g. most PNGs) yield an empty result.
///
/// EXIF capture times are camera-local. When the file records no offset, `utc_offset_minutes`
/// (the camera clock's offset from UTC) is applied instead.
pub(crate) fn read_exif_meta(path: &Path, utc_offset_minutes: i32) -> ExifMeta {
    let Ok(file) = File::open(path) else {
        return ExifMeta::default();
    };
    let mut reader = BufReader::new(file);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
        return ExifMeta::default();
    };

    ExifMeta {
        captured_at: capture_time(&exif, utc_offset_minutes),
        latitude: gps_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')
            .filter(|v| (-90.0..=90.0).contains(v)),
        longitude: gps_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')
            .filter(|v| (-180.0..=180.0).contains(v)),
        altitude: gps_altitude(&exif),
    }
}

fn capture_time(exif: &exif::Exif, utc_offset_minutes: i32) -> Option<DateTime<Utc>> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;
    let Value::Ascii(ref parts) = field.value else {
        return None;
    };
    let mut dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    let offset_tag = match field.tag {
        Tag::DateTimeOriginal => Tag::OffsetTimeOriginal,
        _ => Tag::OffsetTime,
    };
    if let Some(field) = exif.get_field(offset_tag, In::PRIMARY)
        && let Value::Ascii(ref v) = field.value
        && let Some(raw) = v.first()
    {
        let _ = dt.parse_offset(raw);
    }
    exif_time_to_utc(&dt, utc_offset_minutes)
}

/// Convert a camera-local EXIF timestamp to UTC, preferring the offset recorded in the file.
pub(crate) fn exif_time_to_utc(
    dt: &exif::DateTime,
    utc_offset_minutes: i32,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_nano_opt(
            u32::from(dt.hour),
            u32::from(dt.minute),
            u32::from(dt.second),
            dt.nanosecond.unwrap_or(0),
        )?;
    let offset = dt.offset.map(i64::from).unwrap_or(i64::from(utc_offset_minutes));
    Some(naive.and_utc() - chrono::Duration::minutes(offset))
}

fn gps_degrees(exif: &exif::Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    let mut degrees = 0.0;
    for (i, part) in parts.iter().take(3).enumerate() {
        if part.denom == 0 {
            return None;
        }
        degrees += part.to_f64() / [1.0, 60.0, 3600.0][i];
    }
    if parts.is_empty() {
        return None;
    }

    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match f.value {
            Value::Ascii(ref v) => v.first().and_then(|s| s.first()).copied(),
            _ => None,
        })
        .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref));

    Some(if negative { -degrees } else { degrees })
}

fn gps_altitude(exif: &exif::Exif) -> Option<f64> {
    let field = exif.get_field(Tag::GPSAltitude, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    let alt = parts.first().filter(|r| r.denom != 0)?.to_f64();
    let below_sea_level = exif
        .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
        .is_some_and(|f| matches!(f.value, Value::Byte(ref b) if b.first() == Some(&1)));
    Some(if below_sea_level { -alt } else { alt })
}

#[cfg(test)]
#[path = "../../tests/unit/ingest/exif_meta.rs"]
mod tests;
