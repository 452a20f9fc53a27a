use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    foundation::{
        durable::write_atomic,
        error::{GeoseqError, GeoseqResult},
    },
    track::model::{Track, TrackPoint},
};

#[derive(Default)]
struct PendingPoint {
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    time: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TextField {
    None,
    Elevation,
    Time,
}

/// Parse a GPX document into a time-sorted [`Track`].
///
/// Every `trkpt` must carry numeric `lat`/`lon` attributes and an RFC 3339 `<time>`; `<ele>` is
/// optional and defaults to 0. Any malformed point fails the whole parse.
pub fn parse_gpx_str(s: &str) -> GeoseqResult<Track> {
    let mut reader = Reader::from_str(s);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut pending: Option<PendingPoint> = None;
    let mut field = TextField::None;
    let mut points = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            GeoseqError::track_parse(format!(
                "invalid xml near byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Eof => break,
            Event::Start(e) => match e.local_name().as_ref() {
                b"gpx" => saw_root = true,
                b"trkpt" => pending = Some(start_point(&e, points.len())?),
                b"ele" if pending.is_some() => field = TextField::Elevation,
                b"time" if pending.is_some() => field = TextField::Time,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"gpx" => saw_root = true,
                b"trkpt" => {
                    return Err(GeoseqError::track_parse(format!(
                        "trkpt #{} has no <time>",
                        points.len()
                    )));
                }
                _ => {}
            },
            Event::Text(t) if field != TextField::None => {
                let text = t
                    .unescape()
                    .map_err(|e| GeoseqError::track_parse(format!("invalid text: {e}")))?;
                let idx = points.len();
                if let Some(p) = pending.as_mut() {
                    match field {
                        TextField::Elevation => {
                            p.elevation = Some(text.trim().parse::<f64>().map_err(|_| {
                                GeoseqError::track_parse(format!(
                                    "trkpt #{idx} has non-numeric <ele> '{text}'"
                                ))
                            })?);
                        }
                        TextField::Time => p.time = Some(parse_time(text.trim(), idx)?),
                        TextField::None => {}
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"ele" | b"time" => field = TextField::None,
                b"trkpt" => {
                    let idx = points.len();
                    let p = pending.take().unwrap_or_default();
                    let time = p.time.ok_or_else(|| {
                        GeoseqError::track_parse(format!("trkpt #{idx} has no <time>"))
                    })?;
                    points.push(TrackPoint {
                        time,
                        latitude: p.latitude,
                        longitude: p.longitude,
                        elevation: p.elevation.unwrap_or(0.0),
                    });
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(GeoseqError::track_parse("document has no <gpx> root element"));
    }

    Ok(Track::from_points(points))
}

/// Read and parse a GPX file.
pub fn load_gpx_file(path: &Path) -> GeoseqResult<Track> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| GeoseqError::track_parse(format!("read '{}': {e}", path.display())))?;
    parse_gpx_str(&s)
}

fn start_point(e: &BytesStart<'_>, idx: usize) -> GeoseqResult<PendingPoint> {
    let mut lat = None;
    let mut lon = None;
    for attr in e.attributes() {
        let attr = attr
            .map_err(|err| GeoseqError::track_parse(format!("trkpt #{idx} attribute: {err}")))?;
        let value = attr
            .unescape_value()
            .map_err(|err| GeoseqError::track_parse(format!("trkpt #{idx} attribute: {err}")))?;
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_coord(&value, -90.0, 90.0, "lat", idx)?),
            b"lon" => lon = Some(parse_coord(&value, -180.0, 180.0, "lon", idx)?),
            _ => {}
        }
    }
    match (lat, lon) {
        (Some(latitude), Some(longitude)) => Ok(PendingPoint {
            latitude,
            longitude,
            ..PendingPoint::default()
        }),
        _ => Err(GeoseqError::track_parse(format!(
            "trkpt #{idx} is missing lat/lon"
        ))),
    }
}

fn parse_coord(raw: &str, min: f64, max: f64, name: &str, idx: usize) -> GeoseqResult<f64> {
    let v = raw.trim().parse::<f64>().map_err(|_| {
        GeoseqError::track_parse(format!("trkpt #{idx} has non-numeric {name} '{raw}'"))
    })?;
    if !v.is_finite() || v < min || v > max {
        return Err(GeoseqError::track_parse(format!(
            "trkpt #{idx} {name} {v} is out of range"
        )));
    }
    Ok(v)
}

fn parse_time(raw: &str, idx: usize) -> GeoseqResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GeoseqError::track_parse(format!("trkpt #{idx} time '{raw}': {e}")))
}

/// Serialize points as a single-segment GPX 1.1 track.
pub fn write_gpx(name: &str, points: &[TrackPoint]) -> GeoseqResult<String> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", "geoseq"));
    gpx.push_attribute(("xmlns", "http://www.topografix.com/GPX/1/1"));
    w.write_event(Event::Start(gpx)).map_err(xml_err)?;

    w.write_event(Event::Start(BytesStart::new("trk"))).map_err(xml_err)?;
    write_text_element(&mut w, "name", name)?;
    w.write_event(Event::Start(BytesStart::new("trkseg")))
        .map_err(xml_err)?;

    for p in points {
        let mut trkpt = BytesStart::new("trkpt");
        trkpt.push_attribute(("lat", p.latitude.to_string().as_str()));
        trkpt.push_attribute(("lon", p.longitude.to_string().as_str()));
        w.write_event(Event::Start(trkpt)).map_err(xml_err)?;
        write_text_element(&mut w, "ele", &p.elevation.to_string())?;
        write_text_element(
            &mut w,
            "time",
            &p.time.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        w.write_event(Event::End(BytesEnd::new("trkpt")))
            .map_err(xml_err)?;
    }

    w.write_event(Event::End(BytesEnd::new("trkseg")))
        .map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("trk"))).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("gpx"))).map_err(xml_err)?;

    String::from_utf8(w.into_inner()).map_err(|e| GeoseqError::manifest_io(format!("gpx utf-8: {e}")))
}

/// Write a GPX track to `path`, atomically replacing any existing file.
pub fn save_gpx_file(path: &Path, name: &str, points: &[TrackPoint]) -> GeoseqResult<()> {
    let doc = write_gpx(name, points)?;
    write_atomic(path, doc.as_bytes())
        .map_err(|e| GeoseqError::manifest_io(format!("write gpx '{}': {e:#}", path.display())))
}

fn write_text_element(w: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> GeoseqResult<()> {
    w.write_event(Event::Start(BytesStart::new(tag)))
        .map_err(xml_err)?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new(tag)))
        .map_err(xml_err)?;
    Ok(())
}

fn xml_err(e: impl std::fmt::Display) -> GeoseqError {
    GeoseqError::manifest_io(format!("write gpx: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/track/gpx.rs"]
mod tests;
