use chrono::{DateTime, Utc};

use crate::{
    foundation::core::Position,
    foundation::error::{GeoseqError, GeoseqResult},
    foundation::geo::lerp,
    track::model::Track,
};

/// Interpolate a position on `track` at `target`.
///
/// Timestamps outside the track's span clamp to the nearest endpoint. Inside the span the two
/// bracketing waypoints are blended linearly by time; a pair sharing one timestamp yields the
/// earlier waypoint unchanged.
pub fn correlate(track: &Track, target: DateTime<Utc>) -> GeoseqResult<Position> {
    let points = track.points();
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(GeoseqError::EmptyTrack),
    };

    if target <= first.time {
        return Ok(first.position());
    }
    if target >= last.time {
        return Ok(last.position());
    }

    // First waypoint strictly after `target`; never 0 or len here because of the clamps above.
    let after_idx = points.partition_point(|p| p.time <= target);
    let before = &points[after_idx - 1];
    let after = &points[after_idx];

    let span = micros_between(before.time, after.time);
    if span == 0 {
        return Ok(before.position());
    }
    let t = micros_between(before.time, target) as f64 / span as f64;

    Ok(Position {
        latitude: lerp(before.latitude, after.latitude, t),
        longitude: lerp(before.longitude, after.longitude, t),
        elevation: lerp(before.elevation, after.elevation, t),
    })
}

fn micros_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    b.timestamp_micros() - a.timestamp_micros()
}

#[cfg(test)]
#[path = "../../tests/unit/track/correlate.rs"]
mod tests;
