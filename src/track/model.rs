use chrono::{DateTime, Utc};

use crate::foundation::core::Position;

/// One timestamped GPS waypoint.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackPoint {
    /// UTC time the fix was recorded.
    pub time: DateTime<Utc>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation in meters.
    pub elevation: f64,
}

impl TrackPoint {
    /// Position part of the waypoint.
    pub fn position(&self) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
        }
    }
}

/// A time-sorted GPS track. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Build a track, sorting points by time. Points sharing a timestamp keep their input order.
    pub fn from_points(mut points: Vec<TrackPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        Self { points }
    }

    /// Waypoints in time order.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last timestamps, if any.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.points.first()?.time, self.points.last()?.time))
    }
}
