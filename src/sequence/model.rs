use std::{collections::BTreeMap, path::PathBuf};

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{GeoseqError, GeoseqResult},
    nadir::composite::validate_fraction,
    track::model::TrackPoint,
};

/// Where a finished sequence is headed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    /// Keep the sequence on disk only.
    #[default]
    Local,
    /// Upload through a Mapillary upload session.
    Mapillary,
}

impl DestinationKind {
    /// Credential-store key used for this destination, if it needs one.
    pub fn credential_key(self) -> Option<&'static str> {
        match self {
            Self::Local => None,
            Self::Mapillary => Some("mapillary"),
        }
    }
}

/// Destination plus the external sequence key once linked.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Destination {
    #[serde(rename = "type", default)]
    pub kind: DestinationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_sequence_id: Option<String>,
}

/// Nadir stamping chosen from a preview sweep.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NadirStep {
    /// Normalized logo file (as returned by the preview).
    pub logo_file: PathBuf,
    /// Chosen fraction of each photo's height the logo band occupies.
    pub height_fraction: f64,
}

/// The caller's configuration for one build. Consumed once by the builder.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceConfig {
    /// Sequence name; also names the sequence's asset directory.
    pub name: String,
    #[serde(default)]
    pub camera: String,
    #[serde(default)]
    pub destination: Destination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nadir: Option<NadirStep>,
    /// GPX track to correlate capture times against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_file: Option<PathBuf>,
}

impl SequenceConfig {
    /// Config with only a name; everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            camera: String::new(),
            destination: Destination::default(),
            nadir: None,
            track_file: None,
        }
    }

    pub fn validate(&self) -> GeoseqResult<()> {
        validate_sequence_name(&self.name)?;
        if let Some(nadir) = &self.nadir {
            validate_fraction(nadir.height_fraction)
                .map_err(|e| GeoseqError::validation(format!("nadir step: {e}")))?;
        }
        Ok(())
    }
}

/// Sequence names become directory names: reject anything that could escape or hide the
/// sequence directory.
pub fn validate_sequence_name(name: &str) -> GeoseqResult<()> {
    if name.trim().is_empty() {
        return Err(GeoseqError::validation("sequence name must be non-empty"));
    }
    if name.starts_with('.') {
        return Err(GeoseqError::validation(
            "sequence name must not start with '.'",
        ));
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control())
    {
        return Err(GeoseqError::validation(format!(
            "sequence name '{name}' contains a path separator or control character"
        )));
    }
    Ok(())
}

/// A finalized, geotagged photo.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Photo {
    pub id: String,
    pub file_path: PathBuf,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub captured_at: DateTime<Utc>,
    /// Compass bearing towards the next photo, degrees clockwise from north.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl Photo {
    pub fn track_point(&self) -> TrackPoint {
        TrackPoint {
            time: self.captured_at,
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.altitude,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceMetadata {
    /// Stable manifest key.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub camera: String,
    pub created: DateTime<Utc>,
    /// Base directory holding this sequence's assets.
    pub uploader_sequence_name: PathBuf,
    #[serde(default)]
    pub destination: Destination,
}

/// A committed build: metadata plus photos keyed by id.
///
/// Photo ids sort in ingest order, so iterating `photo` walks the sequence in order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceResult {
    pub sequence: SequenceMetadata,
    pub photo: BTreeMap<String, Photo>,
}

impl SequenceResult {
    /// Photo positions in sequence order, for track export.
    pub fn track_points(&self) -> Vec<TrackPoint> {
        self.photo.values().map(Photo::track_point).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/model.rs"]
mod tests;
