use chrono::{DateTime, Utc};

use crate::{
    foundation::geo::haversine_distance_m,
    sequence::model::{Destination, DestinationKind, SequenceResult},
};

/// Display-only destination state of a listed sequence.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DestinationStatus {
    /// Kept on disk only.
    Local,
    /// Uploaded under `key`, not yet sequenced by the service (or not checked).
    Pending { key: String },
    /// The service reports the upload as a published sequence.
    Linked { key: String },
    /// Destination set but no session key was ever recorded.
    Unlinked,
    /// The status check failed; the rest of the listing is unaffected.
    Error { message: String },
}

impl DestinationStatus {
    /// Status from the manifest record alone, without asking the service.
    pub fn recorded(destination: &Destination) -> Self {
        match (&destination.kind, &destination.external_sequence_id) {
            (DestinationKind::Local, _) => Self::Local,
            (_, Some(key)) => Self::Pending { key: key.clone() },
            (_, None) => Self::Unlinked,
        }
    }
}

/// One row of `list_sequences`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Summary {
    pub id: String,
    pub name: String,
    pub camera: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_to: Option<DateTime<Utc>>,
    pub photo_count: usize,
    /// Path length through the photos in sequence order, meters.
    pub distance_m: f64,
    pub destination: DestinationStatus,
}

impl Summary {
    pub fn from_result(result: &SequenceResult, destination: DestinationStatus) -> Self {
        let photos: Vec<_> = result.photo.values().collect();
        let distance_m = photos
            .windows(2)
            .map(|w| haversine_distance_m(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
            .sum();
        Self {
            id: result.sequence.id.clone(),
            name: result.sequence.name.clone(),
            camera: result.sequence.camera.clone(),
            created: result.sequence.created,
            captured_from: photos.iter().map(|p| p.captured_at).min(),
            captured_to: photos.iter().map(|p| p.captured_at).max(),
            photo_count: photos.len(),
            distance_m,
            destination,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/summary.rs"]
mod tests;
