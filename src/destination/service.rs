use std::collections::BTreeMap;

use crate::{foundation::error::GeoseqResult, sequence::model::Photo};

/// An open upload session on a destination service.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    /// External sequence key the service assigned to the session.
    pub key: String,
}

/// Sequencing state of a linked upload, as reported by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequenceStatus {
    /// The service has ingested the upload into a published sequence.
    pub linked: bool,
}

/// A photo-mapping service sequences can be shared to.
///
/// Calls block on network IO; callers must not hold locks across them.
pub trait DestinationService: Send + Sync {
    /// Exchange a stored credential for an upload session.
    fn resolve_session(&self, credential: &str) -> GeoseqResult<Session>;

    /// Ask whether the upload behind `external_sequence_id` has been sequenced.
    fn check_sequence_status(
        &self,
        credential: &str,
        external_sequence_id: &str,
        photos: &BTreeMap<String, Photo>,
    ) -> GeoseqResult<SequenceStatus>;
}
