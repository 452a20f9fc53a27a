/// Convenience result type used across geoseq.
pub type GeoseqResult<T> = Result<T, GeoseqError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum GeoseqError {
    /// Bad or insufficient source material (video or photo directory).
    #[error("ingest error: {0}")]
    Ingest(String),

    /// GPS track could not be parsed.
    #[error("track parse error: {0}")]
    TrackParse(String),

    /// GPS track has no usable points.
    #[error("empty track: no waypoints to correlate against")]
    EmptyTrack,

    /// A photo has no native position and no track was supplied.
    #[error("missing geotag for '{photo}': photo has no GPS position and no track was supplied")]
    MissingGeotag {
        /// Path of the photo that could not be placed.
        photo: String,
    },

    /// Image scaling, blending or writing failed.
    #[error("composite error: {0}")]
    Composite(String),

    /// Durable store read/write failure.
    #[error("manifest io error: {0}")]
    ManifestIo(String),

    /// Destination service failure.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Invalid caller-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Work was interrupted by a reset or shutdown.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GeoseqError {
    /// Build a [`GeoseqError::Ingest`] value.
    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    /// Build a [`GeoseqError::TrackParse`] value.
    pub fn track_parse(msg: impl Into<String>) -> Self {
        Self::TrackParse(msg.into())
    }

    /// Build a [`GeoseqError::MissingGeotag`] value.
    pub fn missing_geotag(photo: impl Into<String>) -> Self {
        Self::MissingGeotag {
            photo: photo.into(),
        }
    }

    /// Build a [`GeoseqError::Composite`] value.
    pub fn composite(msg: impl Into<String>) -> Self {
        Self::Composite(msg.into())
    }

    /// Build a [`GeoseqError::ManifestIo`] value.
    pub fn manifest_io(msg: impl Into<String>) -> Self {
        Self::ManifestIo(msg.into())
    }

    /// Build a [`GeoseqError::ExternalService`] value.
    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Build a [`GeoseqError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GeoseqError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Stable snake-case tag for machine-readable error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "ingest",
            Self::TrackParse(_) => "track_parse",
            Self::EmptyTrack => "empty_track",
            Self::MissingGeotag { .. } => "missing_geotag",
            Self::Composite(_) => "composite",
            Self::ManifestIo(_) => "manifest_io",
            Self::ExternalService(_) => "external_service",
            Self::Validation(_) => "validation",
            Self::Cancelled(_) => "cancelled",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
