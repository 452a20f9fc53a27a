//! geoseq turns a dashcam/action-cam video or a folder of photos into a geotagged image
//! sequence ready for a street-level imagery service.
//!
//! The pipeline:
//!
//! - Ingest captures ([`ingest`]) into a sequence directory
//! - Optionally correlate capture times against a GPX track ([`correlate`])
//! - Preview and apply a nadir logo ([`preview_nadir`], [`composite`])
//! - Build a [`SequenceResult`] ([`build`]) and commit it to the [`ManifestStore`]
//!
//! [`Workspace`] bundles these into request/response commands; the `geoseq` binary exposes
//! them on the command line.
#![forbid(unsafe_code)]

mod config;
mod destination;
mod foundation;
mod ingest;
mod manifest;
mod nadir;
mod sequence;
mod track;
mod workspace;

pub use crate::foundation::core::{CancelFlag, Position, Threading};
pub use crate::foundation::error::{GeoseqError, GeoseqResult};
pub use crate::foundation::geo::{haversine_distance_m, initial_bearing_deg};

pub use crate::track::correlate::correlate;
pub use crate::track::gpx::{load_gpx_file, parse_gpx_str, save_gpx_file, write_gpx};
pub use crate::track::model::{Track, TrackPoint};

pub use crate::nadir::composite::{band_height, composite, composite_file, load_rgba, save_image};
pub use crate::nadir::preview::{
    NadirPreview, PreviewSweep, fraction_key, prepare_logo, preview_nadir, preview_sweep,
};

pub use crate::ingest::capture::{CapturePoint, IngestMode, IngestOptions, Ingested, ingest};
pub use crate::ingest::directory::{ingest_directory, list_capture_images};
pub use crate::ingest::video::{VideoProbe, ingest_video, is_ffmpeg_on_path, probe_video};

pub use crate::sequence::builder::{BuildInputs, BuildOptions, build, photo_id};
pub use crate::sequence::model::{
    Destination, DestinationKind, NadirStep, Photo, SequenceConfig, SequenceMetadata,
    SequenceResult,
};

pub use crate::manifest::layout::WorkspaceLayout;
pub use crate::manifest::store::{Manifest, ManifestStore, StatusSource};
pub use crate::manifest::summary::{DestinationStatus, Summary};

pub use crate::destination::mapillary::{MapillaryClient, MapillaryConfig};
pub use crate::destination::service::{DestinationService, SequenceStatus, Session};
pub use crate::destination::tokens::TokenStore;

pub use crate::config::app::{AppConfig, CameraProfile, IntegrationConfig};
pub use crate::config::loaded::{LoadedConfig, list_nadirs};

pub use crate::workspace::Workspace;
