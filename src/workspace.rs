use std::{collections::BTreeSet, path::Path, sync::Mutex};

use crate::{
    config::{app::AppConfig, loaded::LoadedConfig},
    destination::{
        mapillary::MapillaryClient,
        service::{DestinationService, Session},
        tokens::TokenStore,
    },
    foundation::{
        core::CancelFlag,
        durable::{remove_dir_if_exists, remove_file_if_exists},
        error::{GeoseqError, GeoseqResult},
    },
    ingest::capture::{CapturePoint, IngestMode, IngestOptions, Ingested, ingest},
    manifest::{
        layout::WorkspaceLayout,
        store::{ManifestStore, StatusSource},
        summary::{DestinationStatus, Summary},
    },
    nadir::{
        composite::load_rgba,
        preview::{NadirPreview, preview_nadir},
    },
    sequence::{
        builder::{BuildInputs, BuildOptions, build},
        model::{DestinationKind, SequenceConfig, validate_sequence_name},
    },
    track::{
        gpx::{load_gpx_file, save_gpx_file},
        model::{Track, TrackPoint},
    },
};

/// The command surface: one workspace root, its manifest, credentials and destination.
///
/// Commands are request/response and safe to call from several threads. `reset_sequence` and
/// `shutdown` cancel whatever ingest, preview or build is running.
pub struct Workspace {
    config: AppConfig,
    store: ManifestStore,
    tokens: TokenStore,
    destination: Option<Box<dyn DestinationService>>,
    cancel: Mutex<CancelFlag>,
    busy_names: Mutex<BTreeSet<String>>,
}

/// Holds a sequence name for the duration of an ingest or commit.
struct NameReservation<'a> {
    names: &'a Mutex<BTreeSet<String>>,
    name: String,
}

impl Drop for NameReservation<'_> {
    fn drop(&mut self) {
        self.names
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.name);
    }
}

impl Workspace {
    /// Open (creating if needed) the workspace described by `config`.
    ///
    /// A Mapillary integration in the config wires up the HTTP destination client.
    pub fn open(config: AppConfig) -> GeoseqResult<Self> {
        config.validate()?;
        let layout = config.layout();
        let tokens = TokenStore::open(layout.tokens_path());
        let store = ManifestStore::open(layout)?;
        let destination = match config.integration(DestinationKind::Mapillary) {
            Some(i) => Some(Box::new(MapillaryClient::new(i.mapillary.clone())?) as Box<dyn DestinationService>),
            None => None,
        };
        tracing::debug!(root = %config.root_dir.display(), "opened workspace");
        Ok(Self {
            config,
            store,
            tokens,
            destination,
            cancel: Mutex::new(CancelFlag::new()),
            busy_names: Mutex::new(BTreeSet::new()),
        })
    }

    /// Replace the destination service (e.g. with a test double).
    pub fn with_destination(mut self, service: Box<dyn DestinationService>) -> Self {
        self.destination = Some(service);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        self.store.layout()
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    fn current_cancel(&self) -> CancelFlag {
        self.cancel.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Cancel in-flight work and arm a fresh flag for the next command.
    fn cancel_in_flight(&self) {
        let mut slot = self.cancel.lock().unwrap_or_else(|p| p.into_inner());
        slot.cancel();
        *slot = CancelFlag::new();
    }

    fn credential(&self, kind: DestinationKind) -> GeoseqResult<Option<String>> {
        match kind.credential_key() {
            Some(key) => self.tokens.get(key),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn load_config(&self) -> GeoseqResult<LoadedConfig> {
        LoadedConfig::assemble(&self.config, self.tokens.all()?)
    }

    /// Store a destination credential; an empty token clears it.
    #[tracing::instrument(skip(self, token))]
    pub fn set_token(&self, key: &str, token: &str) -> GeoseqResult<()> {
        self.tokens.set(key, token)
    }

    /// Parse a GPX file into time-ordered points.
    #[tracing::instrument(skip(self))]
    pub fn load_track(&self, path: &Path) -> GeoseqResult<Vec<TrackPoint>> {
        let track = load_gpx_file(path)?;
        let Some((from, to)) = track.time_span() else {
            return Err(GeoseqError::EmptyTrack);
        };
        tracing::debug!(points = track.len(), %from, %to, "loaded track");
        Ok(track.points().to_vec())
    }

    /// Ingest a video or photo directory as the originals of sequence `name`.
    ///
    /// The sequence directory is recreated from scratch; a name already used by a committed
    /// sequence is refused. On failure the half-written directory is removed.
    #[tracing::instrument(skip(self))]
    pub fn ingest(
        &self,
        source: &Path,
        name: &str,
        mode: IngestMode,
        skip_corrupted: bool,
    ) -> GeoseqResult<Ingested> {
        validate_sequence_name(name)?;
        let _reservation = self.reserve_name(name)?;
        self.ensure_name_free(name)?;
        let cancel = self.current_cancel();
        cancel.check("ingest")?;

        let seq_dir = self.layout().sequence_dir(name);
        remove_dir_if_exists(&seq_dir)?;
        let originals = self.layout().originals_dir(name);
        std::fs::create_dir_all(&originals).map_err(|e| {
            GeoseqError::ingest(format!("create '{}': {e}", originals.display()))
        })?;

        let opts = IngestOptions {
            skip_corrupted,
            frame_interval_sec: self.config.video_frame_interval_sec,
            capture_utc_offset_minutes: self.config.capture_utc_offset_minutes,
        };
        let out = ingest(source, &originals, mode, &opts).and_then(|out| {
            cancel.check("ingest")?;
            Ok(out)
        });
        match out {
            Ok(out) => {
                tracing::info!(
                    points = out.points.len(),
                    removed = out.removed_files.len(),
                    "ingested captures"
                );
                Ok(out)
            }
            Err(e) => {
                if let Err(cleanup) = remove_dir_if_exists(&seq_dir) {
                    tracing::warn!("failed to clean up '{}': {cleanup:#}", seq_dir.display());
                }
                Err(e)
            }
        }
    }

    /// Render the nadir preview sweep for `logo` over one sample frame.
    #[tracing::instrument(skip(self))]
    pub fn preview_nadir(
        &self,
        logo: &Path,
        image: &Path,
        width: u32,
        height: u32,
    ) -> GeoseqResult<NadirPreview> {
        let cancel = self.current_cancel();
        preview_nadir(
            logo,
            image,
            width,
            height,
            &self.config.preview,
            &self.layout().scratch_dir(),
            self.config.threading(),
            &cancel,
        )
    }

    /// Build `points` into a sequence and commit it.
    ///
    /// Nothing reaches the manifest unless the whole build succeeded. The exported track is
    /// written before the manifest entry so a committed sequence always has one.
    #[tracing::instrument(skip(self, config, points), fields(name = %config.name, photos = points.len()))]
    pub fn commit_sequence(
        &self,
        config: &SequenceConfig,
        points: &[CapturePoint],
    ) -> GeoseqResult<Summary> {
        config.validate()?;
        let _reservation = self.reserve_name(&config.name)?;
        self.ensure_name_free(&config.name)?;
        let cancel = self.current_cancel();

        let track: Option<Track> = config
            .track_file
            .as_deref()
            .map(load_gpx_file)
            .transpose()?;
        let session = self.resolve_session(config)?;
        let logo = config
            .nadir
            .as_ref()
            .map(|n| load_rgba(&n.logo_file))
            .transpose()?;

        let seq_dir = self.layout().sequence_dir(&config.name);
        let result = build(
            BuildInputs {
                points,
                config,
                sequence_dir: &seq_dir,
                track: track.as_ref(),
                logo: logo.as_ref(),
                session: session.as_ref(),
            },
            &BuildOptions {
                threading: self.config.threading(),
                cancel: cancel.clone(),
            },
        )?;
        cancel.check("commit")?;

        let sidecar = self.layout().sidecar_path(&config.name);
        save_gpx_file(&sidecar, &config.name, &result.track_points())?;
        if let Err(e) = self.store.put(&result) {
            let _ = remove_file_if_exists(&sidecar);
            return Err(e);
        }
        if let Err(e) = self.store.clear_scratch() {
            tracing::warn!("failed to clear scratch after commit: {e}");
        }
        Ok(Summary::from_result(
            &result,
            DestinationStatus::recorded(&result.sequence.destination),
        ))
    }

    fn resolve_session(&self, config: &SequenceConfig) -> GeoseqResult<Option<Session>> {
        let kind = config.destination.kind;
        if kind == DestinationKind::Local || config.destination.external_sequence_id.is_some() {
            return Ok(None);
        }
        let service = self.destination.as_deref().ok_or_else(|| {
            GeoseqError::validation(format!("no integration configured for {kind:?} destinations"))
        })?;
        let credential = self
            .credential(kind)?
            .ok_or_else(|| GeoseqError::external(format!("no token stored for {kind:?}")))?;
        service.resolve_session(&credential).map(Some)
    }

    fn reserve_name(&self, name: &str) -> GeoseqResult<NameReservation<'_>> {
        let mut names = self.busy_names.lock().unwrap_or_else(|p| p.into_inner());
        if !names.insert(name.to_string()) {
            return Err(GeoseqError::validation(format!(
                "sequence '{name}' is already being ingested or committed"
            )));
        }
        Ok(NameReservation {
            names: &self.busy_names,
            name: name.to_string(),
        })
    }

    fn ensure_name_free(&self, name: &str) -> GeoseqResult<()> {
        let dir = self.layout().sequence_dir(name);
        if self
            .store
            .entries()?
            .values()
            .any(|r| r.sequence.uploader_sequence_name == dir)
        {
            return Err(GeoseqError::validation(format!(
                "a committed sequence named '{name}' already exists"
            )));
        }
        Ok(())
    }

    /// All committed sequences, newest first, with destination status refreshed when a
    /// destination client and credential are available.
    #[tracing::instrument(skip(self))]
    pub fn list_sequences(&self) -> GeoseqResult<Vec<Summary>> {
        let credential = self.credential(DestinationKind::Mapillary)?;
        let status = match (self.destination.as_deref(), credential.as_deref()) {
            (Some(service), Some(credential)) => Some(StatusSource { service, credential }),
            _ => None,
        };
        self.store.list(status)
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_sequence(&self, id: &str) -> GeoseqResult<bool> {
        self.store.remove(id)
    }

    /// Abandon the in-progress sequence described by `config`.
    #[tracing::instrument(skip_all, fields(name = %config.name))]
    pub fn reset_sequence(&self, config: &SequenceConfig) -> GeoseqResult<()> {
        self.cancel_in_flight();
        self.store.reset(config)
    }

    /// Attach an external sequence key to a committed sequence after the fact.
    #[tracing::instrument(skip(self))]
    pub fn link_destination(&self, id: &str, key: &str) -> GeoseqResult<Summary> {
        let result = self.store.link_destination(id, key)?;
        Ok(Summary::from_result(
            &result,
            DestinationStatus::recorded(&result.sequence.destination),
        ))
    }

    /// Cancel running work, drop the in-progress sequence (if any) and empty the scratch area.
    #[tracing::instrument(skip_all)]
    pub fn shutdown(&self, in_progress: Option<&SequenceConfig>) -> GeoseqResult<()> {
        self.cancel_in_flight();
        match in_progress {
            Some(config) => self.store.reset(config),
            None => self.store.clear_scratch(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/workspace.rs"]
mod tests;
