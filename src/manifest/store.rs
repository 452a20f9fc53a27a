use std::{collections::BTreeMap, sync::Mutex};

use crate::{
    destination::service::DestinationService,
    foundation::{
        durable::{remove_dir_if_exists, remove_file_if_exists, write_atomic},
        error::{GeoseqError, GeoseqResult},
    },
    manifest::{
        layout::WorkspaceLayout,
        summary::{DestinationStatus, Summary},
    },
    sequence::model::{DestinationKind, SequenceConfig, SequenceResult, validate_sequence_name},
};

/// The persisted manifest document: sequence id -> committed result.
pub type Manifest = BTreeMap<String, SequenceResult>;

/// Destination lookup used by `list` to refresh display status.
#[derive(Clone, Copy)]
pub struct StatusSource<'a> {
    pub service: &'a dyn DestinationService,
    pub credential: &'a str,
}

/// Sole owner of `manifest.json`.
///
/// Every read-modify-write runs under one mutex and lands through a temp-file rename, so a
/// reader in this process never sees a half-applied mutation. Asset deletion and destination
/// calls happen after the lock is released.
pub struct ManifestStore {
    layout: WorkspaceLayout,
    write_lock: Mutex<()>,
}

impl ManifestStore {
    pub fn open(layout: WorkspaceLayout) -> GeoseqResult<Self> {
        layout.ensure()?;
        Ok(Self {
            layout,
            write_lock: Mutex::new(()),
        })
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn read(&self) -> GeoseqResult<Manifest> {
        let path = self.layout.manifest_path();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Manifest::new()),
            Err(e) => {
                return Err(GeoseqError::manifest_io(format!(
                    "read '{}': {e}",
                    path.display()
                )));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Manifest::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| GeoseqError::manifest_io(format!("parse '{}': {e}", path.display())))
    }

    fn write(&self, manifest: &Manifest) -> GeoseqResult<()> {
        let bytes = serde_json::to_vec_pretty(manifest)
            .map_err(|e| GeoseqError::manifest_io(format!("serialize manifest: {e}")))?;
        write_atomic(&self.layout.manifest_path(), &bytes)
            .map_err(|e| GeoseqError::manifest_io(format!("{e:#}")))
    }

    /// Raw manifest contents, without pruning.
    pub fn entries(&self) -> GeoseqResult<Manifest> {
        let _guard = self.lock();
        self.read()
    }

    pub fn get(&self, id: &str) -> GeoseqResult<Option<SequenceResult>> {
        Ok(self.entries()?.remove(id))
    }

    /// Insert or replace the entry keyed by `result.sequence.id`. A result pointing at an asset
    /// directory owned by a different id is refused.
    #[tracing::instrument(skip_all, fields(id = %result.sequence.id))]
    pub fn put(&self, result: &SequenceResult) -> GeoseqResult<()> {
        if result.sequence.id.is_empty() {
            return Err(GeoseqError::validation("sequence id must be non-empty"));
        }
        let _guard = self.lock();
        let mut manifest = self.read()?;
        if let Some(owner) = manifest.values().find(|r| {
            r.sequence.id != result.sequence.id
                && r.sequence.uploader_sequence_name == result.sequence.uploader_sequence_name
        }) {
            return Err(GeoseqError::validation(format!(
                "asset directory '{}' already belongs to sequence '{}'",
                result.sequence.uploader_sequence_name.display(),
                owner.sequence.id
            )));
        }
        manifest.insert(result.sequence.id.clone(), result.clone());
        self.write(&manifest)?;
        tracing::info!(name = %result.sequence.name, photos = result.photo.len(), "committed sequence");
        Ok(())
    }

    /// Summaries of all committed sequences, newest first.
    ///
    /// Entries whose asset directory has disappeared are dropped from the manifest (and their
    /// sidecar track deleted). When `status` is given, linked entries are checked against the
    /// destination; a failed check marks that entry only.
    #[tracing::instrument(skip_all)]
    pub fn list(&self, status: Option<StatusSource<'_>>) -> GeoseqResult<Vec<Summary>> {
        let (live, pruned) = {
            let _guard = self.lock();
            let mut manifest = self.read()?;
            let missing: Vec<String> = manifest
                .iter()
                .filter(|(_, r)| !r.sequence.uploader_sequence_name.is_dir())
                .map(|(id, _)| id.clone())
                .collect();
            let mut pruned = Vec::with_capacity(missing.len());
            for id in &missing {
                if let Some(r) = manifest.remove(id) {
                    pruned.push(r);
                }
            }
            if !pruned.is_empty() {
                self.write(&manifest)?;
            }
            (manifest, pruned)
        };

        for r in &pruned {
            tracing::warn!(
                id = %r.sequence.id,
                dir = %r.sequence.uploader_sequence_name.display(),
                "pruned sequence whose asset directory is gone"
            );
            let sidecar = self.layout.sidecar_path(&r.sequence.name);
            if let Err(e) = remove_file_if_exists(&sidecar) {
                tracing::warn!(path = %sidecar.display(), "failed to remove sidecar track: {e:#}");
            }
        }

        let mut out: Vec<Summary> = live
            .values()
            .map(|r| Summary::from_result(r, destination_status(r, status)))
            .collect();
        out.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Delete an entry with its asset directory and sidecar track. Unknown ids are a no-op.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, id: &str) -> GeoseqResult<bool> {
        let removed = {
            let _guard = self.lock();
            let mut manifest = self.read()?;
            let removed = manifest.remove(id);
            if removed.is_some() {
                self.write(&manifest)?;
            }
            removed
        };
        let Some(r) = removed else {
            tracing::debug!("no such sequence");
            return Ok(false);
        };
        remove_dir_if_exists(&r.sequence.uploader_sequence_name)
            .map_err(|e| GeoseqError::manifest_io(format!("{e:#}")))?;
        remove_file_if_exists(&self.layout.sidecar_path(&r.sequence.name))
            .map_err(|e| GeoseqError::manifest_io(format!("{e:#}")))?;
        tracing::info!(name = %r.sequence.name, "removed sequence");
        Ok(true)
    }

    /// Discard an uncommitted build's assets and the scratch area. The manifest is untouched,
    /// and a directory owned by a committed entry is left alone.
    #[tracing::instrument(skip_all, fields(name = %config.name))]
    pub fn reset(&self, config: &SequenceConfig) -> GeoseqResult<()> {
        validate_sequence_name(&config.name)?;
        let dir = self.layout.sequence_dir(&config.name);
        let committed = self
            .entries()?
            .values()
            .any(|r| r.sequence.uploader_sequence_name == dir);

        if committed {
            tracing::debug!("sequence directory belongs to a committed entry; keeping it");
        } else if remove_dir_if_exists(&dir).map_err(|e| GeoseqError::manifest_io(format!("{e:#}")))? {
            tracing::info!(dir = %dir.display(), "discarded in-progress sequence");
        }
        self.clear_scratch()
    }

    /// Empty the scratch directory, leaving it in place.
    pub fn clear_scratch(&self) -> GeoseqResult<()> {
        let scratch = self.layout.scratch_dir();
        remove_dir_if_exists(&scratch).map_err(|e| GeoseqError::manifest_io(format!("{e:#}")))?;
        std::fs::create_dir_all(&scratch).map_err(|e| {
            GeoseqError::manifest_io(format!("create '{}': {e}", scratch.display()))
        })
    }

    /// Record the external sequence key for a committed entry. A later link replaces an
    /// earlier one.
    #[tracing::instrument(skip(self))]
    pub fn link_destination(&self, id: &str, key: &str) -> GeoseqResult<SequenceResult> {
        if key.trim().is_empty() {
            return Err(GeoseqError::validation("destination key must be non-empty"));
        }
        let _guard = self.lock();
        let mut manifest = self.read()?;
        let entry = manifest
            .get_mut(id)
            .ok_or_else(|| GeoseqError::validation(format!("no committed sequence with id '{id}'")))?;
        if entry.sequence.destination.kind == DestinationKind::Local {
            return Err(GeoseqError::validation(format!(
                "sequence '{}' has a local destination and cannot be linked",
                entry.sequence.name
            )));
        }
        if let Some(prev) = &entry.sequence.destination.external_sequence_id
            && prev != key
        {
            tracing::info!(previous = %prev, "replacing destination key");
        }
        entry.sequence.destination.external_sequence_id = Some(key.to_string());
        let updated = entry.clone();
        self.write(&manifest)?;
        Ok(updated)
    }
}

fn destination_status(result: &SequenceResult, status: Option<StatusSource<'_>>) -> DestinationStatus {
    let recorded = DestinationStatus::recorded(&result.sequence.destination);
    let Some(source) = status else {
        return recorded;
    };
    let DestinationStatus::Pending { key } = recorded else {
        return recorded;
    };
    match source
        .service
        .check_sequence_status(source.credential, &key, &result.photo)
    {
        Ok(s) if s.linked => DestinationStatus::Linked { key },
        Ok(_) => DestinationStatus::Pending { key },
        Err(e) => {
            tracing::warn!(id = %result.sequence.id, "destination status check failed: {e}");
            DestinationStatus::Error {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/store.rs"]
mod tests;
