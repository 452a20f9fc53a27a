use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::GeoseqResult;

/// On-disk layout of a workspace, derived entirely from its root directory.
///
/// ```text
/// <root>/
///   sequences/
///     manifest.json
///     assets/<name>/            composited photos
///     assets/<name>/original/   ingested originals
///     tracks/<name>.gpx         exported track
///   tmp/                        scratch for previews and normalized logos
///   tokens.json
/// ```
///
/// Sequence names only ever appear below `assets/` and `tracks/`, so no name can land on the
/// manifest or on another sequence's files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sequences_dir(&self) -> PathBuf {
        self.root.join("sequences")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.sequences_dir().join("manifest.json")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.sequences_dir().join("assets")
    }

    pub fn tracks_dir(&self) -> PathBuf {
        self.sequences_dir().join("tracks")
    }

    /// Asset directory of the sequence called `name`.
    pub fn sequence_dir(&self, name: &str) -> PathBuf {
        self.assets_dir().join(name)
    }

    pub fn originals_dir(&self, name: &str) -> PathBuf {
        self.sequence_dir(name).join("original")
    }

    /// Exported GPX track of the sequence called `name`.
    pub fn sidecar_path(&self, name: &str) -> PathBuf {
        self.tracks_dir().join(format!("{name}.gpx"))
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.root.join("tokens.json")
    }

    /// Create the workspace directories if they are missing.
    pub fn ensure(&self) -> GeoseqResult<()> {
        for dir in [self.assets_dir(), self.tracks_dir(), self.scratch_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create workspace dir '{}'", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/layout.rs"]
mod tests;
