use std::{io::Write as _, path::Path};

use anyhow::Context as _;

/// Replace `path` with `bytes` via a temp file in the same directory and a rename, so readers
/// see either the old or the new content.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create '{}'", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in '{}'", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temp file for '{}'", path.display()))?;
    tmp.flush()
        .with_context(|| format!("flush temp file for '{}'", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for '{}'", path.display()))?;
    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("replace '{}': {}", path.display(), e.error))?;
    Ok(())
}

/// Remove a directory tree; a missing directory is not an error.
pub(crate) fn remove_dir_if_exists(path: &Path) -> anyhow::Result<bool> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("remove '{}'", path.display())),
    }
}

/// Remove a file; a missing file is not an error.
pub(crate) fn remove_file_if_exists(path: &Path) -> anyhow::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("remove '{}'", path.display())),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/durable.rs"]
mod tests;
