use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::foundation::{
    durable::write_atomic,
    error::{GeoseqError, GeoseqResult},
};

/// Persistent key -> token lookup for destination credentials.
pub struct TokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored tokens. A missing file reads as empty.
    pub fn all(&self) -> GeoseqResult<BTreeMap<String, String>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(GeoseqError::manifest_io(format!(
                    "read token store '{}': {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            GeoseqError::manifest_io(format!(
                "parse token store '{}': {e}",
                self.path.display()
            ))
        })
    }

    pub fn get(&self, key: &str) -> GeoseqResult<Option<String>> {
        Ok(self.all()?.remove(key))
    }

    /// Insert or replace a token. An empty token removes the key.
    pub fn set(&self, key: &str, token: &str) -> GeoseqResult<()> {
        if key.is_empty() {
            return Err(GeoseqError::validation("token key must be non-empty"));
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut tokens = self.all()?;
        if token.is_empty() {
            tokens.remove(key);
        } else {
            tokens.insert(key.to_string(), token.to_string());
        }
        let bytes = serde_json::to_vec_pretty(&tokens)
            .map_err(|e| GeoseqError::manifest_io(format!("serialize token store: {e}")))?;
        write_atomic(&self.path, &bytes)
            .map_err(|e| GeoseqError::manifest_io(format!("{e:#}")))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/destination/tokens.rs"]
mod tests;
