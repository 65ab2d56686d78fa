use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use common::prelude::{Sheet, SheetError};

use crate::store::{AccessGrant, CredentialStore};

/// One cached document. Entries are immutable snapshots; an edit
/// republishes a replacement entry rather than mutating in place.
#[derive(Debug)]
pub struct CachedSheet {
    /// The path the client asked for: `label/relative-path`.
    pub client_path: String,
    /// Canonical filesystem path, the cache key.
    pub path: PathBuf,
    pub sheet: Sheet,
    /// Digest of the document as last loaded from or saved to disk.
    pub loaded_sum: blake3::Hash,
    /// Digest of the in-memory document.
    pub current_sum: blake3::Hash,
}

impl CachedSheet {
    /// The in-memory copy has diverged from disk.
    pub fn dirty(&self) -> bool {
        self.loaded_sum != self.current_sum
    }
}

/// Process-wide map of canonical path to loaded document.
///
/// Guarantees a single shared instance per canonical path for the
/// lifetime of the process; entries are never evicted. The lock guards
/// the map structure only, and no file I/O ever happens while it is
/// held, so a slow load never blocks unrelated paths.
#[derive(Debug, Clone, Default)]
pub struct SheetCache {
    entries: Arc<Mutex<HashMap<PathBuf, Arc<CachedSheet>>>>,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a client path for a user into the shared cached document
    /// and the grant it was reached through.
    ///
    /// The caller has already been authenticated; `user` is the session
    /// owner. The first path segment names an access-list label, the
    /// rest is relative to that grant's root.
    pub async fn resolve(
        &self,
        store: &CredentialStore,
        user: &str,
        client_path: &str,
    ) -> Result<(Arc<CachedSheet>, AccessGrant), ResolveError> {
        let (label, rel) = split_client_path(client_path)?;
        let access = store
            .access_list(user)
            .ok_or_else(|| ResolveError::UnknownLabel(label.to_string()))?;
        let grant = access
            .get(label)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownLabel(label.to_string()))?;
        let path = resolve_in_grant(&grant, rel)?;

        // Fast path: already loaded.
        if let Some(entry) = self.entries.lock().get(&path) {
            return Ok((entry.clone(), grant));
        }

        // Load outside the lock.
        let load_path = path.clone();
        let sheet = tokio::task::spawn_blocking(move || Sheet::load(&load_path))
            .await
            .map_err(|_| ResolveError::LoadCancelled)??;
        let sum = sheet.checksum();
        let entry = Arc::new(CachedSheet {
            client_path: client_path.to_string(),
            path: path.clone(),
            sheet,
            loaded_sum: sum,
            current_sum: sum,
        });

        // Double-check: another caller may have published this path while
        // we were loading. First writer wins; our copy is discarded.
        let mut entries = self.entries.lock();
        match entries.get(&path) {
            Some(winner) => {
                tracing::debug!(path = %path.display(), "discarding losing concurrent load");
                Ok((winner.clone(), grant))
            }
            None => {
                entries.insert(path, entry.clone());
                Ok((entry, grant))
            }
        }
    }

    /// Replace the entry for this document's path. Used after a field
    /// update or save produces a new snapshot.
    pub fn republish(&self, entry: Arc<CachedSheet>) {
        self.entries.lock().insert(entry.path.clone(), entry);
    }

    /// Write a document back to disk if it has diverged. Returns false
    /// when the entry was clean and nothing was written. On a write
    /// failure the entry is left untouched and still dirty.
    pub async fn save(&self, entry: &Arc<CachedSheet>) -> Result<bool, ResolveError> {
        if !entry.dirty() {
            return Ok(false);
        }
        let sheet = entry.sheet.clone();
        let path = entry.path.clone();
        tokio::task::spawn_blocking(move || sheet.save(&path))
            .await
            .map_err(|_| ResolveError::LoadCancelled)??;
        self.republish(Arc::new(CachedSheet {
            client_path: entry.client_path.clone(),
            path: entry.path.clone(),
            sheet: entry.sheet.clone(),
            loaded_sum: entry.current_sum,
            current_sum: entry.current_sum,
        }));
        Ok(true)
    }
}

fn split_client_path(client_path: &str) -> Result<(&str, &str), ResolveError> {
    let trimmed = client_path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ResolveError::BadPath(client_path.to_string()));
    }
    Ok(match trimmed.split_once('/') {
        Some((label, rest)) => (label, rest),
        None => (trimmed, ""),
    })
}

/// Canonicalize `rel` against the grant's root, refusing absolute paths
/// and anything that would escape the root.
fn resolve_in_grant(grant: &AccessGrant, rel: &str) -> Result<PathBuf, ResolveError> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Err(ResolveError::BadPath(rel.to_string()));
    }
    for component in rel_path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(ResolveError::BadPath(rel.to_string())),
        }
    }
    let root = grant
        .dir
        .canonicalize()
        .map_err(|e| ResolveError::Storage(grant.dir.display().to_string(), e))?;
    let full = root
        .join(rel_path)
        .canonicalize()
        .map_err(|e| ResolveError::Storage(rel.to_string(), e))?;
    // Symlinks may point anywhere; re-check after resolution.
    if !full.starts_with(&root) {
        return Err(ResolveError::BadPath(rel.to_string()));
    }
    Ok(full)
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no access entry named {0:?}")]
    UnknownLabel(String),
    #[error("invalid path: {0}")]
    BadPath(String),
    #[error("storage error for {0}: {1}")]
    Storage(String, #[source] std::io::Error),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("load task cancelled")]
    LoadCancelled,
}
