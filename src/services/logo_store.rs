//! Durable fingerprint → data URI document
//!
//! The whole store is one JSON object on disk. It is read in full on every
//! lookup and rewritten in full on every insert; writes go through a
//! temporary file in the same directory followed by a rename, so readers
//! see either the old or the new document and never a partial one.
//!
//! Entries are never replaced or removed. When a write fails the entry stays
//! in a pending set that is merged into the next write and into [`LogoStore::flush`].

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::errors::{StoreError, StoreResult};

/// Fingerprint → data URI
pub type LogoMap = BTreeMap<String, String>;

#[derive(Clone)]
pub struct LogoStore {
    path: PathBuf,
    /// Held across a whole read-modify-write cycle; readers never take it
    write_lock: Arc<tokio::sync::Mutex<()>>,
    /// Entries not yet on disk, only locked for short map operations
    pending: Arc<Mutex<LogoMap>>,
}

impl LogoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            pending: Arc::new(Mutex::new(LogoMap::new())),
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, LogoMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document. A missing or unreadable document is empty.
    pub async fn load(&self) -> LogoMap {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<LogoMap>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Logo store {} is not a valid document, treating as empty: {}",
                        self.path.display(),
                        e
                    );
                    LogoMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LogoMap::new(),
            Err(e) => {
                warn!("Failed to read logo store {}: {}", self.path.display(), e);
                LogoMap::new()
            }
        }
    }

    /// Serialise `logos` and atomically replace the persisted document
    pub async fn save(&self, logos: &LogoMap) -> StoreResult<()> {
        let contents = serde_json::to_vec_pretty(logos)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|e| StoreError::Persist {
                path: self.path.clone(),
                message: e.to_string(),
            })?
    }

    /// Look up one fingerprint, including entries still waiting to be persisted
    pub async fn get(&self, fingerprint: &str) -> Option<String> {
        let pending = self.pending().get(fingerprint).cloned();
        if pending.is_some() {
            return pending;
        }
        self.load().await.get(fingerprint).cloned()
    }

    /// Add a logo unless the fingerprint is already present.
    ///
    /// Returns `Ok(true)` when the document was rewritten with the new entry
    /// and `Ok(false)` when the fingerprint already existed. On a write error
    /// the entry is kept pending and the error is returned to the caller.
    pub async fn insert(&self, fingerprint: &str, data_uri: &str) -> StoreResult<bool> {
        let _writing = self.write_lock.lock().await;
        let mut logos = self.load().await;

        if logos.contains_key(fingerprint) {
            debug!("Logo {} already stored, keeping existing entry", fingerprint);
            return Ok(false);
        }

        let unsaved = {
            let mut pending = self.pending();
            pending
                .entry(fingerprint.to_string())
                .or_insert_with(|| data_uri.to_string());
            pending.clone()
        };
        for (key, value) in &unsaved {
            logos.entry(key.clone()).or_insert_with(|| value.clone());
        }

        self.save(&logos).await?;
        self.forget_saved(&unsaved);
        info!(
            "Stored logo {} ({} logos in {})",
            fingerprint,
            logos.len(),
            self.path.display()
        );
        Ok(true)
    }

    /// Write any entries whose earlier persistence failed
    pub async fn flush(&self) -> StoreResult<usize> {
        let _writing = self.write_lock.lock().await;
        let unsaved = self.pending().clone();
        if unsaved.is_empty() {
            return Ok(0);
        }

        let mut logos = self.load().await;
        let mut added = 0;
        for (key, value) in &unsaved {
            if !logos.contains_key(key) {
                logos.insert(key.clone(), value.clone());
                added += 1;
            }
        }

        self.save(&logos).await?;
        self.forget_saved(&unsaved);
        info!("Flushed {} pending logos to {}", added, self.path.display());
        Ok(added)
    }

    fn forget_saved(&self, saved: &LogoMap) {
        let mut pending = self.pending();
        for key in saved.keys() {
            pending.remove(key);
        }
    }

    /// Number of entries not yet persisted
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Number of persisted entries
    pub async fn len(&self) -> usize {
        self.load().await.len()
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        message: e.error.to_string(),
    })?;
    Ok(())
}
