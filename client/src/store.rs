//! Persistence for mirrored game records.

use crate::{
    error::{EscrowError, Result},
    state::GameRecord,
};
use fs2::FileExt;
use std::{
    collections::HashMap,
    ffi::OsString,
    fs::{File, OpenOptions},
    future::Future,
    path::{Path, PathBuf},
};
use tokio::sync::RwLock;
use tracing::debug;

pub trait GameStore: Send + Sync {
    fn create(&self, record: GameRecord) -> impl Future<Output = Result<GameRecord>> + Send;

    fn find_by_id(&self, id: &str) -> impl Future<Output = Result<Option<GameRecord>>> + Send;

    /// Flips the closed flag; `None` if no record has this id.
    fn mark_closed(&self, id: &str) -> impl Future<Output = Result<Option<GameRecord>>> + Send;
}

#[derive(Default)]
pub struct MemoryGameStore {
    records: RwLock<HashMap<String, GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl GameStore for MemoryGameStore {
    async fn create(&self, record: GameRecord) -> Result<GameRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(EscrowError::Store(format!("duplicate game id {}", record.id)));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<GameRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn mark_closed(&self, id: &str) -> Result<Option<GameRecord>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(id).map(|record| {
            record.is_closed = true;
            record.clone()
        }))
    }
}

/// Keeps every record in one JSON array file so separate processes see the
/// same games. Each write replaces the file through a sibling temp file.
///
/// Every access holds an exclusive advisory lock on `<path>.lock` from load
/// to save, across processes and across handles within one process.
pub struct JsonFileGameStore {
    path: PathBuf,
}

impl JsonFileGameStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn store_error(&self, e: impl std::fmt::Display) -> EscrowError {
        EscrowError::Store(format!("{}: {e}", self.path.display()))
    }

    /// Blocks on the lock file off the runtime; released when the handle drops.
    async fn lock(&self) -> Result<File> {
        let lock_path = self.sibling(".lock");
        tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok::<_, std::io::Error>(file)
        })
        .await
        .map_err(|e| self.store_error(e))?
        .map_err(|e| self.store_error(e))
    }

    async fn load(&self) -> Result<Vec<GameRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| self.store_error(e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.store_error(e)),
        }
    }

    async fn save(&self, records: &[GameRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records).map_err(|e| self.store_error(e))?;
        let temp = self.sibling(".tmp");
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| self.store_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.store_error(e))?;
        debug!(path = %self.path.display(), records = records.len(), "saved game records");
        Ok(())
    }
}

impl GameStore for JsonFileGameStore {
    async fn create(&self, record: GameRecord) -> Result<GameRecord> {
        let _lock = self.lock().await?;
        let mut records = self.load().await?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(EscrowError::Store(format!("duplicate game id {}", record.id)));
        }
        records.push(record.clone());
        self.save(&records).await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<GameRecord>> {
        let _lock = self.lock().await?;
        Ok(self.load().await?.into_iter().find(|record| record.id == id))
    }

    async fn mark_closed(&self, id: &str) -> Result<Option<GameRecord>> {
        let _lock = self.lock().await?;
        let mut records = self.load().await?;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        record.is_closed = true;
        let closed = record.clone();
        self.save(&records).await?;
        Ok(Some(closed))
    }
}
