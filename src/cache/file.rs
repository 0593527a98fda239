//! Durable cache store: one JSON file per key.
//!
//! Writes go to a uniquely named temp file in the same directory and are
//! renamed into place, so readers see either the old entry or the new one.

use super::{CacheEntry, CacheError, CacheKey, CacheStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the directory up front so the first write cannot fail on it.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir).await?;
        info!("File cache store at {}", store.dir.display());
        Ok(store)
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.storage_name()))
    }

    fn tmp_path_for(&self, key: &CacheKey) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            ".{}.{}.{}.tmp",
            key.storage_name(),
            std::process::id(),
            n
        ))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss for key: {}", key);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let entry = serde_json::from_slice(&bytes)?;
        debug!("Cache hit for key: {}", key);
        Ok(Some(entry))
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let json = serde_json::to_vec(&entry)?;
        fs::create_dir_all(&self.dir).await?;

        let tmp = self.tmp_path_for(key);
        let path = self.path_for(key);

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {}", json.len(), path.display());
        Ok(())
    }

    fn backing(&self) -> &'static str {
        "file"
    }
}
