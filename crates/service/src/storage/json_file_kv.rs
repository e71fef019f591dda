use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::PersistentKv;
use crate::errors::StorageError;

/// JSON file-backed `key -> string` store.
///
/// The whole map lives in memory and is rewritten to disk on every `set`.
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous file intact.
#[derive(Clone)]
pub struct JsonFileKv {
    inner: Arc<RwLock<HashMap<String, String>>>,
    file_path: PathBuf,
}

impl JsonFileKv {
    /// Open the store at `path`, creating an empty file if missing.
    ///
    /// A file that exists but does not hold a JSON object of strings is an
    /// error rather than an empty store, so data is never silently dropped.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StorageError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let map: HashMap<String, String> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::malformed(&file_path.display().to_string(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = HashMap::new();
                write_map(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %file_path.display(), keys = map.len(), "kv store opened");

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.file_path
    }
}

async fn write_map(path: &std::path::Path, map: &HashMap<String, String>) -> Result<(), StorageError> {
    let data = serde_json::to_vec(map).map_err(|e| StorageError::Serialize(e.to_string()))?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl PersistentKv for JsonFileKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().await;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        // Hold the write lock across the disk write so concurrent sets land in order.
        let mut map = self.inner.write().await;
        let previous = map.insert(key.to_string(), value);
        if let Err(e) = write_map(&self.file_path, &map).await {
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
