//! State persistence in JSON files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use squawk_core::{Persistence, PersistenceError, PersistenceResult};

/// Stores each state blob as `<dir>/<name>`.
///
/// A blob that was never saved loads as an empty object. Writes go to a
/// temporary file next to the target which is then renamed over it, so a
/// crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file backing the named blob.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

#[async_trait]
impl Persistence for JsonFileStore {
    async fn load_blob(&self, name: &str) -> PersistenceResult<Value> {
        let path = self.path_of(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No state file yet, starting empty");
                return Ok(Value::Object(Map::new()));
            }
            Err(e) => return Err(PersistenceError::read(name, e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| PersistenceError::malformed(name, e))
    }

    async fn save_blob(&self, name: &str, value: &Value) -> PersistenceResult<()> {
        let path = self.path_of(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        let data = serde_json::to_vec(value).map_err(|e| PersistenceError::write(name, e))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::write(name, e))?;
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| PersistenceError::write(name, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PersistenceError::write(name, e))?;

        debug!(path = %path.display(), bytes = data.len(), "State file written");
        Ok(())
    }
}
