//! JSON file state store.
//!
//! One project per file, the full `ProjectState` as a single JSON
//! document. Saves create the parent directory and go through a
//! temp-file-plus-rename so readers only ever see committed snapshots.

use async_trait::async_trait;
use foreman_application::ports::state_store::{StateStore, StateStoreError};
use foreman_domain::ProjectState;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<Option<ProjectState>, StateStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(StateStoreError::Io(e.to_string())),
        };
        let state = serde_json::from_slice(&bytes)
            .map_err(|e| StateStoreError::Serde(e.to_string()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &ProjectState) -> Result<(), StateStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StateStoreError::Io(e.to_string()))?;
        }

        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| StateStoreError::Serde(e.to_string()))?;

        // Write-through-rename: the target path is swapped atomically
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| StateStoreError::Io(e.to_string()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StateStoreError::Io(e.to_string()))?;
        Ok(())
    }
}
