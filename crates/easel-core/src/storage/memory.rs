//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::codec;
use crate::scene::Scene;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    projects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw bytes under `id`, bypassing the codec.
    pub fn insert_raw(&self, id: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let mut projects = self
            .projects
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        projects.insert(id.to_string(), bytes);
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let bytes = codec::serialize(scene);
        Box::pin(async move {
            let bytes = bytes?;
            self.insert_raw(&id, bytes)
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            let bytes = projects.get(&id).ok_or(StorageError::NotFound(id))?;
            Ok(codec::deserialize(bytes)?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut projects = self
                .projects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(projects.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(projects.contains_key(&id))
        })
    }
}
