use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use engine_logging::engine_debug;
use harvester_core::{Resource, ResourceId};
use serde::{Deserialize, Serialize};

use crate::capability::ResourceEnumerator;
use crate::persist::{write_atomic, PersistError};
use crate::{DestroyError, EnumerationError};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory io error: {0}")]
    Io(#[from] io::Error),
    #[error("inventory is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// A window (or workspace) and the resources it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: u64,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Inventory {
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.containers.iter().flat_map(|c| c.resources.iter())
    }

    /// First resource flagged active in each container.
    pub fn active(&self) -> Vec<Resource> {
        self.containers
            .iter()
            .filter_map(|c| c.resources.iter().find(|r| r.active).cloned())
            .collect()
    }

    fn remove(&mut self, id: ResourceId) -> bool {
        for container in &mut self.containers {
            if let Some(pos) = container.resources.iter().position(|r| r.id == id) {
                container.resources.remove(pos);
                return true;
            }
        }
        false
    }
}

/// Resource enumerator backed by a JSON inventory file that some host
/// bridge keeps up to date. Destroying a resource removes it from the file.
#[derive(Debug)]
pub struct InventoryFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl InventoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Inventory, InventoryError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, inventory: &Inventory) -> Result<(), InventoryError> {
        let content = serde_json::to_string_pretty(inventory)?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }

    fn remove(&self, id: ResourceId) -> Result<bool, InventoryError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut inventory = self.load()?;
        if !inventory.remove(id) {
            return Ok(false);
        }
        self.save(&inventory)?;
        Ok(true)
    }
}

fn listing_error(err: InventoryError) -> EnumerationError {
    match err {
        InventoryError::Parse(err) => EnumerationError::Malformed(err.to_string()),
        other => EnumerationError::Unavailable(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ResourceEnumerator for InventoryFile {
    async fn list_all(&self) -> Result<Vec<Resource>, EnumerationError> {
        let inventory = self.load().map_err(listing_error)?;
        Ok(inventory.resources().cloned().collect())
    }

    async fn list_active(&self) -> Result<Vec<Resource>, EnumerationError> {
        Ok(self.load().map_err(listing_error)?.active())
    }

    async fn destroy(&self, id: ResourceId) -> Result<(), DestroyError> {
        match self.remove(id) {
            Ok(true) => {
                engine_debug!("removed resource {} from {:?}", id, self.path);
                Ok(())
            }
            Ok(false) => Err(DestroyError::NotFound(id)),
            Err(err) => Err(DestroyError::Refused(err.to_string())),
        }
    }
}
