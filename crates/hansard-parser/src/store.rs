use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::DailyPart;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid stored record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keeps daily parts by identifier. Saving an identifier that already exists
/// replaces the stored record.
pub trait Store {
    fn find_or_create<F>(&mut self, id: &str, init: F) -> Result<DailyPart, StoreError>
    where
        F: FnOnce() -> DailyPart;

    fn save(&mut self, daily_part: &DailyPart) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, DailyPart>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&DailyPart> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Store for MemoryStore {
    fn find_or_create<F>(&mut self, id: &str, init: F) -> Result<DailyPart, StoreError>
    where
        F: FnOnce() -> DailyPart,
    {
        Ok(self.records.get(id).cloned().unwrap_or_else(init))
    }

    fn save(&mut self, daily_part: &DailyPart) -> Result<(), StoreError> {
        self.records
            .insert(daily_part.id.clone(), daily_part.clone());
        Ok(())
    }
}

/// One `<id>.json` file per daily part.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl Store for JsonStore {
    fn find_or_create<F>(&mut self, id: &str, init: F) -> Result<DailyPart, StoreError>
    where
        F: FnOnce() -> DailyPart,
    {
        let path = self.path_for(id);
        if !path.exists() {
            log::debug!("No stored record for {}, creating", id);
            return Ok(init());
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&mut self, daily_part: &DailyPart) -> Result<(), StoreError> {
        let path = self.path_for(&daily_part.id);
        let json = serde_json::to_string_pretty(daily_part)?;
        fs::write(&path, json)?;
        log::info!("Saved {} to {}", daily_part.id, path.display());
        Ok(())
    }
}
