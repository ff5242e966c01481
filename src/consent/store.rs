use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Mutex,
};

use serde_json::Value;
use thiserror::Error;

use crate::consent::record::ConsentRecord;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("consent storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored consent document is corrupt: {0}")]
    Corrupt(String),
}

/// Persistence seam for consent decisions. `load` hands back the raw stored
/// document so the caller can normalize it; a `Corrupt` error means the
/// document exists but cannot be read as JSON at all.
pub trait ConsentStore: Send + Sync {
    fn load(&self) -> Result<Option<Value>, StoreError>;
    fn save(&self, record: &ConsentRecord) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Versioned consent document on disk. Bump the file name when the record
/// shape changes so stale documents fall through normalization untouched.
#[derive(Debug, Clone)]
pub struct FileConsentStore {
    path: PathBuf,
}

pub const CONSENT_FILE_NAME: &str = "consent_v1.json";

impl FileConsentStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(CONSENT_FILE_NAME),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ConsentStore for FileConsentStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "failed to read consent document '{}': {err}",
                    self.path.display()
                )));
            }
        };

        let document: Value = serde_json::from_str(&content).map_err(|err| {
            StoreError::Corrupt(format!(
                "failed to parse consent document '{}': {err}",
                self.path.display()
            ))
        })?;

        Ok(Some(document))
    }

    fn save(&self, record: &ConsentRecord) -> Result<(), StoreError> {
        let parent = self.path.parent().ok_or_else(|| {
            StoreError::Unavailable(format!(
                "consent document path '{}' has no parent",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(|err| {
            StoreError::Unavailable(format!(
                "failed to create consent directory '{}': {err}",
                parent.display()
            ))
        })?;

        let tmp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&tmp_path).map_err(|err| {
            StoreError::Unavailable(format!(
                "failed to create consent temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;
        {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, record).map_err(|err| {
                StoreError::Unavailable(format!(
                    "failed to serialize consent document '{}': {err}",
                    tmp_path.display()
                ))
            })?;
            writer.write_all(b"\n").and_then(|()| writer.flush()).map_err(|err| {
                StoreError::Unavailable(format!(
                    "failed to finalize consent document '{}': {err}",
                    tmp_path.display()
                ))
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|err| {
            StoreError::Unavailable(format!(
                "failed to replace consent document '{}' from '{}': {err}",
                self.path.display(),
                tmp_path.display()
            ))
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Unavailable(format!(
                "failed to remove consent document '{}': {err}",
                self.path.display()
            ))),
        }
    }
}

/// In-process store for hosts without durable storage, and for tests.
#[derive(Debug, Default)]
pub struct MemoryConsentStore {
    slot: Mutex<Option<Value>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsentStore for MemoryConsentStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("consent slot lock poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, record: &ConsentRecord) -> Result<(), StoreError> {
        let document = serde_json::to_value(record).map_err(|err| {
            StoreError::Unavailable(format!("failed to serialize consent record: {err}"))
        })?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("consent slot lock poisoned".to_string()))?;
        *slot = Some(document);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("consent slot lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}
