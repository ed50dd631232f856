//! # Collaborators
//!
//! The editor never persists or uploads by itself. Saving hands a snapshot to
//! a [`DocumentStore`]; images are uploaded through a [`FileUploader`] which
//! returns the public URL used as the image `src`. Neither call is retried.

use crate::document::Value;
use crate::field::FieldKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store rejected {key}: {reason}")]
    Rejected { key: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Refusing to upload empty file {0:?}")]
    Empty(String),

    #[error("Upload failed: {0}")]
    Failed(String),
}

/// Persistence collaborator
pub trait DocumentStore {
    fn save(&mut self, key: &FieldKey, value: &Value) -> Result<(), StoreError>;

    fn load(&self, key: &FieldKey) -> Result<Option<Value>, StoreError>;
}

/// File-upload collaborator: blob in, public URL out
pub trait FileUploader {
    fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<String, UploadError>;
}

/// In-memory store holding serialized snapshots
#[derive(Debug, Default)]
pub struct MemoryStore {
    fields: HashMap<FieldKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON last saved for `key`
    pub fn raw(&self, key: &FieldKey) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn save(&mut self, key: &FieldKey, value: &Value) -> Result<(), StoreError> {
        self.fields.insert(key.clone(), value.to_json()?);
        Ok(())
    }

    fn load(&self, key: &FieldKey) -> Result<Option<Value>, StoreError> {
        Ok(self.raw(key).map(|json| Value::from_json_or_blank(Some(json))))
    }
}

/// Store writing `<root>/<record>/<version>/<field>.json`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &FieldKey) -> PathBuf {
        self.root
            .join(&key.record_id)
            .join(&key.version)
            .join(format!("{}.json", key.field))
    }
}

impl DocumentStore for DirectoryStore {
    fn save(&mut self, key: &FieldKey, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, value.to_json_pretty()?)?;
        debug!(path = %path.display(), "Saved field");
        Ok(())
    }

    fn load(&self, key: &FieldKey) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(Value::from_json_or_blank(Some(&json))))
    }
}

/// Uploader handing out URLs under a fixed base
#[derive(Debug, Clone)]
pub struct MemoryUploader {
    base_url: String,
    uploads: Vec<(String, usize)>,
}

impl MemoryUploader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            uploads: Vec::new(),
        }
    }

    /// `(name, size)` of every upload so far
    pub fn uploads(&self) -> &[(String, usize)] {
        &self.uploads
    }
}

impl FileUploader for MemoryUploader {
    fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty(name.to_string()));
        }
        self.uploads.push((name.to_string(), bytes.len()));
        Ok(format!(
            "{}/{}-{}",
            self.base_url.trim_end_matches('/'),
            self.uploads.len(),
            name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FieldKey {
        FieldKey::new("7", "v2.1", "scientific_theory")
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load(&key()).unwrap(), None);

        store.save(&key(), &Value::blank()).unwrap();

        assert_eq!(store.load(&key()).unwrap(), Some(Value::blank()));
        assert_eq!(
            store.raw(&key()),
            Some(r#"{"document":{"nodes":[{"object":"block","type":"paragraph","nodes":[]}]}}"#)
        );
    }

    #[test]
    fn test_directory_store_layout() {
        let store = DirectoryStore::new("/data");
        assert_eq!(
            store.path_for(&key()),
            PathBuf::from("/data/7/v2.1/scientific_theory.json")
        );
    }

    #[test]
    fn test_uploader_returns_public_url() {
        let mut uploader = MemoryUploader::new("https://cdn.example.com/");

        let url = uploader.upload("figure.png", &[1, 2, 3]).unwrap();
        assert_eq!(url, "https://cdn.example.com/1-figure.png");
        assert_eq!(uploader.uploads(), &[("figure.png".to_string(), 3)]);

        assert_eq!(
            uploader.upload("empty.png", &[]),
            Err(UploadError::Empty("empty.png".to_string()))
        );
    }
}
