//! Filesystem-backed `Db` and `Blob` implementations. Not wired into
//! the default composition, but present as a durable alternative to
//! [`crate::memory`] — the contract only requires the entity shapes,
//! not a particular backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use layer0::CanvasError;
use serde_json::Value;

use crate::blob::Blob;
use crate::db::Db;

/// Encode a key into a filesystem-safe filename.
fn key_to_filename(key: &str) -> String {
    let mut encoded = String::new();
    for ch in key.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                for byte in ch.to_string().as_bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    format!("{encoded}.json")
}

fn filename_to_key(filename: &str) -> Option<String> {
    let name = filename.strip_suffix(".json")?;
    let mut result = Vec::new();
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            let byte = u8::from_str_radix(hex, 16).ok()?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(result).ok()
}

/// A `Db` backed by one JSON file per key under a root directory.
/// Survives process restart.
pub struct FsDb {
    root: PathBuf,
}

impl FsDb {
    /// Create a filesystem database rooted at `root`. The directory is
    /// created lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

#[async_trait]
impl Db for FsDb {
    async fn read(&self, key: &str) -> Result<Option<Value>, CanvasError> {
        let path = self.root.join(key_to_filename(key));
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let value = serde_json::from_str(&contents)
                    .map_err(|e| CanvasError::Internal(format!("corrupt state file: {e}")))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CanvasError::Internal(e.to_string())),
        }
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), CanvasError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CanvasError::Internal(e.to_string()))?;
        let path = self.root.join(key_to_filename(key));
        let contents = serde_json::to_string_pretty(&value)
            .map_err(|e| CanvasError::Internal(e.to_string()))?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| CanvasError::Internal(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CanvasError> {
        let path = self.root.join(key_to_filename(key));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CanvasError::Internal(e.to_string())),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CanvasError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(CanvasError::Internal(e.to_string())),
        };
        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CanvasError::Internal(e.to_string()))?
        {
            if let Some(filename) = entry.file_name().to_str() {
                if let Some(key) = filename_to_key(filename) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(keys)
    }
}

/// A `Blob` backed by one file per key under a root directory, named
/// by freshly minted UUIDs.
pub struct FsBlob {
    root: PathBuf,
}

impl FsBlob {
    /// Create a filesystem blob store rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

#[async_trait]
impl Blob for FsBlob {
    async fn put(&self, bytes: Vec<u8>) -> Result<String, CanvasError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CanvasError::Internal(e.to_string()))?;
        let key = uuid::Uuid::new_v4().to_string();
        let path = self.root.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CanvasError::Internal(e.to_string()))?;
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CanvasError> {
        let path = self.root.join(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CanvasError::Internal(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CanvasError> {
        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CanvasError::Internal(e.to_string())),
        }
    }
}
