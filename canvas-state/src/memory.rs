//! In-memory `Db` and `Blob` reference implementations. Useful for
//! tests and for single-process deployments where durability across
//! restarts is not required; see [`crate::fs`] for a persistent
//! alternative.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use layer0::CanvasError;
use serde_json::Value;

use crate::blob::Blob;
use crate::db::Db;

/// A `Db` backed by an in-process `HashMap`. State does not survive
/// process restart.
#[derive(Default)]
pub struct MemoryDb {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryDb {
    /// An empty in-memory database.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Db for MemoryDb {
    async fn read(&self, key: &str) -> Result<Option<Value>, CanvasError> {
        let data = self
            .data
            .read()
            .map_err(|_| CanvasError::Internal("db lock poisoned".into()))?;
        Ok(data.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), CanvasError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| CanvasError::Internal("db lock poisoned".into()))?;
        data.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CanvasError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| CanvasError::Internal("db lock poisoned".into()))?;
        data.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CanvasError> {
        let data = self
            .data
            .read()
            .map_err(|_| CanvasError::Internal("db lock poisoned".into()))?;
        Ok(data.keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }
}

/// A `Blob` backed by an in-process `HashMap`, keyed by freshly minted
/// UUIDs.
#[derive(Default)]
pub struct MemoryBlob {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlob {
    /// An empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Blob for MemoryBlob {
    async fn put(&self, bytes: Vec<u8>) -> Result<String, CanvasError> {
        let key = uuid::Uuid::new_v4().to_string();
        let mut data = self
            .data
            .write()
            .map_err(|_| CanvasError::Internal("blob lock poisoned".into()))?;
        data.insert(key.clone(), bytes);
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CanvasError> {
        let data = self
            .data
            .read()
            .map_err(|_| CanvasError::Internal("blob lock poisoned".into()))?;
        Ok(data.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), CanvasError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| CanvasError::Internal("blob lock poisoned".into()))?;
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn db_write_then_read_roundtrips() {
        let db = MemoryDb::new();
        db.write("world:w1", json!({"title": "Aethel"})).await.unwrap();
        let v = db.read("world:w1").await.unwrap();
        assert_eq!(v, Some(json!({"title": "Aethel"})));
    }

    #[tokio::test]
    async fn db_list_filters_by_prefix() {
        let db = MemoryDb::new();
        db.write("world:w1", json!(1)).await.unwrap();
        db.write("world:w2", json!(2)).await.unwrap();
        db.write("story:s1", json!(3)).await.unwrap();
        let mut keys = db.list("world:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["world:w1", "world:w2"]);
    }

    #[tokio::test]
    async fn db_delete_missing_key_is_ok() {
        let db = MemoryDb::new();
        assert!(db.delete("nope").await.is_ok());
    }

    #[tokio::test]
    async fn blob_put_get_delete_roundtrips() {
        let blob = MemoryBlob::new();
        let key = blob.put(vec![1, 2, 3]).await.unwrap();
        assert_eq!(blob.get(&key).await.unwrap(), Some(vec![1, 2, 3]));
        blob.delete(&key).await.unwrap();
        assert_eq!(blob.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn blob_put_mints_fresh_keys() {
        let blob = MemoryBlob::new();
        let k1 = blob.put(vec![1]).await.unwrap();
        let k2 = blob.put(vec![2]).await.unwrap();
        assert_ne!(k1, k2);
    }
}
