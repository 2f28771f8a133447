//! The `Db` capability: narrow key/value access to the relational
//! store, scoped entirely by string key. The core owns no schema
//! beyond the entity shapes in `canvas-types`; exact column layout is
//! left to real implementations.

use async_trait::async_trait;
use layer0::CanvasError;
use serde_json::Value;

/// Narrow key/value access to application state. Each tool call uses a
/// short-lived scoped session (in practice: one `read`/`write` call)
/// rather than holding a connection across an invocation.
#[async_trait]
pub trait Db: Send + Sync {
    /// Read a value by key.
    async fn read(&self, key: &str) -> Result<Option<Value>, CanvasError>;

    /// Write a value by key, overwriting any existing value.
    async fn write(&self, key: &str, value: Value) -> Result<(), CanvasError>;

    /// Delete a value by key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CanvasError>;

    /// List every key with the given prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CanvasError>;
}

/// Read-modify-write convenience built on top of [`Db::read`] /
/// [`Db::write`]. Not part of the narrow capability surface itself,
/// but useful enough (every tool that patches JSON wants it) to ship
/// as a blanket default.
#[async_trait]
pub trait DbExt: Db {
    /// Read the value at `key`, apply `f`, and write the result back.
    /// `f` receives `None` if the key was absent.
    async fn update<F>(&self, key: &str, f: F) -> Result<Value, CanvasError>
    where
        F: FnOnce(Option<Value>) -> Result<Value, CanvasError> + Send,
    {
        let current = self.read(key).await?;
        let next = f(current)?;
        self.write(key, next.clone()).await?;
        Ok(next)
    }
}

impl<T: Db + ?Sized> DbExt for T {}
