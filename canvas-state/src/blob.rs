//! The `Blob` capability: opaque-keyed binary storage for generated
//! assets.

use async_trait::async_trait;
use layer0::CanvasError;

/// Opaque-keyed binary object storage. Concurrent reads and writes are
/// safe; writers always mint a fresh key rather than overwriting.
#[async_trait]
pub trait Blob: Send + Sync {
    /// Store bytes under a freshly minted key and return that key.
    async fn put(&self, bytes: Vec<u8>) -> Result<String, CanvasError>;

    /// Fetch bytes by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CanvasError>;

    /// Best-effort delete by key. Deleting a missing key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<(), CanvasError>;

    /// A retrieval URL for the blob. Reference implementations return
    /// a synthetic `blob://` URL; a production implementation would
    /// return a signed object-store URL.
    fn url_for(&self, key: &str) -> String {
        format!("blob://{key}")
    }
}
