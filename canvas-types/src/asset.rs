//! Assets: blob-backed binary content created by the image generator.

use chrono::{DateTime, Utc};
use layer0::{AssetId, UserId};
use serde::{Deserialize, Serialize};

/// A generated asset's metadata row. `blob_key` is an opaque handle
/// into the `Blob` capability; the asset itself never carries bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Stable identifier.
    pub asset_id: AssetId,
    /// The only user permitted to read or delete this asset.
    pub owner_user_id: UserId,
    /// MIME type of the stored bytes.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
    /// Opaque handle into the blob store.
    pub blob_key: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
