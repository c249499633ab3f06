use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::DomainError;
use crate::domain::models::asset::{RemoveOutcome, StoredAsset};

/// Remote object store holding uploaded avatars. Implementations are
/// constructed explicitly and injected so the avatar service can be exercised
/// against fakes.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload a binary under the given folder and return its durable URL and
    /// identifier.
    async fn store(
        &self,
        bytes: Bytes,
        file_name: &str,
        folder: &str,
    ) -> Result<StoredAsset, DomainError>;

    /// Delete an asset by identifier. Removing an id that no longer exists is
    /// not an error; it reports `RemoveOutcome::NotFound`.
    async fn remove(&self, public_id: &str) -> Result<RemoveOutcome, DomainError>;
}
