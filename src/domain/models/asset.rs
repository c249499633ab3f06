use serde::{Deserialize, Serialize};

/// A durable binary object in the remote asset store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Opaque identifier the store accepts for deletion, e.g.
    /// "profile_pictures/k3v9x2".
    pub public_id: String,
    /// Durable URL serving the asset.
    pub url: String,
}

/// Outcome of a delete-by-identifier call. Removal is idempotent: deleting an
/// already-removed asset reports `NotFound` rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Crop rectangle in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
