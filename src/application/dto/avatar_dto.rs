use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The image binary received by the avatar endpoint.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Body of a successful avatar upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploadResponse {
    pub message: String,
    pub profile_image: String,
}
