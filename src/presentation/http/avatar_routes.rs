use axum::extract::{Multipart, State};
use axum::Extension;
use axum::Json;

use crate::application::dto::avatar_dto::{AvatarUploadResponse, UploadedImage};
use crate::domain::repositories::identity_provider::AuthenticatedIdentity;
use crate::presentation::errors::ApiError;

use super::ApiState;

/// Multipart field carrying the image binary.
pub const AVATAR_FIELD: &str = "avatar";

const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// POST /users/avatar
pub async fn upload_avatar(
    State(state): State<ApiState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    mut multipart: Multipart,
) -> Result<Json<AvatarUploadResponse>, ApiError> {
    tracing::debug!("Avatar upload request for user {}", identity.user_id);

    let upload = read_avatar_field(&mut multipart).await?;

    let url = state
        .avatar_service
        .upload_avatar(&identity.user_id, upload)
        .await?;

    Ok(Json(AvatarUploadResponse {
        message: "Uploaded Successfully!".to_string(),
        profile_image: url,
    }))
}

/// Pull the avatar field out of the multipart body, enforcing the type and
/// size constraints. Returns `None` when the field is absent so the service
/// can reply with its canonical "No file uploaded!" error.
async fn read_avatar_field(multipart: &mut Multipart) -> Result<Option<UploadedImage>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ApiError::BadRequest(
                "Please select an image file".to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("avatar").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(ApiError::BadRequest(
                "File size should not exceed 2MB".to_string(),
            ));
        }

        return Ok(Some(UploadedImage { file_name, bytes }));
    }

    Ok(None)
}
