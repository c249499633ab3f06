use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::models::asset::CropRect;

/// Source files above this are rejected before any decoding happens.
pub const MAX_AVATAR_SOURCE_BYTES: usize = 2 * 1024 * 1024;

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 3.0;
const ZOOM_STEP: f32 = 0.1;

/// Fixed quality of the lossy upload format.
const ENCODE_QUALITY: u8 = 80;

/// A file the user picked, as handed over by the surrounding UI shell.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Please select an image file")]
    UnsupportedType,

    #[error("File size should not exceed 2MB")]
    TooLarge,
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Could not encode the cropped image: {0}")]
    Encode(String),

    #[error("Crop was cancelled")]
    Cancelled,
}

/// Ephemeral state of the interactive crop. Created by `select_file`, dropped
/// when the modal closes or the crop is applied.
pub struct CropSession {
    image: DynamicImage,
    crop: CropRect,
    zoom: f32,
}

/// Validate a selected file and open a crop session over it. The default crop
/// covers the whole image at zoom 1.
pub fn select_file(file: &SelectedFile) -> Result<CropSession, ValidationError> {
    if !file.mime.starts_with("image/") {
        return Err(ValidationError::UnsupportedType);
    }
    if file.bytes.len() > MAX_AVATAR_SOURCE_BYTES {
        return Err(ValidationError::TooLarge);
    }

    // Bytes that only claim to be an image fail here too.
    let image =
        image::load_from_memory(&file.bytes).map_err(|_| ValidationError::UnsupportedType)?;

    let crop = CropRect::new(0, 0, image.width(), image.height());
    Ok(CropSession {
        image,
        crop,
        zoom: MIN_ZOOM,
    })
}

impl CropSession {
    /// Pure state update; the rectangle is taken as-is (already in source
    /// pixel space), the zoom is quantized to 0.1 steps and clamped.
    pub fn update_crop(&mut self, rect: CropRect, zoom: f32) {
        self.crop = rect;
        self.zoom = clamp_zoom(zoom);
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Rasterize the current crop rectangle and encode it for upload. The
    /// pixel work runs on a blocking task; cancelling drops the result without
    /// any partial observable state.
    pub async fn apply_crop(
        &self,
        cancel: &CancellationToken,
    ) -> Result<TranscodedAsset, TranscodeError> {
        let image = self.image.clone();
        let rect = self.crop;
        let task = tokio::task::spawn_blocking(move || rasterize_and_encode(&image, rect));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranscodeError::Cancelled),
            joined = task => match joined {
                Ok(result) => result,
                Err(e) => Err(TranscodeError::Encode(format!(
                    "Rasterization task failed: {}",
                    e
                ))),
            },
        }
    }
}

/// Upload-ready result of an applied crop. Dropping it releases both the
/// encoded buffer and the preview.
#[derive(Debug)]
pub struct TranscodedAsset {
    bytes: Bytes,
    file_name: String,
    preview_url: String,
}

impl TranscodedAsset {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Data URL for immediate local display while the upload runs.
    pub fn preview_url(&self) -> &str {
        &self.preview_url
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    let stepped = (zoom / ZOOM_STEP).round() * ZOOM_STEP;
    stepped.clamp(MIN_ZOOM, MAX_ZOOM)
}

fn rasterize_and_encode(
    image: &DynamicImage,
    rect: CropRect,
) -> Result<TranscodedAsset, TranscodeError> {
    if rect.is_empty() {
        return Err(TranscodeError::Encode(
            "Crop selection is empty".to_string(),
        ));
    }
    if rect.x.saturating_add(rect.width) > image.width()
        || rect.y.saturating_add(rect.height) > image.height()
    {
        return Err(TranscodeError::Encode(
            "Crop selection is outside the image".to_string(),
        ));
    }

    // JPEG has no alpha channel; flatten before encoding.
    let cropped = image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .to_rgb8();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, ENCODE_QUALITY);
    encoder
        .encode_image(&cropped)
        .map_err(|e| TranscodeError::Encode(format!("Failed to encode crop: {}", e)))?;

    let preview_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&encoded));
    Ok(TranscodedAsset {
        bytes: Bytes::from(encoded),
        file_name: format!("avatar-{}.jpg", Utc::now().timestamp_millis()),
        preview_url,
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    use crate::domain::models::asset::CropRect;

    use super::{select_file, SelectedFile, TranscodeError, ValidationError, MAX_AVATAR_SOURCE_BYTES};

    fn png_file(width: u32, height: u32) -> SelectedFile {
        let image = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .expect("encode test png");
        SelectedFile {
            name: "photo.png".to_string(),
            mime: "image/png".to_string(),
            bytes: Bytes::from(bytes),
        }
    }

    #[test]
    fn select_opens_a_session_covering_the_whole_image() {
        let session = select_file(&png_file(500, 300)).expect("valid image");
        assert_eq!(session.crop(), CropRect::new(0, 0, 500, 300));
        assert_eq!(session.zoom(), 1.0);
        assert_eq!(session.source_dimensions(), (500, 300));
    }

    #[test]
    fn select_rejects_non_image_mime_types() {
        let mut file = png_file(10, 10);
        file.mime = "application/pdf".to_string();
        assert!(matches!(
            select_file(&file),
            Err(ValidationError::UnsupportedType)
        ));
    }

    #[test]
    fn select_rejects_oversized_files() {
        let mut file = png_file(10, 10);
        file.bytes = Bytes::from(vec![0u8; MAX_AVATAR_SOURCE_BYTES + 1]);
        assert!(matches!(select_file(&file), Err(ValidationError::TooLarge)));
    }

    #[test]
    fn select_rejects_bytes_that_only_claim_to_be_an_image() {
        let file = SelectedFile {
            name: "fake.png".to_string(),
            mime: "image/png".to_string(),
            bytes: Bytes::from_static(b"definitely not a png"),
        };
        assert!(matches!(
            select_file(&file),
            Err(ValidationError::UnsupportedType)
        ));
    }

    #[test]
    fn zoom_is_quantized_and_clamped() {
        let mut session = select_file(&png_file(100, 100)).expect("valid image");

        session.update_crop(session.crop(), 5.0);
        assert_eq!(session.zoom(), 3.0);

        session.update_crop(session.crop(), 0.2);
        assert_eq!(session.zoom(), 1.0);

        session.update_crop(session.crop(), 2.34);
        assert!((session.zoom() - 2.3).abs() < 1e-4);
    }

    #[tokio::test]
    async fn applied_crop_decodes_to_the_requested_dimensions() {
        let mut session = select_file(&png_file(500, 500)).expect("valid image");
        session.update_crop(CropRect::new(100, 150, 200, 200), 1.0);

        let asset = session
            .apply_crop(&CancellationToken::new())
            .await
            .expect("crop should encode");

        let decoded = image::load_from_memory(asset.bytes()).expect("output decodes");
        assert_eq!((decoded.width(), decoded.height()), (200, 200));
        assert!(asset.file_name().starts_with("avatar-"));
        assert!(asset.file_name().ends_with(".jpg"));
        assert!(asset.preview_url().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn zero_area_crops_fail_to_encode() {
        let mut session = select_file(&png_file(100, 100)).expect("valid image");
        session.update_crop(CropRect::new(10, 10, 0, 50), 1.0);

        let error = session
            .apply_crop(&CancellationToken::new())
            .await
            .expect_err("empty crop must fail");
        assert!(matches!(error, TranscodeError::Encode(_)));
    }

    #[tokio::test]
    async fn out_of_bounds_crops_fail_to_encode() {
        let mut session = select_file(&png_file(100, 100)).expect("valid image");
        session.update_crop(CropRect::new(80, 80, 50, 50), 1.0);

        let error = session
            .apply_crop(&CancellationToken::new())
            .await
            .expect_err("out-of-bounds crop must fail");
        assert!(matches!(error, TranscodeError::Encode(_)));
    }

    #[tokio::test]
    async fn cancellation_wins_over_rasterization() {
        let session = select_file(&png_file(100, 100)).expect("valid image");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = session
            .apply_crop(&cancel)
            .await
            .expect_err("cancelled crop must not produce an asset");
        assert!(matches!(error, TranscodeError::Cancelled));
    }
}
