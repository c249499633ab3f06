use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::transcoder::{
    select_file, CropSession, SelectedFile, TranscodeError, ValidationError,
};
use crate::client::upload::{UploadEvent, UploadFailure, UploadTransport};
use crate::domain::models::asset::CropRect;
use crate::domain::models::user::User;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("No crop in progress")]
    NoCropInProgress,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Upload(#[from] UploadFailure),

    #[error("Upload was cancelled")]
    Cancelled,
}

/// What the profile header should currently show.
#[derive(Debug, PartialEq, Eq)]
pub enum AvatarDisplay<'a> {
    Image(&'a str),
    Initials(&'a str),
}

enum FlowState {
    Idle,
    Cropping(CropSession),
}

/// Drives a single avatar change from file selection through crop to upload.
/// The displayed avatar switches to the local preview while the upload runs
/// and reverts if the upload does not land.
pub struct AvatarUploadFlow {
    transport: UploadTransport,
    placeholder: String,
    displayed_avatar: Option<String>,
    state: FlowState,
    progress: Option<f64>,
}

impl AvatarUploadFlow {
    pub fn new(transport: UploadTransport, user: &User) -> Self {
        Self {
            transport,
            placeholder: user.initials(),
            displayed_avatar: user.profile_image_url.clone(),
            state: FlowState::Idle,
            progress: None,
        }
    }

    pub fn avatar_display(&self) -> AvatarDisplay<'_> {
        match &self.displayed_avatar {
            Some(url) => AvatarDisplay::Image(url),
            None => AvatarDisplay::Initials(&self.placeholder),
        }
    }

    /// Upload progress in [0,1] while a transfer is in flight.
    pub fn progress(&self) -> Option<f64> {
        self.progress
    }

    pub fn is_cropping(&self) -> bool {
        matches!(self.state, FlowState::Cropping(_))
    }

    /// Validate the picked file and open the crop modal over it.
    pub fn select_file(&mut self, file: &SelectedFile) -> Result<(), ValidationError> {
        let session = select_file(file)?;
        self.state = FlowState::Cropping(session);
        Ok(())
    }

    pub fn set_crop(&mut self, rect: CropRect, zoom: f32) -> Result<(), FlowError> {
        match &mut self.state {
            FlowState::Cropping(session) => {
                session.update_crop(rect, zoom);
                Ok(())
            }
            FlowState::Idle => Err(FlowError::NoCropInProgress),
        }
    }

    /// Close the crop modal without uploading anything.
    pub fn dismiss(&mut self) {
        self.state = FlowState::Idle;
    }

    /// Rasterize the current crop and upload it. The preview is shown
    /// optimistically; any outcome other than success puts the previous
    /// avatar back.
    pub async fn apply_and_upload(
        &mut self,
        auth_token: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FlowError> {
        let FlowState::Cropping(session) = std::mem::replace(&mut self.state, FlowState::Idle)
        else {
            return Err(FlowError::NoCropInProgress);
        };

        let asset = match session.apply_crop(cancel).await {
            Ok(asset) => asset,
            Err(TranscodeError::Cancelled) => return Err(FlowError::Cancelled),
            Err(e) => return Err(e.into()),
        };

        let previous = self
            .displayed_avatar
            .replace(asset.preview_url().to_string());
        self.progress = Some(0.0);

        let mut handle = self.transport.upload(&asset, auth_token);
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    handle.cancel();
                    self.finish(previous);
                    return Err(FlowError::Cancelled);
                }
                event = handle.next_event() => event,
            };

            match event {
                Some(UploadEvent::Progress(fraction)) => self.progress = Some(fraction),
                Some(UploadEvent::Success(url)) => {
                    self.displayed_avatar = Some(url.clone());
                    self.progress = None;
                    return Ok(url);
                }
                Some(UploadEvent::Failure(failure)) => {
                    self.finish(previous);
                    return Err(failure.into());
                }
                None => {
                    self.finish(previous);
                    return Err(FlowError::Cancelled);
                }
            }
        }
    }

    fn finish(&mut self, previous: Option<String>) {
        self.displayed_avatar = previous;
        self.progress = None;
    }
}
