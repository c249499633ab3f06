use bytes::Bytes;
use futures_util::stream;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::transcoder::TranscodedAsset;

/// Multipart field name the avatar endpoint expects.
const AVATAR_FIELD: &str = "avatar";
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;
const GENERIC_FAILURE: &str = "Upload failed";

/// Events observed by the caller. Progress is advisory; exactly one terminal
/// Success/Failure arrives unless the upload is cancelled first.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// Fraction of the body handed to the connection, non-decreasing in [0,1].
    Progress(f64),
    Success(String),
    Failure(UploadFailure),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    #[error("Network error during upload")]
    Network,

    #[error("Invalid response from server")]
    InvalidResponse,

    #[error("{0}")]
    Rejected(String),
}

/// Streams a transcoded avatar to the server, reporting progress as it goes.
pub struct UploadTransport {
    client: Client,
    base_url: Url,
}

impl UploadTransport {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Start the upload and hand back the event stream. Dropping or
    /// cancelling the handle stops the transfer; no events fire afterwards.
    pub fn upload(&self, asset: &TranscodedAsset, auth_token: &str) -> UploadHandle {
        let (events, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let endpoint = self.base_url.join("users/avatar");
        let task = tokio::spawn(run_upload(
            self.client.clone(),
            endpoint,
            asset.bytes().clone(),
            asset.file_name().to_string(),
            auth_token.to_string(),
            events,
            cancel.clone(),
        ));

        UploadHandle {
            events: receiver,
            cancel,
            task,
        }
    }
}

pub struct UploadHandle {
    events: mpsc::UnboundedReceiver<UploadEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl UploadHandle {
    /// Next observed event; `None` once the transfer is over or cancelled.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for UploadHandle {
    fn drop(&mut self) {
        // Abandoning the handle releases the network handle as well.
        self.cancel.cancel();
        self.task.abort();
    }
}

async fn run_upload(
    client: Client,
    endpoint: Result<Url, url::ParseError>,
    bytes: Bytes,
    file_name: String,
    auth_token: String,
    events: mpsc::UnboundedSender<UploadEvent>,
    cancel: CancellationToken,
) {
    let Ok(endpoint) = endpoint else {
        let _ = events.send(UploadEvent::Failure(UploadFailure::Network));
        return;
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        outcome = send_request(client, endpoint, bytes, file_name, auth_token, events.clone()) => outcome,
    };

    if cancel.is_cancelled() {
        return;
    }

    let _ = events.send(match outcome {
        Ok(url) => UploadEvent::Success(url),
        Err(failure) => UploadEvent::Failure(failure),
    });
}

async fn send_request(
    client: Client,
    endpoint: Url,
    bytes: Bytes,
    file_name: String,
    auth_token: String,
    events: mpsc::UnboundedSender<UploadEvent>,
) -> Result<String, UploadFailure> {
    let total = bytes.len() as u64;
    let body = progress_body(bytes, events);

    let part = Part::stream_with_length(body, total)
        .file_name(file_name)
        .mime_str("image/jpeg")
        .map_err(|_| UploadFailure::Network)?;
    let form = Form::new().part(AVATAR_FIELD, part);

    let response = client
        .post(endpoint)
        .bearer_auth(auth_token)
        .multipart(form)
        .send()
        .await
        .map_err(|_| UploadFailure::Network)?;

    let status = response.status();
    if status.is_success() {
        let body = response
            .json::<Value>()
            .await
            .map_err(|_| UploadFailure::InvalidResponse)?;
        let url = body
            .get("profileImage")
            .and_then(Value::as_str)
            .ok_or(UploadFailure::InvalidResponse)?;
        Ok(url.to_string())
    } else {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        Err(UploadFailure::Rejected(message))
    }
}

/// Wrap the bytes in a chunked body that reports each chunk handed to the
/// connection as a progress fraction.
fn progress_body(bytes: Bytes, events: mpsc::UnboundedSender<UploadEvent>) -> reqwest::Body {
    let total = bytes.len().max(1) as f64;
    let mut chunks = Vec::new();
    let mut remaining = bytes;
    while remaining.len() > UPLOAD_CHUNK_BYTES {
        chunks.push(remaining.split_to(UPLOAD_CHUNK_BYTES));
    }
    chunks.push(remaining);

    let mut sent: u64 = 0;
    let stream = stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        let fraction = (sent as f64 / total).min(1.0);
        let _ = events.send(UploadEvent::Progress(fraction));
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    reqwest::Body::wrap_stream(stream)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::routing::post;
    use axum::{Json, Router};
    use bytes::Bytes;
    use reqwest::Client;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    use crate::client::transcoder::{select_file, SelectedFile, TranscodedAsset};
    use crate::domain::models::asset::CropRect;

    use super::{UploadEvent, UploadFailure, UploadTransport};

    async fn spawn_server(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        addr
    }

    fn transport_for(addr: SocketAddr) -> UploadTransport {
        let base = Url::parse(&format!("http://{}/", addr)).expect("base url");
        UploadTransport::new(Client::new(), base)
    }

    async fn test_asset() -> TranscodedAsset {
        let image = image::RgbImage::from_fn(160, 160, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .expect("encode test png");
        let mut session = select_file(&SelectedFile {
            name: "photo.png".to_string(),
            mime: "image/png".to_string(),
            bytes: Bytes::from(bytes),
        })
        .expect("valid image");
        session.update_crop(CropRect::new(0, 0, 120, 120), 1.0);
        session
            .apply_crop(&CancellationToken::new())
            .await
            .expect("transcode")
    }

    async fn drain(handle: &mut super::UploadHandle) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn success_ends_with_the_parsed_url_after_monotonic_progress() {
        let router = Router::new().route(
            "/users/avatar",
            post(|| async {
                Json(json!({
                    "message": "Uploaded Successfully!",
                    "profileImage": "https://assets.fittrack.test/profile_pictures/new.jpg"
                }))
            }),
        );
        let transport = transport_for(spawn_server(router).await);

        let asset = test_asset().await;
        let mut handle = transport.upload(&asset, "token");
        let events = drain(&mut handle).await;

        let mut last_fraction = 0.0;
        let mut terminals = 0;
        for event in &events {
            match event {
                UploadEvent::Progress(fraction) => {
                    assert!(*fraction >= last_fraction);
                    assert!((0.0..=1.0).contains(fraction));
                    last_fraction = *fraction;
                }
                _ => terminals += 1,
            }
        }
        assert_eq!(terminals, 1);
        assert!(matches!(
            events.last(),
            Some(UploadEvent::Success(url))
                if url == "https://assets.fittrack.test/profile_pictures/new.jpg"
        ));
    }

    #[tokio::test]
    async fn server_rejection_carries_the_server_message() {
        let router = Router::new().route(
            "/users/avatar",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "No file uploaded!" })),
                )
            }),
        );
        let transport = transport_for(spawn_server(router).await);

        let asset = test_asset().await;
        let mut handle = transport.upload(&asset, "token");
        let events = drain(&mut handle).await;

        assert!(matches!(
            events.last(),
            Some(UploadEvent::Failure(UploadFailure::Rejected(message)))
                if message == "No file uploaded!"
        ));
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_invalid_response() {
        let router = Router::new().route(
            "/users/avatar",
            post(|| async { Json(json!({ "ok": true })) }),
        );
        let transport = transport_for(spawn_server(router).await);

        let asset = test_asset().await;
        let mut handle = transport.upload(&asset, "token");
        let events = drain(&mut handle).await;

        assert!(matches!(
            events.last(),
            Some(UploadEvent::Failure(UploadFailure::InvalidResponse))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() {
        // Bind then immediately drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let transport = transport_for(addr);

        let asset = test_asset().await;
        let mut handle = transport.upload(&asset, "token");
        let events = drain(&mut handle).await;

        assert!(matches!(
            events.last(),
            Some(UploadEvent::Failure(UploadFailure::Network))
        ));
    }

    #[tokio::test]
    async fn cancellation_silences_the_stream() {
        // Handler stalls so the transfer is still in flight when we cancel.
        let router = Router::new().route(
            "/users/avatar",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({ "profileImage": "unreachable" }))
            }),
        );
        let transport = transport_for(spawn_server(router).await);

        let asset = test_asset().await;
        let mut handle = transport.upload(&asset, "token");
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();

        let events = drain(&mut handle).await;
        assert!(!events
            .iter()
            .any(|event| matches!(event, UploadEvent::Success(_) | UploadEvent::Failure(_))));
    }
}
