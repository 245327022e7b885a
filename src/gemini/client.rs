//! HTTP implementation of [`MediaService`] over the Gemini REST API

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response};
use serde_json::json;
use tracing::{debug, info, instrument};
use url::Url;

use super::types::{ApiErrorEnvelope, FileEnvelope, GenerateResponse, WireFile};
use super::{GeminiError, MediaService, RemoteAsset, Result};

/// Public endpoint of the Generative Language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini REST client
///
/// The API key is passed in explicitly and sent as a header on every
/// request; nothing is read from or written to the process environment.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: Url,
}

impl GeminiClient {
    /// Create a client against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (proxies, tests)
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        // Url::join drops the last segment unless the base ends in '/'
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // Uploads of long recordings and video inference are slow
            .timeout(Duration::from_secs(600))
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .gzip(true)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: Url::parse(&base)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl MediaService for GeminiClient {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn upload(&self, path: &Path) -> Result<RemoteAsset> {
        let size = tokio::fs::metadata(path).await?.len();
        let mime_type = mime_type_for(path);
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video");

        // 1. Open a resumable session
        let response = self
            .http
            .post(self.endpoint("upload/v1beta/files")?)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let session_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(GeminiError::MissingUploadUrl)?
            .to_string();
        debug!("Upload session opened");

        // 2. Stream the file and finalize in one request
        let file = tokio::fs::File::open(path).await?;
        let response = self
            .http
            .post(&session_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_LENGTH, size)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(Body::from(file))
            .send()
            .await?;
        let envelope: FileEnvelope = check_status(response).await?.json().await?;

        let asset = RemoteAsset::from(envelope.file);
        info!(name = %asset.name, state = %asset.state, size, "Upload finished");
        Ok(asset)
    }

    #[instrument(skip(self))]
    async fn get(&self, name: &str) -> Result<RemoteAsset> {
        let response = self
            .http
            .get(self.endpoint(&format!("v1beta/{name}"))?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let file: WireFile = check_status(response).await?.json().await?;
        Ok(file.into())
    }

    #[instrument(skip(self, asset, prompt), fields(file = %asset.name))]
    async fn generate(&self, model: &str, asset: &RemoteAsset, prompt: &str) -> Result<String> {
        let request_body = json!({
            "contents": [{
                "parts": [
                    {
                        "file_data": {
                            "mime_type": asset.mime_type,
                            "file_uri": asset.uri
                        }
                    },
                    { "text": prompt }
                ]
            }]
        });

        let response = self
            .http
            .post(self.endpoint(&format!("v1beta/models/{model}:generateContent"))?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;
        let body: GenerateResponse = check_status(response).await?.json().await?;

        let text = body.text();
        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse(body.empty_reason()));
        }
        info!(chars = text.len(), "Model response received");
        Ok(text)
    }
}

/// Turn a non-2xx response into [`GeminiError::Api`], preferring the
/// `error.message` field of Google's error envelope.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(GeminiError::Api {
        status: status.as_u16(),
        message,
    })
}

/// MIME type for a video file, by extension
#[must_use]
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mpeg" | "mpg" => "video/mpeg",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "3gp" => "video/3gpp",
        _ => "video/mp4",
    }
}
