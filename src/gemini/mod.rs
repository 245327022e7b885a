//! Gemini API client
//!
//! Covers the three calls the analysis pipeline makes:
//! - resumable upload of a local video into the File API
//! - file status refresh while the server processes it
//! - `generateContent` with the uploaded file and a text prompt

pub mod client;
pub mod types;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{mime_type_for, GeminiClient, DEFAULT_BASE_URL};
pub use types::{FileState, RemoteAsset};

/// Remote call errors
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Upload session URL missing from response")]
    MissingUploadUrl,

    #[error("Model returned no text ({0})")]
    EmptyResponse(String),

    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeminiError>;

/// Hosted multimodal model with a file store.
///
/// [`GeminiClient`] is the production implementation; the pipeline only
/// depends on this trait.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Upload a local file, returning its initial state
    async fn upload(&self, path: &Path) -> Result<RemoteAsset>;

    /// Fetch the current state of a previously uploaded file
    async fn get(&self, name: &str) -> Result<RemoteAsset>;

    /// Ask `model` about `asset` and return the answer text
    async fn generate(&self, model: &str, asset: &RemoteAsset, prompt: &str) -> Result<String>;
}
