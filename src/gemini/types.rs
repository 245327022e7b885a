//! Wire types for the Gemini File API and `generateContent`
//!
//! The File API reports processing state as a plain string. It is
//! normalized exactly once, in [`FileState::from_wire`], so the rest of the
//! crate only ever sees the tagged enum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Processing lifecycle of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    /// Bytes are still being received
    Uploading,
    /// Server-side transcoding/indexing in progress
    Processing,
    /// Ready to be referenced from a prompt
    Active,
    /// Processing failed on the server
    Failed,
    /// Anything else, including a missing state field. Keeps the raw value.
    Unknown(String),
}

impl FileState {
    /// Normalize the `state` field of a File resource
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("UPLOADING") => Self::Uploading,
            Some("PROCESSING") => Self::Processing,
            Some("ACTIVE") => Self::Active,
            Some("FAILED") => Self::Failed,
            Some(other) if !other.is_empty() => Self::Unknown(other.to_string()),
            _ => Self::Unknown("UNKNOWN".to_string()),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// States the poll loop expects to pass through without comment
    #[must_use]
    pub fn is_expected_while_waiting(&self) -> bool {
        matches!(self, Self::Active | Self::Processing)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Uploading => "UPLOADING",
            Self::Processing => "PROCESSING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded media file as seen by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAsset {
    /// Resource name, e.g. `files/abc123`
    pub name: String,
    /// URI used to reference the file from a prompt
    pub uri: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub state: FileState,
}

/// `File` resource as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireFile {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    /// int64 fields are JSON strings in Google APIs
    #[serde(default)]
    pub size_bytes: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl From<WireFile> for RemoteAsset {
    fn from(file: WireFile) -> Self {
        Self {
            state: FileState::from_wire(file.state.as_deref()),
            size_bytes: file.size_bytes.and_then(|s| s.parse().ok()),
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
        }
    }
}

/// Upload finalize response: `{"file": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct FileEnvelope {
    pub file: WireFile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Best available explanation for an empty answer
    pub fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return format!("prompt blocked: {reason}");
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.clone())
            .map_or_else(|| "no candidates".to_string(), |r| format!("finish reason: {r}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_normalization() {
        assert_eq!(FileState::from_wire(Some("ACTIVE")), FileState::Active);
        assert_eq!(FileState::from_wire(Some("PROCESSING")), FileState::Processing);
        assert_eq!(FileState::from_wire(Some("UPLOADING")), FileState::Uploading);
        assert_eq!(FileState::from_wire(Some("FAILED")), FileState::Failed);
        assert_eq!(
            FileState::from_wire(Some("STATE_UNSPECIFIED")),
            FileState::Unknown("STATE_UNSPECIFIED".to_string())
        );
        assert_eq!(
            FileState::from_wire(None),
            FileState::Unknown("UNKNOWN".to_string())
        );
        assert_eq!(FileState::from_wire(Some("")).as_str(), "UNKNOWN");
    }

    #[test]
    fn test_state_display_matches_wire() {
        for raw in ["UPLOADING", "PROCESSING", "ACTIVE", "FAILED", "ARCHIVED"] {
            assert_eq!(FileState::from_wire(Some(raw)).to_string(), raw);
        }
    }

    #[test]
    fn test_wire_file_conversion() {
        let json = r#"{
            "name": "files/abc123",
            "displayName": "talk.mp4",
            "mimeType": "video/mp4",
            "sizeBytes": "1048576",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
            "state": "PROCESSING"
        }"#;
        let wire: WireFile = serde_json::from_str(json).unwrap();
        let asset = RemoteAsset::from(wire);

        assert_eq!(asset.name, "files/abc123");
        assert_eq!(asset.size_bytes, Some(1_048_576));
        assert_eq!(asset.state, FileState::Processing);
    }

    #[test]
    fn test_generate_response_text() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Great pacing. "}, {"text": "Slow down at the end."}]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "Great pacing. Slow down at the end.");
    }

    #[test]
    fn test_generate_response_block_reason() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_empty());
        assert_eq!(response.empty_reason(), "prompt blocked: SAFETY");
    }
}
