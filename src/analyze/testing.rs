//! Scripted [`MediaService`] for pipeline and poll tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::gemini::{self, FileState, GeminiError, MediaService, RemoteAsset};

pub(crate) fn asset(state: FileState) -> RemoteAsset {
    RemoteAsset {
        name: "files/test-video".to_string(),
        uri: "https://example.test/v1beta/files/test-video".to_string(),
        mime_type: "video/mp4".to_string(),
        size_bytes: Some(1024),
        state,
    }
}

/// Answers `get` from a queue of canned results
pub(crate) struct ScriptedService {
    statuses: Mutex<VecDeque<gemini::Result<RemoteAsset>>>,
    fallback: Option<FileState>,
    upload: Result<FileState, String>,
    response: Result<String, String>,
    get_calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub(crate) fn new(statuses: Vec<gemini::Result<RemoteAsset>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            fallback: None,
            upload: Ok(FileState::Processing),
            response: Ok(String::new()),
            get_calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// State reported once the queue is exhausted
    pub(crate) fn with_fallback(mut self, state: FileState) -> Self {
        self.fallback = Some(state);
        self
    }

    pub(crate) fn with_upload_error(mut self, message: &str) -> Self {
        self.upload = Err(message.to_string());
        self
    }

    pub(crate) fn with_response(mut self, text: &str) -> Self {
        self.response = Ok(text.to_string());
        self
    }

    pub(crate) fn with_generate_error(mut self, message: &str) -> Self {
        self.response = Err(message.to_string());
        self
    }

    pub(crate) fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

fn api_error(message: &str) -> GeminiError {
    GeminiError::Api {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl MediaService for ScriptedService {
    async fn upload(&self, _path: &Path) -> gemini::Result<RemoteAsset> {
        match &self.upload {
            Ok(state) => Ok(asset(state.clone())),
            Err(message) => Err(api_error(message)),
        }
    }

    async fn get(&self, _name: &str) -> gemini::Result<RemoteAsset> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(state)) => Ok(asset(state.clone())),
            (None, None) => Err(api_error("script exhausted")),
        }
    }

    async fn generate(
        &self,
        _model: &str,
        _asset: &RemoteAsset,
        prompt: &str,
    ) -> gemini::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().map_err(|message| api_error(&message))
    }
}
