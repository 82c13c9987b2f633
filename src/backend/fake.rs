//! Scripted in-memory backend for tests.

use super::{
    ContentRequest, ContentResponse, DownloadedAsset, GenAiBackend, ImageRequest, ImageResponse,
    TextRequest, TextResponse, VideoOperation, VideoRequest,
};
use crate::config::ModelSet;
use crate::error::{KhayalError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Text(TextRequest),
    Images(ImageRequest),
    Content(ContentRequest),
    SubmitVideo(VideoRequest),
    PollVideo { name: String, at: Instant },
    Download(String),
}

#[derive(Default)]
struct Script {
    text: VecDeque<Result<TextResponse>>,
    images: VecDeque<Result<ImageResponse>>,
    content: VecDeque<Result<ContentResponse>>,
    submit: VecDeque<Result<VideoOperation>>,
    poll: VecDeque<Result<VideoOperation>>,
    download: VecDeque<Result<DownloadedAsset>>,
}

/// Backend that replays scripted responses and records every call.
///
/// An exhausted script answers with an `Api` error so a test never hangs on
/// an unexpected call.
pub(crate) struct FakeBackend {
    configured: bool,
    models: ModelSet,
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            configured: true,
            models: ModelSet::default(),
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub(crate) fn push_text(&self, response: Result<TextResponse>) -> &Self {
        self.script.lock().unwrap().text.push_back(response);
        self
    }

    pub(crate) fn push_images(&self, response: Result<ImageResponse>) -> &Self {
        self.script.lock().unwrap().images.push_back(response);
        self
    }

    pub(crate) fn push_content(&self, response: Result<ContentResponse>) -> &Self {
        self.script.lock().unwrap().content.push_back(response);
        self
    }

    pub(crate) fn push_submit(&self, response: Result<VideoOperation>) -> &Self {
        self.script.lock().unwrap().submit.push_back(response);
        self
    }

    pub(crate) fn push_poll(&self, response: Result<VideoOperation>) -> &Self {
        self.script.lock().unwrap().poll.push_back(response);
        self
    }

    pub(crate) fn push_download(&self, response: Result<DownloadedAsset>) -> &Self {
        self.script.lock().unwrap().download.push_back(response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn poll_times(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PollVideo { at, .. } => Some(at),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &mut VecDeque<Result<T>>, what: &str) -> Result<T> {
    queue.pop_front().unwrap_or_else(|| {
        Err(KhayalError::Api {
            status: 500,
            message: format!("no scripted {what} response"),
        })
    })
}

#[async_trait]
impl GenAiBackend for FakeBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn models(&self) -> &ModelSet {
        &self.models
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        self.record(Call::Text(request.clone()));
        next(&mut self.script.lock().unwrap().text, "text")
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse> {
        self.record(Call::Images(request.clone()));
        next(&mut self.script.lock().unwrap().images, "image")
    }

    async fn generate_content(&self, request: &ContentRequest) -> Result<ContentResponse> {
        self.record(Call::Content(request.clone()));
        next(&mut self.script.lock().unwrap().content, "content")
    }

    async fn submit_video(&self, request: &VideoRequest) -> Result<VideoOperation> {
        self.record(Call::SubmitVideo(request.clone()));
        next(&mut self.script.lock().unwrap().submit, "submit")
    }

    async fn get_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        self.record(Call::PollVideo {
            name: operation.name.clone(),
            at: Instant::now(),
        });
        next(&mut self.script.lock().unwrap().poll, "poll")
    }

    async fn download(&self, uri: &str) -> Result<DownloadedAsset> {
        self.record(Call::Download(uri.to_string()));
        next(&mut self.script.lock().unwrap().download, "download")
    }
}

/// A pending operation with the given name.
pub(crate) fn pending(name: &str) -> VideoOperation {
    VideoOperation {
        name: name.to_string(),
        ..Default::default()
    }
}

/// A finished operation pointing at `uri`.
pub(crate) fn finished(name: &str, uri: &str) -> VideoOperation {
    VideoOperation {
        name: name.to_string(),
        done: true,
        video_uri: Some(uri.to_string()),
        ..Default::default()
    }
}
