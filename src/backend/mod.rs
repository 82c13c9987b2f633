//! The generative service boundary.
//!
//! Operations never talk HTTP directly. They receive a [`GenAiBackend`] and
//! speak in the request/response types defined here, so a fake backend can
//! stand in during tests.

mod gemini;

#[cfg(test)]
pub(crate) mod fake;

pub use gemini::{GeminiBackend, GeminiBackendBuilder};

use crate::config::ModelSet;
use crate::error::{KhayalError, Result};
use crate::image::AspectRatio;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Content kinds a multimodal model may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Plain text.
    Text,
    /// Inline image data.
    Image,
}

/// Base64 payload tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// A text completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    /// Model identifier.
    pub model: String,
    /// Fixed system instruction.
    pub system_instruction: Option<String>,
    /// User turn.
    pub prompt: String,
    /// Thinking token budget; `Some(0)` disables thinking.
    pub thinking_budget: Option<u32>,
}

/// A text completion response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextResponse {
    /// Concatenated text of the first candidate, excluding thoughts.
    pub text: String,
}

/// A text-to-image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Model identifier.
    pub model: String,
    /// Image prompt.
    pub prompt: String,
    /// Number of images to produce.
    pub number_of_images: u32,
    /// Requested output MIME type.
    pub output_mime_type: String,
    /// Requested framing.
    pub aspect_ratio: AspectRatio,
}

/// A text-to-image response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageResponse {
    /// Generated images, possibly none.
    pub images: Vec<InlineData>,
    /// Reason given when images were filtered out.
    pub filtered_reason: Option<String>,
}

/// A multimodal request carrying one image and an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    /// Model identifier.
    pub model: String,
    /// The source image.
    pub image: InlineData,
    /// Edit instruction.
    pub instruction: String,
    /// Content kinds the model may answer with.
    pub response_modalities: Vec<Modality>,
}

/// One part of a multimodal answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// A text part.
    Text(String),
    /// An inline image part.
    InlineData(InlineData),
}

/// A multimodal response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentResponse {
    /// Parts of the first candidate, in order.
    pub parts: Vec<ContentPart>,
    /// Why the prompt or output was blocked, if it was.
    pub block_reason: Option<String>,
}

impl ContentResponse {
    /// Returns the first part that carries inline data.
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.parts.iter().find_map(|part| match part {
            ContentPart::InlineData(data) => Some(data),
            ContentPart::Text(_) => None,
        })
    }

    /// Returns the concatenated text parts, or `None` if there are none.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::InlineData(_) => None,
            })
            .collect();
        (!texts.is_empty()).then(|| texts.concat())
    }
}

/// A text-to-video job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    /// Model identifier.
    pub model: String,
    /// Video prompt.
    pub prompt: String,
    /// Number of videos to produce.
    pub number_of_videos: u32,
}

/// Snapshot of a long-running video job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoOperation {
    /// Opaque operation name used for polling.
    pub name: String,
    /// Whether the job has finished.
    pub done: bool,
    /// Download URI of the first generated video.
    pub video_uri: Option<String>,
    /// Failure message reported by the job.
    pub error: Option<String>,
    /// Number of outputs removed by safety filters.
    pub filtered_count: u32,
    /// Reasons given for filtered outputs.
    pub filtered_reasons: Vec<String>,
}

/// Bytes fetched from a result URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    /// Raw payload.
    pub data: Vec<u8>,
    /// `Content-Type` reported by the server.
    pub mime_type: Option<String>,
}

/// The four logical operations of the generative service.
#[async_trait]
pub trait GenAiBackend: Send + Sync {
    /// Returns true if a usable credential is configured.
    fn is_configured(&self) -> bool;

    /// Model identifiers to use for each operation.
    fn models(&self) -> &ModelSet;

    /// Runs a text completion.
    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse>;

    /// Runs text-to-image generation.
    async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse>;

    /// Runs a multimodal generation (image editing).
    async fn generate_content(&self, request: &ContentRequest) -> Result<ContentResponse>;

    /// Submits a video job.
    async fn submit_video(&self, request: &VideoRequest) -> Result<VideoOperation>;

    /// Fetches the latest state of a video job.
    async fn get_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation>;

    /// Downloads a finished asset.
    async fn download(&self, uri: &str) -> Result<DownloadedAsset>;
}

/// Fails with the configuration error when no credential is set.
pub(crate) fn ensure_configured(backend: &dyn GenAiBackend) -> Result<()> {
    if backend.is_configured() {
        Ok(())
    } else {
        Err(KhayalError::MissingCredential)
    }
}
