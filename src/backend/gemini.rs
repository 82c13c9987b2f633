//! Gemini Developer API backend (Gemini text, Imagen, Gemini image, Veo).

use crate::backend::{
    ContentPart, ContentRequest, ContentResponse, DownloadedAsset, GenAiBackend, ImageRequest,
    ImageResponse, InlineData, Modality, TextRequest, TextResponse, VideoOperation, VideoRequest,
};
use crate::config::{ModelSet, DEFAULT_BASE_URL};
use crate::credential::Credential;
use crate::error::{sanitize_error_message, KhayalError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Builder for GeminiBackend.
#[derive(Debug, Clone)]
pub struct GeminiBackendBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    models: ModelSet,
    request_timeout: Duration,
}

impl Default for GeminiBackendBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            models: ModelSet::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiBackendBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, `API_KEY`, then
    /// `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API origin. Falls back to `GEMINI_BASE_URL`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the models used for each operation.
    pub fn models(mut self, models: ModelSet) -> Self {
        self.models = models;
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the backend.
    ///
    /// A missing key does not fail the build; it is reported by every
    /// operation instead.
    pub fn build(self) -> Result<GeminiBackend> {
        let credential = match self.api_key {
            Some(key) => Credential::new(key),
            None => Credential::from_env(),
        };
        if !credential.is_available() {
            tracing::warn!("no Gemini API key configured; generation calls will fail");
        }

        let base_url = self
            .base_url
            .or_else(|| std::env::var("GEMINI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;

        Ok(GeminiBackend {
            client,
            credential,
            base_url,
            models: self.models,
        })
    }
}

/// Gemini Developer API backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    credential: Credential,
    base_url: String,
    models: ModelSet,
}

impl GeminiBackend {
    /// Creates a new `GeminiBackendBuilder`.
    pub fn builder() -> GeminiBackendBuilder {
        GeminiBackendBuilder::new()
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    /// Checks that the key is accepted and the text model is reachable.
    pub async fn health_check(&self) -> Result<()> {
        let api_key = self.credential.require()?;
        let url = format!("{}/v1beta/models/{}", self.base_url, self.models.text);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }
        Ok(())
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let api_key = self.credential.require()?;

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenAiBackend for GeminiBackend {
    fn is_configured(&self) -> bool {
        self.credential.is_available()
    }

    fn models(&self) -> &ModelSet {
        &self.models
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        let url = self.model_url(&request.model, "generateContent");
        let body = GenerateContentRequest::text(request);
        tracing::debug!(model = %request.model, "requesting text completion");

        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        Ok(TextResponse {
            text: response.into_content().text().unwrap_or_default(),
        })
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse> {
        let url = self.model_url(&request.model, "predict");
        let body = ImagenRequest::from_request(request);
        tracing::debug!(
            model = %request.model,
            aspect_ratio = %request.aspect_ratio,
            "requesting image generation"
        );

        let response: ImagenResponse = self.post_json(&url, &body).await?;
        Ok(response.into_image_response())
    }

    async fn generate_content(&self, request: &ContentRequest) -> Result<ContentResponse> {
        let url = self.model_url(&request.model, "generateContent");
        let body = GenerateContentRequest::edit(request);
        tracing::debug!(
            model = %request.model,
            mime_type = %request.image.mime_type,
            "requesting image edit"
        );

        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        Ok(response.into_content())
    }

    async fn submit_video(&self, request: &VideoRequest) -> Result<VideoOperation> {
        let url = self.model_url(&request.model, "predictLongRunning");
        let body = VeoRequest::from_request(request);

        let operation: VeoOperationResponse = self.post_json(&url, &body).await?;
        tracing::debug!(operation = %operation.name, "submitted video generation request");
        Ok(operation.into_operation())
    }

    async fn get_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        let api_key = self.credential.require()?;
        let url = format!("{}/v1beta/{}", self.base_url, operation.name);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let operation: VeoOperationResponse = response.json().await?;
        Ok(operation.into_operation())
    }

    async fn download(&self, uri: &str) -> Result<DownloadedAsset> {
        if uri.starts_with("gs://") {
            return Err(KhayalError::MissingField(format!(
                "الرابط المُرجع يشير إلى Google Cloud Storage ({uri}) ولا يمكن تحميله مباشرة."
            )));
        }

        let api_key = self.credential.require()?;
        let url = append_key(uri, api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KhayalError::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KhayalError::Download {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string(),
            });
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let data = response
            .bytes()
            .await
            .map_err(|e| KhayalError::Network(e.without_url()))?
            .to_vec();

        Ok(DownloadedAsset { data, mime_type })
    }
}

/// Appends the API key as a `key` query parameter.
fn append_key(uri: &str, api_key: &str) -> String {
    if uri.contains('?') {
        format!("{uri}&key={api_key}")
    } else {
        format!("{uri}?key={api_key}")
    }
}

fn parse_error(status: u16, text: &str) -> KhayalError {
    let text = sanitize_error_message(text);
    if status == 402 {
        return KhayalError::Api {
            status,
            message: "Gemini billing issue: enable billing at https://aistudio.google.com".into(),
        };
    }
    if status == 404 {
        return KhayalError::Api {
            status,
            message: format!("Model or operation not found. Verify the model name. ({text})"),
        };
    }
    if status == 429 {
        return KhayalError::RateLimited;
    }
    if status == 401 || status == 403 {
        return KhayalError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("api key not valid") || lower.contains("api_key_invalid") {
        return KhayalError::Auth(text);
    }
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return KhayalError::ContentBlocked(text);
    }
    KhayalError::Api {
        status,
        message: text,
    }
}

// ── generateContent wire format ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WireRequestPart>,
}

/// A part in a request - text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<Modality>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl GenerateContentRequest {
    fn text(req: &TextRequest) -> Self {
        Self {
            contents: vec![WireContent {
                role: Some("user"),
                parts: vec![WireRequestPart::Text {
                    text: req.prompt.clone(),
                }],
            }],
            system_instruction: req.system_instruction.as_ref().map(|text| WireContent {
                role: None,
                parts: vec![WireRequestPart::Text { text: text.clone() }],
            }),
            generation_config: req.thinking_budget.map(|budget| GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: budget,
                }),
                ..Default::default()
            }),
        }
    }

    fn edit(req: &ContentRequest) -> Self {
        Self {
            contents: vec![WireContent {
                role: Some("user"),
                parts: vec![
                    WireRequestPart::InlineData {
                        inline_data: req.image.clone(),
                    },
                    WireRequestPart::Text {
                        text: req.instruction.clone(),
                    },
                ],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(req.response_modalities.clone()),
                thinking_config: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Finish reasons that mean the output was withheld.
const BLOCKING_FINISH_REASONS: [&str; 7] = [
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "PROHIBITED_CONTENT",
    "RECITATION",
    "BLOCKLIST",
    "NO_IMAGE",
];

impl GenerateContentResponse {
    fn into_content(self) -> ContentResponse {
        let mut block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let parts = match self.candidates.into_iter().next() {
            Some(candidate) => {
                if block_reason.is_none() {
                    block_reason = candidate
                        .finish_reason
                        .filter(|r| BLOCKING_FINISH_REASONS.contains(&r.as_str()));
                }
                candidate
                    .content
                    .map(|c| c.parts)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| match (p.inline_data, p.text) {
                        (Some(data), _) => Some(ContentPart::InlineData(data)),
                        (None, Some(text)) => Some(ContentPart::Text(text)),
                        (None, None) => None,
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        ContentResponse {
            parts,
            block_reason,
        }
    }
}

// ── Imagen :predict wire format ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ImagenRequest {
    instances: Vec<PromptInstance>,
    parameters: ImagenParameters,
}

#[derive(Debug, Serialize)]
struct PromptInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_options: ImagenOutputOptions,
    include_rai_reason: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenOutputOptions {
    mime_type: String,
}

impl ImagenRequest {
    fn from_request(req: &ImageRequest) -> Self {
        Self {
            instances: vec![PromptInstance {
                prompt: req.prompt.clone(),
            }],
            parameters: ImagenParameters {
                sample_count: req.number_of_images,
                aspect_ratio: req.aspect_ratio.as_str().to_string(),
                output_options: ImagenOutputOptions {
                    mime_type: req.output_mime_type.clone(),
                },
                include_rai_reason: true,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

impl ImagenResponse {
    fn into_image_response(self) -> ImageResponse {
        let mut images = Vec::new();
        let mut filtered_reason = None;

        for prediction in self.predictions {
            match prediction.bytes_base64_encoded {
                Some(data) => images.push(InlineData {
                    mime_type: prediction
                        .mime_type
                        .unwrap_or_else(|| "image/jpeg".to_string()),
                    data,
                }),
                None => {
                    if filtered_reason.is_none() {
                        filtered_reason = prediction.rai_filtered_reason;
                    }
                }
            }
        }

        ImageResponse {
            images,
            filtered_reason,
        }
    }
}

// ── Veo :predictLongRunning wire format ─────────────────────────────────────

#[derive(Debug, Serialize)]
struct VeoRequest {
    instances: Vec<PromptInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    sample_count: u32,
}

impl VeoRequest {
    fn from_request(req: &VideoRequest) -> Self {
        Self {
            instances: vec![PromptInstance {
                prompt: req.prompt.clone(),
            }],
            parameters: VeoParameters {
                sample_count: req.number_of_videos,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    message: Option<String>,
}

impl VeoOperationResponse {
    fn into_operation(self) -> VideoOperation {
        let generated = self.response.and_then(|r| r.generate_video_response);

        let (video_uri, filtered_count, filtered_reasons) = match generated {
            Some(resp) => (
                resp.generated_samples
                    .and_then(|samples| samples.into_iter().next())
                    .and_then(|sample| sample.video)
                    .and_then(|video| video.uri),
                resp.rai_media_filtered_count.unwrap_or(0),
                resp.rai_media_filtered_reasons.unwrap_or_default(),
            ),
            None => (None, 0, Vec::new()),
        };

        VideoOperation {
            name: self.name,
            done: self.done.unwrap_or(false),
            video_uri,
            error: self
                .error
                .map(|e| e.message.unwrap_or_else(|| "Unknown error".into())),
            filtered_count,
            filtered_reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::AspectRatio;

    #[test]
    fn test_builder_with_explicit_key() {
        let backend = GeminiBackendBuilder::new()
            .api_key("test-key")
            .build()
            .unwrap();
        assert!(backend.is_configured());
        assert_eq!(backend.models().video, "veo-2.0-generate-001");
    }

    #[test]
    fn test_builder_blank_key_is_not_configured() {
        let backend = GeminiBackendBuilder::new().api_key("").build().unwrap();
        assert!(!backend.is_configured());
    }

    #[test]
    fn test_builder_trims_base_url() {
        let backend = GeminiBackendBuilder::new()
            .api_key("k")
            .base_url("http://localhost:9999/")
            .build()
            .unwrap();
        assert_eq!(
            backend.model_url("gemini-2.5-flash", "generateContent"),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_text_request_wire_format() {
        let req = TextRequest {
            model: "gemini-2.5-flash".into(),
            system_instruction: Some("be brief".into()),
            prompt: "hello".into(),
            thinking_budget: Some(0),
        };
        let json = serde_json::to_value(GenerateContentRequest::text(&req)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
        assert!(json["generationConfig"].get("responseModalities").is_none());
    }

    #[test]
    fn test_edit_request_wire_format() {
        let req = ContentRequest {
            model: "gemini-2.5-flash-image-preview".into(),
            image: InlineData {
                mime_type: "image/png".into(),
                data: "iVBORw0KGgo=".into(),
            },
            instruction: "add a cat".into(),
            response_modalities: vec![Modality::Image, Modality::Text],
        };
        let json = serde_json::to_value(GenerateContentRequest::edit(&req)).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0KGgo=");
        assert_eq!(parts[1]["text"], "add a cat");
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_content_response_skips_thoughts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "A detailed prompt."}
                ]},
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let content = resp.into_content();
        assert_eq!(content.text().as_deref(), Some("A detailed prompt."));
        assert!(content.block_reason.is_none());
    }

    #[test]
    fn test_content_response_with_image_and_text() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here is your edit"},
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
                ]}
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let content = resp.into_content();
        let image = content.first_inline_data().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "AAAA");
    }

    #[test]
    fn test_content_response_prompt_blocked() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let content = resp.into_content();
        assert!(content.parts.is_empty());
        assert_eq!(content.block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_content_response_blocking_finish_reason() {
        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.into_content().block_reason.as_deref(),
            Some("IMAGE_SAFETY")
        );
    }

    #[test]
    fn test_imagen_request_wire_format() {
        let req = ImageRequest {
            model: "imagen-4.0-generate-001".into(),
            prompt: "a red fox in snow".into(),
            number_of_images: 1,
            output_mime_type: "image/jpeg".into(),
            aspect_ratio: AspectRatio::Landscape,
        };
        let json = serde_json::to_value(ImagenRequest::from_request(&req)).unwrap();

        assert_eq!(json["instances"][0]["prompt"], "a red fox in snow");
        assert_eq!(json["parameters"]["sampleCount"], 1);
        assert_eq!(json["parameters"]["aspectRatio"], "16:9");
        assert_eq!(json["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_imagen_response_filtered() {
        let json = r#"{"predictions": [{"raiFilteredReason": "Filtered for safety"}]}"#;
        let resp: ImagenResponse = serde_json::from_str(json).unwrap();
        let images = resp.into_image_response();
        assert!(images.images.is_empty());
        assert_eq!(images.filtered_reason.as_deref(), Some("Filtered for safety"));
    }

    #[test]
    fn test_imagen_response_empty_body() {
        let resp: ImagenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.into_image_response(), ImageResponse::default());
    }

    #[test]
    fn test_imagen_response_with_image() {
        let json = r#"{"predictions": [{"bytesBase64Encoded": "/9j/4AAQ", "mimeType": "image/jpeg"}]}"#;
        let resp: ImagenResponse = serde_json::from_str(json).unwrap();
        let images = resp.into_image_response();
        assert_eq!(images.images.len(), 1);
        assert_eq!(images.images[0].data, "/9j/4AAQ");
    }

    #[test]
    fn test_veo_request_wire_format() {
        let req = VideoRequest {
            model: "veo-2.0-generate-001".into(),
            prompt: "Ocean waves".into(),
            number_of_videos: 1,
        };
        let json = serde_json::to_value(VeoRequest::from_request(&req)).unwrap();
        assert_eq!(json["instances"][0]["prompt"], "Ocean waves");
        assert_eq!(json["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn test_operation_not_done() {
        let json = r#"{"name": "models/veo/operations/123"}"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let op = resp.into_operation();
        assert_eq!(op.name, "models/veo/operations/123");
        assert!(!op.done);
        assert!(op.video_uri.is_none());
    }

    #[test]
    fn test_operation_done_with_video() {
        let json = r#"{
            "name": "operations/123",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{
                        "video": {"uri": "https://example.com/files/abc:download?alt=media"}
                    }]
                }
            }
        }"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let op = resp.into_operation();
        assert!(op.done);
        assert_eq!(
            op.video_uri.as_deref(),
            Some("https://example.com/files/abc:download?alt=media")
        );
    }

    #[test]
    fn test_operation_filtered_and_error() {
        let json = r#"{
            "name": "operations/123",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "raiMediaFilteredCount": 1,
                    "raiMediaFilteredReasons": ["person generation blocked"]
                }
            }
        }"#;
        let op = serde_json::from_str::<VeoOperationResponse>(json)
            .unwrap()
            .into_operation();
        assert_eq!(op.filtered_count, 1);
        assert_eq!(op.filtered_reasons, vec!["person generation blocked"]);

        let json = r#"{"name": "operations/9", "done": true, "error": {"message": "Quota exceeded"}}"#;
        let op = serde_json::from_str::<VeoOperationResponse>(json)
            .unwrap()
            .into_operation();
        assert_eq!(op.error.as_deref(), Some("Quota exceeded"));
    }

    #[test]
    fn test_append_key() {
        assert_eq!(
            append_key("https://x/files/a:download?alt=media", "k"),
            "https://x/files/a:download?alt=media&key=k"
        );
        assert_eq!(append_key("https://x/v.mp4", "k"), "https://x/v.mp4?key=k");
    }

    #[test]
    fn test_parse_error_mapping() {
        assert!(matches!(
            parse_error(403, "forbidden"),
            KhayalError::Auth(_)
        ));
        assert!(matches!(
            parse_error(
                400,
                r#"{"error": {"message": "API key not valid. Please pass a valid API key."}}"#
            ),
            KhayalError::Auth(_)
        ));
        assert!(matches!(
            parse_error(429, "slow down"),
            KhayalError::RateLimited
        ));
        assert!(matches!(
            parse_error(400, "Prompt blocked by safety filters"),
            KhayalError::ContentBlocked(_)
        ));
        match parse_error(500, r#"{"error": {"message": "Internal"}}"#) {
            KhayalError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal");
            }
            other => panic!("Expected Api error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gs_uri_is_rejected_before_fetch() {
        let backend = GeminiBackendBuilder::new()
            .api_key("test-key")
            .build()
            .unwrap();

        let err = backend.download("gs://bucket/video.mp4").await.unwrap_err();
        assert!(err.to_string().contains("Google Cloud Storage"));
    }

    #[tokio::test]
    async fn test_unconfigured_backend_fails_before_request() {
        let backend = GeminiBackendBuilder::new()
            .api_key("")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();

        let err = backend
            .submit_video(&VideoRequest {
                model: "veo-2.0-generate-001".into(),
                prompt: "x".into(),
                number_of_videos: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KhayalError::MissingCredential));
    }
}
