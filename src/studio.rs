//! Request orchestration for the three generation surfaces.
//!
//! A [`Studio`] validates a [`GenerationRequest`], routes it to prompt
//! enhancement, image generation, image editing or video generation, and
//! returns a renderable [`GenerationResult`]. [`Studio::submit`] drives a
//! [`Panel`] so a surface never runs two requests at once.

use crate::backend::GenAiBackend;
use crate::blob::{BlobRegistry, ObjectUrl};
use crate::config::PollPolicy;
use crate::error::{KhayalError, Result};
use crate::image::{edit_image, generate_image, AspectRatio, SourceImage};
use crate::prompt::enhance_prompt;
use crate::state::{OperationState, Panel};
use crate::video::generate_video;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Which surface a request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Text-to-image, optionally with prompt enhancement.
    Image,
    /// Instruction-driven edit of an uploaded image.
    FastImage,
    /// Text-to-video.
    Video,
}

impl GenerationMode {
    fn missing_input_message(&self) -> &'static str {
        match self {
            Self::Image => "الرجاء إدخال وصف للصورة.",
            Self::FastImage => "الرجاء تحميل صورة وإدخال وصف للتعديل.",
            Self::Video => "الرجاء إدخال وصف للفيديو.",
        }
    }
}

/// A user's generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Free-text prompt or edit instruction.
    pub prompt: String,
    /// Target surface.
    pub mode: GenerationMode,
    /// Image to edit; required in [`GenerationMode::FastImage`].
    pub source_image: Option<SourceImage>,
    /// Framing for [`GenerationMode::Image`].
    pub aspect_ratio: AspectRatio,
    /// Rewrite the prompt before generating. Image mode only.
    pub enhance: bool,
}

impl GenerationRequest {
    /// Creates a request. Enhancement is on by default in image mode.
    pub fn new(prompt: impl Into<String>, mode: GenerationMode) -> Self {
        Self {
            prompt: prompt.into(),
            mode,
            source_image: None,
            aspect_ratio: AspectRatio::default(),
            enhance: mode == GenerationMode::Image,
        }
    }

    /// Sets the image to edit.
    pub fn with_source_image(mut self, image: SourceImage) -> Self {
        self.source_image = Some(image);
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Turns prompt enhancement on or off.
    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }
}

/// Kind of media produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// A still image.
    Image,
    /// A video clip.
    Video,
}

/// Where a result can be rendered from.
#[derive(Debug)]
pub enum ResultUri {
    /// A `data:` URI carrying the whole payload.
    Data(String),
    /// A local object URL, revoked when dropped.
    Object(ObjectUrl),
}

impl ResultUri {
    /// The URI as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Data(uri) => uri,
            Self::Object(url) => url.as_str(),
        }
    }
}

/// A renderable generation result.
#[derive(Debug)]
pub struct GenerationResult {
    /// Where to render the result from.
    pub uri: ResultUri,
    /// Media kind.
    pub kind: ResultKind,
    /// The rewritten prompt, when enhancement ran.
    pub enhanced_prompt: Option<String>,
}

/// Runs generation requests against one backend.
#[derive(Clone)]
pub struct Studio {
    backend: Arc<dyn GenAiBackend>,
    blobs: BlobRegistry,
    policy: PollPolicy,
}

impl Studio {
    /// Creates a studio with the default poll policy and a fresh registry.
    pub fn new(backend: Arc<dyn GenAiBackend>) -> Self {
        Self {
            backend,
            blobs: BlobRegistry::new(),
            policy: PollPolicy::default(),
        }
    }

    /// Sets how video jobs are polled.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The backend requests are sent to.
    pub fn backend(&self) -> &dyn GenAiBackend {
        self.backend.as_ref()
    }

    /// How video jobs are polled.
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Registry holding video payloads.
    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    /// Rejects requests missing their required input.
    pub fn validate(request: &GenerationRequest) -> Result<()> {
        let missing_prompt = request.prompt.trim().is_empty();
        let missing_image =
            request.mode == GenerationMode::FastImage && request.source_image.is_none();

        if missing_prompt || missing_image {
            return Err(KhayalError::InvalidInput(
                request.mode.missing_input_message().into(),
            ));
        }
        Ok(())
    }

    /// Validates and runs one request.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        Self::validate(request)?;
        let backend = self.backend();
        let prompt = request.prompt.as_str();

        match (request.mode, request.source_image.as_ref()) {
            (GenerationMode::Image, _) => {
                let enhanced_prompt = if request.enhance {
                    Some(enhance_prompt(backend, prompt).await?)
                } else {
                    None
                };
                let final_prompt = enhanced_prompt.as_deref().unwrap_or(prompt);
                let image = generate_image(backend, final_prompt, request.aspect_ratio).await?;

                Ok(GenerationResult {
                    uri: ResultUri::Data(image.to_data_uri()),
                    kind: ResultKind::Image,
                    enhanced_prompt,
                })
            }
            (GenerationMode::FastImage, Some(source)) => {
                let image = edit_image(backend, source, prompt).await?;
                Ok(GenerationResult {
                    uri: ResultUri::Data(image.to_data_uri()),
                    kind: ResultKind::Image,
                    enhanced_prompt: None,
                })
            }
            (GenerationMode::FastImage, None) => Err(KhayalError::InvalidInput(
                GenerationMode::FastImage.missing_input_message().into(),
            )),
            (GenerationMode::Video, _) => {
                let video = generate_video(backend, &self.blobs, prompt, &self.policy, cancel).await?;
                Ok(GenerationResult {
                    uri: ResultUri::Object(video.url),
                    kind: ResultKind::Video,
                    enhanced_prompt: None,
                })
            }
        }
    }

    /// Runs `request` on behalf of `panel`.
    ///
    /// Fails with [`KhayalError::Busy`] and leaves the panel untouched if it
    /// already has a request in flight. Otherwise the previous result is
    /// released and the outcome, success or failure, is stored on the panel.
    /// Dropping the returned future part way leaves the panel `Failed` with
    /// [`KhayalError::Cancelled`], so the next submit is accepted.
    pub async fn submit<'p>(
        &self,
        panel: &'p mut Panel<GenerationResult>,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<&'p OperationState<GenerationResult>> {
        let running = panel.begin()?;
        let outcome = self.run(request, cancel).await;
        running.complete(outcome);
        Ok(panel.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{finished, pending, Call, FakeBackend};
    use crate::backend::{
        ContentPart, ContentResponse, DownloadedAsset, ImageResponse, InlineData, TextResponse,
    };
    use crate::error::ErrorKind;

    fn studio() -> (Arc<FakeBackend>, Studio) {
        let fake = Arc::new(FakeBackend::new());
        let studio = Studio::new(fake.clone());
        (fake, studio)
    }

    fn jpeg(data: &str) -> ImageResponse {
        ImageResponse {
            images: vec![InlineData {
                mime_type: "image/jpeg".into(),
                data: data.into(),
            }],
            filtered_reason: None,
        }
    }

    #[tokio::test]
    async fn test_red_fox_without_enhancement() {
        let (fake, studio) = studio();
        fake.push_images(Ok(jpeg("/9j/Zm94")));

        let request = GenerationRequest::new("a red fox in snow", GenerationMode::Image)
            .with_aspect_ratio("16:9".parse().unwrap())
            .with_enhance(false);
        let result = studio.run(&request, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.uri.as_str(), "data:image/jpeg;base64,/9j/Zm94");
        assert_eq!(result.kind, ResultKind::Image);
        assert!(result.enhanced_prompt.is_none());

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Images(req) => {
                assert_eq!(req.prompt, "a red fox in snow");
                assert_eq!(req.aspect_ratio, AspectRatio::Landscape);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_image_mode_enhances_by_default() {
        let (fake, studio) = studio();
        fake.push_text(Ok(TextResponse {
            text: "A majestic red fox in fresh powder snow, golden hour".into(),
        }))
        .push_images(Ok(jpeg("AAAA")));

        let request = GenerationRequest::new("ثعلب أحمر في الثلج", GenerationMode::Image);
        assert!(request.enhance);
        let result = studio.run(&request, &CancellationToken::new()).await.unwrap();

        assert_eq!(
            result.enhanced_prompt.as_deref(),
            Some("A majestic red fox in fresh powder snow, golden hour")
        );
        let calls = fake.calls();
        assert!(matches!(&calls[0], Call::Text(_)));
        assert!(matches!(
            &calls[1],
            Call::Images(req) if req.prompt == "A majestic red fox in fresh powder snow, golden hour"
        ));
    }

    #[tokio::test]
    async fn test_enhancement_failure_skips_generation() {
        let (fake, studio) = studio();
        fake.push_text(Ok(TextResponse::default()));

        let request = GenerationRequest::new("قطة", GenerationMode::Image);
        let err = studio.run(&request, &CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamEmpty);
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_prompt_never_reaches_backend() {
        let (fake, studio) = studio();
        let cancel = CancellationToken::new();

        for (mode, message) in [
            (GenerationMode::Image, "الرجاء إدخال وصف للصورة."),
            (GenerationMode::Video, "الرجاء إدخال وصف للفيديو."),
            (GenerationMode::FastImage, "الرجاء تحميل صورة وإدخال وصف للتعديل."),
        ] {
            let err = studio
                .run(&GenerationRequest::new("  \n\t", mode), &cancel)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(err.to_string(), message);
        }
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_requires_source_image() {
        let (fake, studio) = studio();
        let request = GenerationRequest::new("add a hat", GenerationMode::FastImage);

        let err = studio.run(&request, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_mode_returns_edited_image() {
        let (fake, studio) = studio();
        fake.push_content(Ok(ContentResponse {
            parts: vec![ContentPart::InlineData(InlineData {
                mime_type: "image/png".into(),
                data: "iVBO".into(),
            })],
            block_reason: None,
        }));

        let source = SourceImage::from_bytes(&[0xFF, 0xD8, 0xFF], "image/jpeg").unwrap();
        let request =
            GenerationRequest::new("add a hat", GenerationMode::FastImage).with_source_image(source);
        assert!(!request.enhance);

        let result = studio.run(&request, &CancellationToken::new()).await.unwrap();
        assert_eq!(result.uri.as_str(), "data:image/png;base64,iVBO");
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_panel_releases_previous_result() {
        let (fake, studio) = studio();
        for n in 0..2 {
            fake.push_submit(Ok(finished(&format!("operations/{n}"), "https://x/v.mp4")))
                .push_download(Ok(DownloadedAsset {
                    data: vec![n; 4],
                    mime_type: None,
                }));
        }

        let mut panel = Panel::new();
        let request = GenerationRequest::new("موج البحر", GenerationMode::Video);
        let cancel = CancellationToken::new();

        let state = studio.submit(&mut panel, &request, &cancel).await.unwrap();
        let first = state.result().unwrap().uri.as_str().to_string();
        assert_eq!(state.result().unwrap().kind, ResultKind::Video);
        assert_eq!(studio.blobs().len(), 1);

        studio.submit(&mut panel, &request, &cancel).await.unwrap();
        assert_eq!(studio.blobs().len(), 1);
        assert!(studio.blobs().resolve(&first).is_none());

        let current = panel.state().result().unwrap().uri.as_str().to_string();
        assert_eq!(&*studio.blobs().resolve(&current).unwrap().data, &[1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_submit_records_failure_on_panel() {
        let fake = Arc::new(FakeBackend::unconfigured());
        let studio = Studio::new(fake.clone());
        let mut panel = Panel::new();

        let request = GenerationRequest::new("a cat", GenerationMode::Image);
        let state = studio
            .submit(&mut panel, &request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(state.error().map(KhayalError::kind), Some(ErrorKind::Configuration));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_while_in_flight_is_busy() {
        let (fake, studio) = studio();
        let mut panel = Panel::new();
        std::mem::forget(panel.begin().unwrap());

        let request = GenerationRequest::new("a cat", GenerationMode::Image);
        let err = studio
            .submit(&mut panel, &request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, KhayalError::Busy));
        assert!(panel.state().is_in_flight());
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_is_sent_as_typed() {
        let (fake, studio) = studio();
        fake.push_images(Ok(jpeg("AAAA")));

        let request = GenerationRequest::new("  a red fox\n", GenerationMode::Image)
            .with_enhance(false);
        studio.run(&request, &CancellationToken::new()).await.unwrap();

        assert!(matches!(
            &fake.calls()[0],
            Call::Images(req) if req.prompt == "  a red fox\n"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submit_frees_panel() {
        let (fake, studio) = studio();
        fake.push_submit(Ok(pending("operations/slow")))
            .push_poll(Ok(pending("operations/slow")))
            .push_poll(Ok(pending("operations/slow")));

        let mut panel = Panel::new();
        let request = GenerationRequest::new("موج البحر", GenerationMode::Video);
        let cancel = CancellationToken::new();

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_secs(25),
            studio.submit(&mut panel, &request, &cancel),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!panel.state().is_in_flight());
        assert_eq!(
            panel.state().error().map(KhayalError::kind),
            Some(ErrorKind::Cancelled)
        );

        fake.push_submit(Ok(finished("operations/fast", "https://x/v.mp4")))
            .push_download(Ok(DownloadedAsset {
                data: vec![7; 4],
                mime_type: None,
            }));
        let state = studio.submit(&mut panel, &request, &cancel).await.unwrap();

        assert_eq!(state.result().map(|r| r.kind), Some(ResultKind::Video));
        assert_eq!(studio.blobs().len(), 1);
    }
}
