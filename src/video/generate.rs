use super::poll::{poll_until_done, Finished};
use super::types::{GeneratedVideo, JobState, VideoMetadata, DEFAULT_VIDEO_MIME_TYPE};
use crate::backend::{ensure_configured, GenAiBackend, VideoRequest};
use crate::blob::BlobRegistry;
use crate::config::PollPolicy;
use crate::error::{Action, KhayalError, Result};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

const NO_DOWNLOAD_LINK: &str = "فشل توليد الفيديو: لم يتم العثور على رابط التنزيل.";

/// Generates one video for `prompt` and exposes it as an object URL.
///
/// Submits the job, polls it per `policy`, then downloads the result with
/// the credential attached. Nothing is downloaded before the job is done.
pub async fn generate_video(
    backend: &dyn GenAiBackend,
    blobs: &BlobRegistry,
    prompt: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<GeneratedVideo> {
    generate_video_with_progress(backend, blobs, prompt, policy, cancel, |_| {}).await
}

/// Like [`generate_video`], reporting each [`JobState`] transition.
pub async fn generate_video_with_progress<F>(
    backend: &dyn GenAiBackend,
    blobs: &BlobRegistry,
    prompt: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut progress: F,
) -> Result<GeneratedVideo>
where
    F: FnMut(JobState) + Send,
{
    ensure_configured(backend)?;

    let model = backend.models().video.clone();
    let request = VideoRequest {
        model: model.clone(),
        prompt: prompt.to_string(),
        number_of_videos: 1,
    };

    let start = Instant::now();
    let result = async {
        let submitted = backend.submit_video(&request).await?;
        tracing::info!(operation = %submitted.name, model = %model, "video job submitted");
        progress(JobState::Submitted);

        let Finished {
            operation,
            attempts,
        } = poll_until_done(backend, submitted, policy, cancel, &mut progress).await?;

        if let Some(message) = operation.error {
            return Err(KhayalError::JobFailed(message));
        }

        let Some(uri) = operation.video_uri else {
            if operation.filtered_count > 0 {
                let reasons = operation.filtered_reasons.join("; ");
                return Err(KhayalError::ContentBlocked(if reasons.is_empty() {
                    format!("{} filtered", operation.filtered_count)
                } else {
                    reasons
                }));
            }
            return Err(KhayalError::MissingField(NO_DOWNLOAD_LINK.into()));
        };

        let asset = backend.download(&uri).await?;
        let mime_type = asset
            .mime_type
            .filter(|m| m.starts_with("video/"))
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME_TYPE.to_string());
        let size = asset.data.len();
        let url = blobs.create_object_url(asset.data, mime_type.clone());

        tracing::info!(
            operation = %operation.name,
            attempts,
            size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "video ready"
        );

        Ok(GeneratedVideo {
            url,
            mime_type,
            size,
            metadata: VideoMetadata {
                model: Some(model),
                duration_ms: Some(start.elapsed().as_millis() as u64),
                operation: Some(operation.name),
                poll_attempts: attempts,
            },
        })
    }
    .await;

    match result {
        Ok(video) => {
            progress(JobState::Done);
            Ok(video)
        }
        Err(e) => {
            progress(JobState::Failed);
            Err(e.reported(Action::GenerateVideo))
        }
    }
}
