use super::types::{GeneratedImage, GenerationMetadata, SourceImage};
use crate::backend::{ensure_configured, ContentRequest, GenAiBackend, InlineData, Modality};
use crate::error::{Action, KhayalError, Result};
use std::time::Instant;

const NO_EXPLANATION: &str = "لم يتمكن النموذج من تعديل الصورة ولم يقدم تفسيراً.";

/// Edits `source` according to `instruction` with the multimodal model.
///
/// The first inline image part of the answer wins. An answer with text but
/// no image fails with that text; an answer with neither fails with a fixed
/// message.
pub async fn edit_image(
    backend: &dyn GenAiBackend,
    source: &SourceImage,
    instruction: &str,
) -> Result<GeneratedImage> {
    ensure_configured(backend)?;

    let model = backend.models().edit.clone();
    let request = ContentRequest {
        model: model.clone(),
        image: InlineData {
            mime_type: source.mime_type.clone(),
            data: source.base64.clone(),
        },
        instruction: instruction.to_string(),
        response_modalities: vec![Modality::Image, Modality::Text],
    };

    let start = Instant::now();
    async {
        let response = backend.generate_content(&request).await?;

        if let Some(image) = response.first_inline_data() {
            let metadata = GenerationMetadata {
                model: Some(model),
                duration_ms: Some(start.elapsed().as_millis() as u64),
            };
            return Ok(GeneratedImage::new(
                image.data.clone(),
                image.mime_type.clone(),
                metadata,
            ));
        }

        let text = response.text().map(|t| t.trim().to_string());
        match text.filter(|t| !t.is_empty()) {
            Some(text) => Err(KhayalError::TextOnlyResponse(text)),
            None => {
                let message = match response.block_reason {
                    Some(reason) => format!("{NO_EXPLANATION} ({reason})"),
                    None => NO_EXPLANATION.to_string(),
                };
                Err(KhayalError::EmptyResult(message))
            }
        }
    }
    .await
    .map_err(|e| e.reported(Action::EditImage))
}
