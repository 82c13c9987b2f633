use super::types::{AspectRatio, GeneratedImage, GenerationMetadata};
use crate::backend::{ensure_configured, GenAiBackend, ImageRequest};
use crate::error::{Action, KhayalError, Result};
use std::time::Instant;

/// Result images are always requested and labelled as JPEG.
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

const NOT_GENERATED: &str =
    "لم يتم توليد الصورة. قد يكون السبب يتعلق بسياسات السلامة أو خطأ في النموذج.";

/// Generates exactly one image for `prompt` with the image model.
///
/// The returned payload is the service's base64 string, untouched, labelled
/// `image/jpeg`.
pub async fn generate_image(
    backend: &dyn GenAiBackend,
    prompt: &str,
    aspect_ratio: AspectRatio,
) -> Result<GeneratedImage> {
    ensure_configured(backend)?;

    let model = backend.models().image.clone();
    let request = ImageRequest {
        model: model.clone(),
        prompt: prompt.to_string(),
        number_of_images: 1,
        output_mime_type: OUTPUT_MIME_TYPE.to_string(),
        aspect_ratio,
    };

    let start = Instant::now();
    async {
        let response = backend.generate_images(&request).await?;

        let Some(image) = response.images.into_iter().next() else {
            let message = match response.filtered_reason {
                Some(reason) => format!("{NOT_GENERATED} السبب: {reason}"),
                None => NOT_GENERATED.to_string(),
            };
            return Err(KhayalError::EmptyResult(message));
        };

        let metadata = GenerationMetadata {
            model: Some(model),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        };
        Ok(GeneratedImage::new(image.data, OUTPUT_MIME_TYPE, metadata))
    }
    .await
    .map_err(|e| e.reported(Action::GenerateImage))
}
