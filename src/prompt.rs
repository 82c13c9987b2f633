//! Prompt enhancement: rewrite an Arabic prompt as a detailed English one.

use crate::backend::{ensure_configured, GenAiBackend, TextRequest};
use crate::error::{Action, KhayalError, Result};

/// Fixed instruction sent with every enhancement request.
pub const ENHANCE_SYSTEM_INSTRUCTION: &str = "You are an expert prompt engineer for generative AI image models. Your task is to translate a user's Arabic prompt into a highly detailed, descriptive English prompt. The English prompt should be rich in visual details, including subject, style (e.g., photorealistic, impressionistic, digital art), composition, lighting (e.g., cinematic lighting, soft light), and mood. The goal is to maximize the quality and artistic value of the generated image. Respond *only* with the final English prompt, without any extra text or explanation.";

const EMPTY_ENHANCEMENT: &str = "لم يُرجع تحسين الوصف أي نتيجة.";

/// Rewrites `prompt` with the text model and returns the trimmed result.
///
/// Makes exactly one request with thinking disabled. Fails with
/// [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) before any
/// call when no credential is set.
pub async fn enhance_prompt(backend: &dyn GenAiBackend, prompt: &str) -> Result<String> {
    ensure_configured(backend)?;

    let request = TextRequest {
        model: backend.models().text.clone(),
        system_instruction: Some(ENHANCE_SYSTEM_INSTRUCTION.to_string()),
        prompt: format!("Original Arabic prompt: \"{prompt}\""),
        thinking_budget: Some(0),
    };

    async {
        let response = backend.generate_text(&request).await?;
        let enhanced = response.text.trim();
        if enhanced.is_empty() {
            return Err(KhayalError::EmptyResult(EMPTY_ENHANCEMENT.into()));
        }
        tracing::debug!(chars = enhanced.chars().count(), "prompt enhanced");
        Ok(enhanced.to_string())
    }
    .await
    .map_err(|e| e.reported(Action::EnhancePrompt))
}
