//! Basic image generation example with prompt enhancement.
//!
//! Run with: `cargo run --example generate_image`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use khayal::{AspectRatio, GeminiBackend};

#[tokio::main]
async fn main() -> khayal::Result<()> {
    let backend = GeminiBackend::builder().build()?;

    let prompt = khayal::enhance_prompt(&backend, "ثعلب أحمر يقف في الثلج عند الفجر").await?;
    println!("Enhanced prompt: {prompt}");

    let image = khayal::generate_image(&backend, &prompt, AspectRatio::Landscape).await?;

    image.save("output.jpg")?;
    println!(
        "Generated image via {:?} in {:?}ms",
        image.metadata.model, image.metadata.duration_ms
    );

    Ok(())
}
