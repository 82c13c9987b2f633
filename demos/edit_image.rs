//! Image editing example - modifies an existing image with an instruction.
//!
//! Run with: `cargo run --example edit_image -- <input_image.png>`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use khayal::{GeminiBackend, KhayalError, SourceImage};

#[tokio::main]
async fn main() -> khayal::Result<()> {
    let input_path = std::env::args().nth(1).ok_or_else(|| {
        KhayalError::InvalidInput("Usage: edit_image <input_image.png>".into())
    })?;

    let source = SourceImage::from_path(&input_path)?;
    let backend = GeminiBackend::builder().build()?;

    let image = khayal::edit_image(&backend, &source, "أضف توهج غروب دافئ واجعل الألوان أكثر حيوية")
        .await?;

    let path = format!(
        "edited.{}",
        image.format().map_or("png", |f| f.extension())
    );
    image.save(&path)?;
    println!("Edited image saved to {path}");

    Ok(())
}
