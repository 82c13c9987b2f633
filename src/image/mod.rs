//! Image generation and editing.

mod edit;
mod generate;
mod types;

pub use edit::edit_image;
pub use generate::{generate_image, OUTPUT_MIME_TYPE};
pub use types::{AspectRatio, GeneratedImage, GenerationMetadata, ImageFormat, SourceImage};
