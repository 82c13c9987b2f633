#![warn(missing_docs)]
//! Khayal - Arabic-first image and video generation on Gemini.
//!
//! Prompts (usually Arabic) are optionally rewritten into detailed English,
//! then sent to Imagen, a Gemini image model or Veo. Results come back as
//! renderable URIs: `data:` URIs for images, local object URLs for videos.
//!
//! # Quick Start - Images
//!
//! ```no_run
//! use khayal::{AspectRatio, GeminiBackend};
//!
//! #[tokio::main]
//! async fn main() -> khayal::Result<()> {
//!     let backend = GeminiBackend::builder().build()?;
//!     let image = khayal::generate_image(&backend, "a red fox in snow", AspectRatio::Landscape).await?;
//!     image.save("fox.jpg")?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Videos
//!
//! ```no_run
//! use khayal::{BlobRegistry, CancellationToken, GeminiBackend, PollPolicy};
//!
//! #[tokio::main]
//! async fn main() -> khayal::Result<()> {
//!     let backend = GeminiBackend::builder().build()?;
//!     let blobs = BlobRegistry::new();
//!     let video = khayal::generate_video(
//!         &backend,
//!         &blobs,
//!         "ocean waves at sunset",
//!         &PollPolicy::default(),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//!     video.save("waves.mp4")?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! - `GEMINI_API_KEY`, `API_KEY` or `GOOGLE_API_KEY`: the credential.
//! - `GEMINI_BASE_URL`: API origin override.
//! - `KHAYAL_POLL_INTERVAL_SECS`, `KHAYAL_VIDEO_TIMEOUT_SECS`,
//!   `KHAYAL_MAX_POLL_ATTEMPTS`: read by [`PollPolicy::from_env`].

pub mod backend;
pub mod blob;
mod config;
mod credential;
pub mod encode;
mod error;
pub mod image;
pub mod prompt;
pub mod state;
pub mod studio;
pub mod video;

pub use backend::{GeminiBackend, GeminiBackendBuilder, GenAiBackend};
pub use blob::{BlobRegistry, ObjectUrl};
pub use config::{ModelSet, PollPolicy, DEFAULT_BASE_URL};
pub use credential::{Credential, API_KEY_ENV_VARS};
pub use error::{Action, ErrorKind, KhayalError, Result};
pub use image::{edit_image, generate_image, AspectRatio, GeneratedImage, ImageFormat, SourceImage};
pub use prompt::enhance_prompt;
pub use state::{InFlight, OperationState, Panel};
pub use studio::{
    GenerationMode, GenerationRequest, GenerationResult, ResultKind, ResultUri, Studio,
};
pub use tokio_util::sync::CancellationToken;
pub use video::{generate_video, GeneratedVideo, JobState};
