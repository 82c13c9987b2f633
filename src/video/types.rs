//! Core types for video generation.

use crate::blob::ObjectUrl;
use crate::error::{KhayalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type assumed when the download carries no `Content-Type`.
pub const DEFAULT_VIDEO_MIME_TYPE: &str = "video/mp4";

/// Metadata about the video generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Opaque operation name of the job.
    pub operation: Option<String>,
    /// Number of status checks made before the job finished.
    pub poll_attempts: u32,
}

/// Lifecycle of a video job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Accepted by the service, not yet checked.
    Submitted,
    /// Being polled; `attempt` status checks made so far.
    Polling {
        /// Status checks made so far.
        attempt: u32,
    },
    /// Finished successfully.
    Done,
    /// Finished with an error, or abandoned.
    Failed,
}

/// A generated video, held behind a local object URL.
#[derive(Debug)]
#[must_use = "dropping the video revokes its object URL"]
pub struct GeneratedVideo {
    /// Object URL owning the downloaded bytes.
    pub url: ObjectUrl,
    /// MIME type (e.g., "video/mp4").
    pub mime_type: String,
    /// Size of the payload in bytes.
    pub size: usize,
    /// Generation metadata.
    pub metadata: VideoMetadata,
}

impl GeneratedVideo {
    /// Returns the object URL as a string.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Saves the video to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let blob = self
            .url
            .blob()
            .ok_or_else(|| KhayalError::MissingField(format!("{} was revoked", self.url)))?;
        std::fs::write(path, &*blob.data)?;
        Ok(())
    }
}
