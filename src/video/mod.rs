//! Video generation with job polling.

mod generate;
mod poll;
mod types;

pub use generate::{generate_video, generate_video_with_progress};
pub use types::{GeneratedVideo, JobState, VideoMetadata, DEFAULT_VIDEO_MIME_TYPE};
