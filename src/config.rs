//! Model selection and polling configuration.

use std::time::Duration;

/// Default Gemini API origin.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model identifiers used for each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    /// Text model used for prompt enhancement.
    pub text: String,
    /// Imagen model used for text-to-image.
    pub image: String,
    /// Multimodal model used for image editing.
    pub edit: String,
    /// Veo model used for text-to-video.
    pub video: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            text: "gemini-2.5-flash".to_string(),
            image: "imagen-4.0-generate-001".to_string(),
            edit: "gemini-2.5-flash-image-preview".to_string(),
            video: "veo-2.0-generate-001".to_string(),
        }
    }
}

/// How the video job is polled.
///
/// The loop stops at whichever bound is hit first: `timeout` or
/// `max_attempts` status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before each status check.
    pub interval: Duration,
    /// Overall deadline, measured from the first status wait after submission.
    pub timeout: Duration,
    /// Maximum number of status checks.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600), // 10 minutes for video
            max_attempts: 60,
        }
    }
}

impl PollPolicy {
    /// Applies `KHAYAL_POLL_INTERVAL_SECS`, `KHAYAL_VIDEO_TIMEOUT_SECS` and
    /// `KHAYAL_MAX_POLL_ATTEMPTS` on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: env_u64("KHAYAL_POLL_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            timeout: env_u64("KHAYAL_VIDEO_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_attempts: env_u64("KHAYAL_MAX_POLL_ATTEMPTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.max_attempts),
        }
    }

    /// Sets the wait between status checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the overall deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of status checks.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse().ok()
}
