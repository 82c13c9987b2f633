//! Error types for generation requests.
//!
//! Every error carries a machine-readable [`ErrorKind`] next to its localized,
//! human-readable message. Failures raised while an operation runs are wrapped
//! in [`KhayalError::Failed`], which prefixes the message with the action the
//! user attempted.

use std::time::Duration;

/// Machine-readable classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No usable credential is configured.
    Configuration,
    /// Missing or malformed user input.
    Validation,
    /// The service completed without producing a usable artifact.
    UpstreamEmpty,
    /// Network, HTTP or upstream API failure.
    Transport,
    /// An expected field is absent from an otherwise successful response.
    ProtocolShape,
    /// The caller cancelled the operation.
    Cancelled,
    /// The video poll loop ran out of time or attempts.
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::UpstreamEmpty => "upstream_empty",
            Self::Transport => "transport",
            Self::ProtocolShape => "protocol_shape",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// The user-facing action a failure is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Rewriting a prompt with the text model.
    EnhancePrompt,
    /// Text-to-image generation.
    GenerateImage,
    /// Instruction-driven image editing.
    EditImage,
    /// Text-to-video generation, including polling and download.
    GenerateVideo,
}

impl Action {
    /// Localized prefix shown in front of the underlying cause.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Self::EnhancePrompt => "حدث خطأ أثناء تحسين الوصف",
            Self::GenerateImage => "حدث خطأ أثناء توليد الصورة",
            Self::EditImage => "فشل تعديل الصورة",
            Self::GenerateVideo => "حدث خطأ أثناء توليد الفيديو",
        }
    }
}

/// Errors that can occur while generating media.
#[derive(Debug, thiserror::Error)]
pub enum KhayalError {
    /// No API key configured.
    #[error("لا يمكن تهيئة Gemini API. يرجى التأكد من أن مفتاح API الخاص بك قد تم إعداده بشكل صحيح.")]
    MissingCredential,

    /// User input rejected before any call was made.
    #[error("{0}")]
    InvalidInput(String),

    /// A request is already in flight on the same surface.
    #[error("يوجد طلب قيد التنفيذ بالفعل، يرجى الانتظار حتى يكتمل.")]
    Busy,

    /// Content was blocked by safety filters.
    #[error("تم حظر المحتوى بواسطة فلاتر السلامة: {0}")]
    ContentBlocked(String),

    /// The service finished without an artifact.
    #[error("{0}")]
    EmptyResult(String),

    /// The editing model answered with text instead of an image.
    #[error("استجاب النموذج بنص فقط دون إرجاع صورة. النص: \"{0}\"")]
    TextOnlyResponse(String),

    /// A long-running job reported failure.
    #[error("فشلت مهمة التوليد: {0}")]
    JobFailed(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized upstream message.
        message: String,
    },

    /// API key rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded.
    #[error("rate limited by the API")]
    RateLimited,

    /// Fetching a finished asset returned a non-success status.
    #[error("فشل تحميل الفيديو: {reason}")]
    Download {
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        reason: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An expected field is missing from the response.
    #[error("{0}")]
    MissingField(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation was cancelled by its caller.
    #[error("تم إلغاء العملية.")]
    Cancelled,

    /// The video job did not finish in time.
    #[error("انتهت مهلة انتظار اكتمال المهمة بعد {0:?}")]
    Timeout(Duration),

    /// A failure wrapped with the action that was being performed.
    #[error("{}: {source}", .action.failure_prefix())]
    Failed {
        /// What the user was trying to do.
        action: Action,
        /// The underlying cause.
        #[source]
        source: Box<KhayalError>,
    },
}

impl KhayalError {
    /// Returns the machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential => ErrorKind::Configuration,
            Self::InvalidInput(_) | Self::Busy => ErrorKind::Validation,
            Self::ContentBlocked(_)
            | Self::EmptyResult(_)
            | Self::TextOnlyResponse(_)
            | Self::JobFailed(_) => ErrorKind::UpstreamEmpty,
            Self::Api { .. }
            | Self::Auth(_)
            | Self::RateLimited
            | Self::Download { .. }
            | Self::Network(_)
            | Self::Io(_) => ErrorKind::Transport,
            Self::MissingField(_) | Self::Decode(_) | Self::Json(_) => ErrorKind::ProtocolShape,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Failed { source, .. } => source.kind(),
        }
    }

    /// Returns the action this error was reported against, if it was wrapped.
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Failed { action, .. } => Some(*action),
            _ => None,
        }
    }

    /// Returns the underlying cause's message, without the action prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Failed { source, .. } => source.detail(),
            other => other.to_string(),
        }
    }

    /// Wraps this error with the action being performed.
    ///
    /// Already-wrapped errors are returned untouched.
    pub(crate) fn during(self, action: Action) -> Self {
        match self {
            Self::Failed { .. } => self,
            other => Self::Failed {
                action,
                source: Box::new(other),
            },
        }
    }

    /// Logs the failure at the operation boundary, then wraps it.
    pub(crate) fn reported(self, action: Action) -> Self {
        tracing::warn!(action = ?action, kind = %self.kind(), error = %self, "operation failed");
        self.during(action)
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, KhayalError>;

/// Reduces an upstream error body to a short, displayable message.
///
/// Google APIs wrap failures as `{"error": {"message": ...}}`; when that shape
/// is present only the message is kept.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_CHARS: usize = 500;

    let message = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| text.trim().to_string());

    if message.chars().count() > MAX_CHARS {
        let truncated: String = message.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        message
    }
}
