//! Core types for image generation and editing.

use crate::encode;
use crate::error::{KhayalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shown when a source image cannot be read.
const UNREADABLE_IMAGE: &str = "فشل في قراءة ملف الصورة.";
/// Shown when the selected file is not an image.
const NOT_AN_IMAGE: &str = "الرجاء اختيار ملف صورة صالح.";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard landscape.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait.
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// All accepted ratios, in display order.
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::Landscape,
        Self::Portrait,
        Self::Standard,
        Self::StandardPortrait,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }

    /// Arabic label for pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Square => "مربع (1:1)",
            Self::Landscape => "عرضي (16:9)",
            Self::Portrait => "طولي (9:16)",
            Self::Standard => "أفقي (4:3)",
            Self::StandardPortrait => "عمودي (3:4)",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = KhayalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| KhayalError::InvalidInput(format!("نسبة العرض إلى الارتفاع غير مدعومة: {s}")))
    }
}

/// An image supplied by the user for editing, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Base64 payload without a data URI header.
    pub base64: String,
    /// MIME type, always `image/*`.
    pub mime_type: String,
}

impl SourceImage {
    /// Encodes raw bytes, rejecting non-image MIME types.
    pub fn from_bytes(data: &[u8], mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(KhayalError::InvalidInput(NOT_AN_IMAGE.into()));
        }
        Ok(Self {
            base64: encode::encode_base64(data),
            mime_type,
        })
    }

    /// Reads and encodes an image file.
    ///
    /// The MIME type comes from the file's magic bytes, then its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "failed to read source image");
            KhayalError::InvalidInput(UNREADABLE_IMAGE.into())
        })?;

        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });

        match format {
            Some(format) => Self::from_bytes(&data, format.mime_type()),
            None => Err(KhayalError::InvalidInput(NOT_AN_IMAGE.into())),
        }
    }

    /// Parses a `data:image/...;base64,` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let mime_type = encode::data_uri_mime_type(uri)
            .ok_or_else(|| KhayalError::InvalidInput(NOT_AN_IMAGE.into()))?;
        if !mime_type.starts_with("image/") {
            return Err(KhayalError::InvalidInput(NOT_AN_IMAGE.into()));
        }
        Ok(Self {
            base64: encode::strip_data_uri_header(uri).to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    /// Returns the image as a data URI.
    pub fn to_data_uri(&self) -> String {
        encode::data_uri(&self.mime_type, &self.base64)
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A generated image, held as the base64 payload returned upstream.
#[derive(Debug, Clone)]
#[must_use = "generated image should be displayed or saved"]
pub struct GeneratedImage {
    /// Base64 payload exactly as returned by the service.
    pub base64: String,
    /// MIME type reported for the payload.
    pub mime_type: String,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(
        base64: impl Into<String>,
        mime_type: impl Into<String>,
        metadata: GenerationMetadata,
    ) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Returns the image as a data URI.
    pub fn to_data_uri(&self) -> String {
        encode::data_uri(&self.mime_type, &self.base64)
    }

    /// Decodes the payload to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        encode::decode_base64(&self.base64)
    }

    /// Returns the format implied by the MIME type.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Saves the decoded image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}
