//! Base64 payload helpers and data URIs.

use crate::error::{KhayalError, Result};
use base64::Engine;

/// Encodes raw bytes as standard base64.
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Accepts a `data:<mime>;base64,` header, embedded whitespace and missing
/// padding.
pub fn decode_base64(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = strip_data_uri_header(input)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(&cleaned)
        .map_err(|e| KhayalError::Decode(e.to_string()))
}

/// Builds a `data:` URI from a MIME type and an already-encoded payload.
///
/// The payload is embedded unchanged.
pub fn data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{mime_type};base64,{base64_data}")
}

/// Encodes bytes straight into a `data:` URI.
pub fn bytes_to_data_uri(mime_type: &str, data: &[u8]) -> String {
    data_uri(mime_type, &encode_base64(data))
}

/// Returns the payload after the first comma of a `data:` URI.
///
/// Input without a header is returned as-is.
pub fn strip_data_uri_header(input: &str) -> &str {
    if input.starts_with("data:") {
        input.split_once(',').map_or(input, |(_, payload)| payload)
    } else {
        input
    }
}

/// Extracts the MIME type from a `data:` URI header.
pub fn data_uri_mime_type(input: &str) -> Option<&str> {
    let header = input.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}
