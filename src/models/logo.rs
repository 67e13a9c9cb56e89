//! Logo image payloads and their data URI encoding

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

/// Media type assumed when neither the host nor the bytes say otherwise
pub const DEFAULT_LOGO_MIME: &str = "image/webp";

/// Raw image as returned by the logo host
#[derive(Debug, Clone, PartialEq)]
pub struct LogoImage {
    pub data: Bytes,
    pub content_type: Option<String>,
}

impl LogoImage {
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }

    /// Media type of the image, or `None` when the payload is not an image.
    ///
    /// A declared `image/*` content type wins; otherwise the bytes are
    /// sniffed, and an undeclared payload that cannot be sniffed is assumed
    /// to be WebP.
    pub fn mime_type(&self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }

        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty());

        if let Some(ct) = &declared {
            if ct.starts_with("image/") {
                return Some(ct.clone());
            }
        }

        match image::guess_format(&self.data) {
            Ok(format) => Some(format.to_mime_type().to_string()),
            Err(_) if declared.is_none() => Some(DEFAULT_LOGO_MIME.to_string()),
            Err(_) => None,
        }
    }

    /// Encode as a self-contained `data:` URI
    pub fn to_data_uri(&self) -> Option<String> {
        let mime = self.mime_type()?;
        Some(format!("data:{};base64,{}", mime, STANDARD.encode(&self.data)))
    }
}
