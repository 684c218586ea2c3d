//! Image input for chat messages
//!
//! Turns an image file picked by the user into a data URL, the form in which
//! images are stored in sessions and sent to the generation endpoint.

use crate::error::HcChatError;
use base64::Engine;
use image::GenericImageView;
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
        }
    }

    /// Detect the format from the leading magic bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use hcchat::image_input::ImageFormat;
    ///
    /// assert_eq!(ImageFormat::sniff(b"\x89PNG\r\n\x1a\n"), Some(ImageFormat::Png));
    /// assert_eq!(ImageFormat::sniff(b"hello"), None);
    /// ```
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(b"\xff\xd8\xff") {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.starts_with(b"BM") {
            Some(ImageFormat::Bmp)
        } else if bytes.starts_with(b"II\x2a\x00") || bytes.starts_with(b"MM\x00\x2a") {
            Some(ImageFormat::Tiff)
        } else {
            None
        }
    }
}

/// Encode raw image bytes as a data URL
///
/// # Errors
///
/// Returns `HcChatError::Image` when the bytes are not a supported image
pub fn encode_data_url(bytes: &[u8]) -> Result<String, HcChatError> {
    let format = ImageFormat::sniff(bytes)
        .ok_or_else(|| HcChatError::Image("unsupported image format".to_string()))?;

    let image = image::load_from_memory(bytes)
        .map_err(|e| HcChatError::Image(format!("image decoding failed: {}", e)))?;
    let (width, height) = image.dimensions();
    tracing::debug!(
        "Encoding {} image {}x{} ({} bytes)",
        format.mime_type(),
        width,
        height,
        bytes.len()
    );

    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", format.mime_type(), payload))
}

/// Read an image file and return it as a data URL
///
/// # Errors
///
/// Returns `HcChatError::Io` if the file cannot be read and
/// `HcChatError::Image` if it is not a supported image
pub async fn read_image_as_data_url(path: &Path) -> Result<String, HcChatError> {
    let bytes = tokio::fs::read(path).await?;
    encode_data_url(&bytes)
}

/// Parsed header of a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrlInfo {
    /// MIME type from the header
    pub mime: String,
    /// Decoded payload size in bytes
    pub size: usize,
}

/// Inspect a data URL without decoding the payload
///
/// Returns `None` for strings that are not base64 data URLs.
pub fn describe_data_url(data_url: &str) -> Option<DataUrlInfo> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
    let size = ((payload.len() / 4) * 3).saturating_sub(padding.min(2));
    Some(DataUrlInfo {
        mime: mime.to_string(),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, create_test_png, temp_dir};

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageFormat::sniff(b"\xff\xd8\xff\xe0"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a..."), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::sniff(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::sniff(b"BM\x00\x00"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::sniff(b"II\x2a\x00"), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::sniff(b""), None);
    }

    #[tokio::test]
    async fn test_read_image_as_data_url_png() {
        let dir = temp_dir();
        let path = create_test_png(&dir, "scan.png");

        let data_url = read_image_as_data_url(&path).await.unwrap();
        assert!(data_url.starts_with("data:image/png;base64,iVBOR"));

        let info = describe_data_url(&data_url).unwrap();
        assert_eq!(info.mime, "image/png");
        assert_eq!(info.size as u64, std::fs::metadata(&path).unwrap().len());
    }

    #[tokio::test]
    async fn test_read_image_rejects_non_image() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "notes.png", "definitely text");

        let err = read_image_as_data_url(&path).await.unwrap_err();
        assert!(matches!(err, HcChatError::Image(_)));
    }

    #[tokio::test]
    async fn test_read_image_rejects_truncated_png() {
        let dir = temp_dir();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();

        let err = read_image_as_data_url(&path).await.unwrap_err();
        assert!(matches!(err, HcChatError::Image(_)));
    }

    #[tokio::test]
    async fn test_read_image_missing_file_is_io_error() {
        let err = read_image_as_data_url(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, HcChatError::Io(_)));
    }

    #[test]
    fn test_describe_data_url_rejects_plain_text() {
        assert!(describe_data_url("hello").is_none());
        assert!(describe_data_url("data:text/plain,hello").is_none());
    }

    #[test]
    fn test_describe_data_url_accounts_for_padding() {
        // "a" -> "YQ=="
        let info = describe_data_url("data:image/png;base64,YQ==").unwrap();
        assert_eq!(info.size, 1);
    }
}
