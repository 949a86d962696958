//! Image encoding and decoding for the Gemini API.
//!
//! Uploaded files travel to the API as base64 text tagged with a mime type,
//! and edited images come back the same way. This module converts between
//! raw files, [`EncodedImagePayload`]s, and [`DisplayResource`]s that the UI
//! can render (as `data:` URIs or decoded bytes).
//!
//! # Example
//!
//! ```ignore
//! use image_editor_core::codec::{ImageCodec, UploadedImage};
//!
//! let image = UploadedImage::from_path("cat.png")?;
//! let payload = ImageCodec::encode(&image)?;
//! let resource = ImageCodec::decode(&payload.data, &payload.mime_type);
//! assert!(resource.data_uri().starts_with("data:image/png;base64,"));
//! ```

use crate::error::{AppError, Result, ValidationError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Largest accepted upload, 4 MiB.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Image types accepted at the file input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    WebP,
}

impl ImageMime {
    /// Returns the MIME type string sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Returns the conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Parses an accepted MIME type string.
    pub fn from_mime_str(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects the type from the file signature.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the user picked, held in memory.
///
/// The size limit is not enforced here so that oversize files can still be
/// offered to the session and rejected with the proper message; see
/// [`UploadedImage::validate_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    name: String,
    bytes: Vec<u8>,
    mime: ImageMime,
}

impl UploadedImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime: ImageMime) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime,
        }
    }

    /// Builds an image from bytes and a declared mime type, as a browser or
    /// drag-and-drop source would report it.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>, mime: &str) -> Result<Self> {
        let mime = ImageMime::from_mime_str(mime)
            .or_else(|| ImageMime::from_magic_bytes(&bytes))
            .ok_or_else(|| ValidationError::UnsupportedMimeType(mime.to_string()))?;
        Ok(Self::new(name, bytes, mime))
    }

    /// Reads a file from disk, detecting its type from the extension and
    /// falling back to the file signature.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Read`] if the file cannot be read and
    /// [`ValidationError::UnsupportedMimeType`] for anything other than
    /// PNG, JPEG or WEBP.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::read(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mime = path
            .extension()
            .and_then(|ext| ImageMime::from_extension(&ext.to_string_lossy()))
            .or_else(|| ImageMime::from_magic_bytes(&bytes))
            .ok_or_else(|| ValidationError::UnsupportedMimeType(name.clone()))?;

        Ok(Self::new(name, bytes, mime))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Rejects files larger than [`MAX_IMAGE_BYTES`].
    pub fn validate_size(&self) -> std::result::Result<(), ValidationError> {
        if self.size() > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge { size: self.size() });
        }
        Ok(())
    }
}

/// Base64 text plus mime type, ready for an inline-data request part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImagePayload {
    pub data: String,
    pub mime_type: String,
}

/// An image the presentation layer can show directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayResource {
    mime_type: String,
    data: String,
}

impl DisplayResource {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload.
    pub fn payload(&self) -> &str {
        &self.data
    }

    /// Renders as `data:<mime>;base64,<payload>`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        Some(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Decodes the payload back to raw image bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| AppError::Decode(e.to_string()))
    }

    /// File extension matching the mime type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        ImageMime::from_mime_str(&self.mime_type)
            .map(|m| m.extension())
            .unwrap_or("png")
    }
}

impl fmt::Display for DisplayResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Conversions between uploads, API payloads and displayable resources.
pub struct ImageCodec;

impl ImageCodec {
    /// Encodes an uploaded image for the API.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Read`] if the content cannot be read.
    pub fn encode(image: &UploadedImage) -> Result<EncodedImagePayload> {
        Self::encode_reader(image.bytes(), image.mime().as_str())
    }

    /// Reads a source to the end and encodes it with the given mime type.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Read`] if reading fails part way.
    pub fn encode_reader<R: Read>(mut reader: R, mime_type: &str) -> Result<EncodedImagePayload> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|e| AppError::read(e.to_string()))?;

        Ok(EncodedImagePayload {
            data: BASE64.encode(&buffer),
            mime_type: mime_type.to_string(),
        })
    }

    /// Wraps a base64 payload returned by the API as a displayable resource.
    pub fn decode(data: &str, mime_type: &str) -> DisplayResource {
        DisplayResource {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        }
    }

    /// Preview resource for an uploaded image.
    pub fn preview(image: &UploadedImage) -> DisplayResource {
        DisplayResource {
            mime_type: image.mime().as_str().to_string(),
            data: BASE64.encode(image.bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk went away"))
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let image = UploadedImage::new("noise.webp", bytes.clone(), ImageMime::WebP);

        let payload = ImageCodec::encode(&image).unwrap();
        assert_eq!(payload.mime_type, "image/webp");

        let resource = ImageCodec::decode(&payload.data, &payload.mime_type);
        assert_eq!(resource.mime_type(), image.mime().as_str());
        assert_eq!(resource.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_decode_renders_data_uri() {
        let resource = ImageCodec::decode("QUJD", "image/png");
        assert_eq!(resource.data_uri(), "data:image/png;base64,QUJD");
        assert_eq!(resource.to_string(), resource.data_uri());
        assert_eq!(resource.to_bytes().unwrap(), b"ABC");
    }

    #[test]
    fn test_data_uri_parsing() {
        let resource = DisplayResource::from_data_uri("data:image/jpeg;base64,QUJD").unwrap();
        assert_eq!(resource.mime_type(), "image/jpeg");
        assert_eq!(resource.payload(), "QUJD");
        assert_eq!(resource.extension(), "jpg");

        assert!(DisplayResource::from_data_uri("blob:http://localhost/1234").is_none());
        assert!(DisplayResource::from_data_uri("data:image/png,plain").is_none());
    }

    #[test]
    fn test_encode_reader_failure_is_read_error() {
        let err = ImageCodec::encode_reader(FailingReader, "image/png").unwrap_err();
        assert!(matches!(err, AppError::Read(_)));
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let resource = ImageCodec::decode("not base64!", "image/png");
        assert!(matches!(resource.to_bytes(), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_size_limit_boundary() {
        let at_limit = UploadedImage::new("a.png", vec![0; MAX_IMAGE_BYTES], ImageMime::Png);
        assert!(at_limit.validate_size().is_ok());

        let over = UploadedImage::new("b.png", vec![0; MAX_IMAGE_BYTES + 1], ImageMime::Png);
        assert_eq!(
            over.validate_size(),
            Err(ValidationError::ImageTooLarge {
                size: MAX_IMAGE_BYTES + 1
            })
        );
    }

    #[test]
    fn test_mime_detection() {
        assert_eq!(ImageMime::from_magic_bytes(&PNG_HEADER), Some(ImageMime::Png));
        assert_eq!(ImageMime::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageMime::Jpeg));
        assert_eq!(ImageMime::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageMime::WebP));
        assert_eq!(ImageMime::from_magic_bytes(b"GIF89a"), None);

        assert_eq!(ImageMime::from_extension("JPEG"), Some(ImageMime::Jpeg));
        assert_eq!(ImageMime::from_mime_str("image/gif"), None);
    }

    #[test]
    fn test_from_bytes_rejects_unsupported_type() {
        let err = UploadedImage::from_bytes("anim.gif", b"GIF89a".to_vec(), "image/gif").unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnsupportedMimeType(_))
        ));
    }

    #[test]
    fn test_from_bytes_sniffs_when_mime_is_blank() {
        let image = UploadedImage::from_bytes("drop", PNG_HEADER.to_vec(), "").unwrap();
        assert_eq!(image.mime(), ImageMime::Png);
    }

    #[test]
    fn test_from_path_reads_and_detects() {
        let path = std::env::temp_dir().join(format!("image-editor-codec-{}.png", std::process::id()));
        std::fs::write(&path, PNG_HEADER).unwrap();

        let image = UploadedImage::from_path(&path).unwrap();
        assert_eq!(image.mime(), ImageMime::Png);
        assert_eq!(image.size(), PNG_HEADER.len());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_path_missing_file_is_read_error() {
        let err = UploadedImage::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, AppError::Read(_)));
    }
}
