//! Error types for the image-editor-core library.
//!
//! Every failure that can reach the user has a variant here, and the
//! `Display` output of each variant is the message the session shows.

use thiserror::Error;

/// Input problems caught locally, before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Submit was pressed with no image selected.
    #[error("Please upload an image first.")]
    MissingImage,

    /// The prompt is empty or whitespace only.
    #[error("Please enter an editing prompt.")]
    MissingPrompt,

    /// The selected file exceeds [`crate::codec::MAX_IMAGE_BYTES`].
    #[error("Image size should be less than 4MB")]
    ImageTooLarge {
        /// Size of the rejected file in bytes.
        size: usize,
    },

    /// The file is not PNG, JPEG or WEBP.
    #[error("Unsupported image type: {0}. Use PNG, JPEG or WEBP.")]
    UnsupportedMimeType(String),
}

/// Errors that can occur within the image-editor-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Local input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration-related errors (missing credential, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service call failed at the transport or service level.
    #[error("Failed to edit image: {0}")]
    RemoteService(String),

    /// The service answered but no part carried an image.
    #[error("The remote service did not return an image; the request may have been blocked.")]
    NoImageReturned,

    /// The uploaded file could not be read.
    #[error("Failed to read image: {0}")]
    Read(String),

    /// A base64 payload could not be decoded back to bytes.
    #[error("Failed to decode image data: {0}")]
    Decode(String),

    /// An action arrived while an edit request is still running.
    #[error("An edit is already in progress")]
    RequestInFlight,

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a remote service error with the given detail.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteService(msg.into())
    }

    /// Creates a read error with the given message.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }

    /// Returns true when the error was caught before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteService(err.to_string())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
