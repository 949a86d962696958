//! Image Editor Core Library
//!
//! This library edits images with natural-language instructions using
//! Google's Gemini image models.
//!
//! # Overview
//!
//! A user picks an image, describes an edit in plain English, and gets back
//! the image the model produced. The library handles:
//!
//! - **Encoding**: Uploads to base64 payloads and back via [`codec`]
//! - **AI Integration**: The Gemini `generateContent` call via [`gemini`]
//! - **Edit Cycle**: Validation, the call, and result extraction via [`pipeline`]
//! - **Interaction State**: What the window shows and when via [`session`]
//! - **User Interface**: The desktop editor window via [`ui`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`ImageEditor`] facade:
//!
//! ```ignore
//! use image_editor_core::ImageEditor;
//!
//! let editor = ImageEditor::new()?;
//!
//! // Headless: edit one file
//! let edited = editor.edit_file("cat.png", "add a party hat").await?;
//! println!("{}", edited.mime_type());
//!
//! // Or open the editor window
//! editor.run_interactive()?;
//! ```
//!
//! # Module Structure
//!
//! - [`codec`]: Image payload encoding and display resources
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`gemini`]: Gemini API client and the service trait
//! - [`pipeline`]: One complete edit request
//! - [`session`]: Interaction state machine
//! - [`ui`]: User interface components

pub mod codec;
pub mod config;
pub mod error;
pub mod gemini;
pub mod pipeline;
pub mod session;
pub mod ui;

// Re-export primary types for convenience
pub use codec::{DisplayResource, ImageCodec, UploadedImage};
pub use config::Config;
pub use error::{AppError, Result, ValidationError};
pub use gemini::{GeminiClient, ImageEditService};
pub use pipeline::EditPipeline;
pub use session::Session;

use std::path::Path;
use std::sync::Arc;

/// Main entry point for the image editor.
///
/// This struct provides a facade over configuration and the edit pipeline.
/// It's the recommended way to use the library for most use cases.
pub struct ImageEditor {
    config: Config,
    pipeline: EditPipeline,
}

impl ImageEditor {
    /// Creates a new editor with configuration from the environment.
    ///
    /// A missing API key is not reported here; the first edit fails with
    /// [`AppError::Config`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Creates an editor with custom configuration.
    ///
    /// Use this when you need to override environment-based configuration,
    /// such as specifying a different model or API key.
    pub fn with_config(config: Config) -> Self {
        let pipeline = EditPipeline::new(Arc::new(GeminiClient::new(&config)));
        Self { config, pipeline }
    }

    /// Creates an editor that talks to a custom service.
    pub fn with_service(config: Config, service: Arc<dyn ImageEditService>) -> Self {
        Self {
            config,
            pipeline: EditPipeline::new(service),
        }
    }

    /// Runs one edit on an image file, using the same session rules as the
    /// window (size limit, prompt check).
    ///
    /// # Errors
    ///
    /// Returns the error the window would show, e.g. [`AppError::Read`] for
    /// an unreadable file or [`AppError::NoImageReturned`] for a blocked
    /// prompt.
    pub async fn edit_file(&self, path: impl AsRef<Path>, prompt: &str) -> Result<DisplayResource> {
        let mut session = Session::new();
        session.select_image(UploadedImage::from_path(path)?)?;
        session.set_prompt(prompt)?;
        session.submit_and_wait(&self.pipeline).await
    }

    /// Opens the editor window and blocks until it is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn run_interactive(&self) -> Result<()> {
        ui::run_editor_ui(self.config.clone())
    }

    /// Returns the edit pipeline.
    pub fn pipeline(&self) -> &EditPipeline {
        &self.pipeline
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    ///
    /// Changes apply to the window opened by [`ImageEditor::run_interactive`];
    /// rebuild with [`ImageEditor::with_config`] for headless edits.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{ScriptedService, png_part};

    fn temp_image(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("image-editor-{}-{}", std::process::id(), name));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_edit_file_with_scripted_service() {
        let service = ScriptedService::replying(vec![png_part("QUJD")]);
        let editor = ImageEditor::with_service(Config::builder().build().unwrap(), service.clone());
        let path = temp_image("hat.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]);

        let edited = editor.edit_file(&path, "add a hat").await.unwrap();
        assert_eq!(edited.data_uri(), "data:image/png;base64,QUJD");
        assert_eq!(service.last_request().unwrap().image.mime_type, "image/jpeg");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_edit_file_oversize_makes_no_call() {
        let service = ScriptedService::replying(vec![png_part("QUJD")]);
        let editor = ImageEditor::with_service(Config::builder().build().unwrap(), service.clone());
        let path = temp_image("huge.png", &vec![0u8; 5 * 1024 * 1024]);

        let err = editor.edit_file(&path, "add a hat").await.unwrap_err();
        assert_eq!(err.to_string(), "Image size should be less than 4MB");
        assert_eq!(service.calls(), 0);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_credential_surfaces_on_first_edit() {
        let editor = ImageEditor::with_config(Config::builder().build().unwrap());
        let path = temp_image("nokey.png", &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

        let err = editor.edit_file(&path, "add a hat").await.unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: credential not set");

        std::fs::remove_file(&path).unwrap();
    }
}
