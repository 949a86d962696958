//! Desktop window for the image editor.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Events sent from the edit worker to the window thread
//! - [`rendering`]: Preview textures, layout and the error banner
//! - [`editor`]: Main application logic
//!
//! The window thread owns the [`Session`](crate::session::Session). Edits run
//! on a worker thread and report back over a channel that is drained once per
//! frame, so the session is only ever touched from one thread.
//!
//! # Usage
//!
//! ```ignore
//! use image_editor_core::{ui, Config};
//!
//! let config = Config::load()?;
//! ui::run_editor_ui(config)?;
//! ```

mod editor;
mod rendering;
mod state;

// Public API exports
pub use editor::ImageEditorApp;
pub use rendering::{decode_preview, fit_size};

use crate::config::Config;
use crate::error::Result;

/// Opens the editor window and returns when the user closes it.
///
/// # Arguments
/// * `config` - Application configuration with API key and model
///
/// # Errors
/// Returns [`AppError::Ui`](crate::error::AppError::Ui) if the window cannot
/// be created.
pub fn run_editor_ui(config: Config) -> Result<()> {
    editor::run(config)
}
