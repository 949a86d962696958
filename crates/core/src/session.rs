//! Editing session state machine.
//!
//! The session owns everything the window shows: the selected image and its
//! preview, the edited preview, the prompt, whether a request is running, and
//! the current error. State lives in a single [`SessionState`] enum so that
//! combinations such as "in flight with an error showing" cannot be built.
//!
//! ```text
//! Idle ──select──> ImageSelected ──submit──> Submitting ──ok──> Succeeded
//!   │                    │                       └──err──> Failed
//!   └──invalid action────┴──────────────> Failed ──select/submit──> ...
//! ```
//!
//! Every state except `Submitting` accepts `select_image`, `set_prompt` and
//! `submit`. While submitting, those actions return
//! [`AppError::RequestInFlight`] and change nothing.

use crate::codec::{DisplayResource, ImageCodec, UploadedImage};
use crate::error::{AppError, Result, ValidationError};
use crate::pipeline::{EditPipeline, EditResult};

/// An accepted upload together with its preview resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub image: UploadedImage,
    pub preview: DisplayResource,
}

impl SelectedImage {
    fn new(image: UploadedImage) -> Self {
        let preview = ImageCodec::preview(&image);
        Self { image, preview }
    }
}

/// Current state of the editing session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing selected yet.
    #[default]
    Idle,
    /// An image is ready to edit.
    ImageSelected { selected: SelectedImage },
    /// A request is running for `selected`.
    Submitting { selected: SelectedImage },
    /// The last request produced `edited`.
    Succeeded {
        selected: SelectedImage,
        edited: DisplayResource,
    },
    /// The last action failed. Whatever was on screen before stays.
    Failed {
        selected: Option<SelectedImage>,
        edited: Option<DisplayResource>,
        message: String,
    },
}

/// Fieldless view of [`SessionState`] for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    ImageSelected,
    Submitting,
    Succeeded,
    Failed,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Idle => SessionStatus::Idle,
            Self::ImageSelected { .. } => SessionStatus::ImageSelected,
            Self::Submitting { .. } => SessionStatus::Submitting,
            Self::Succeeded { .. } => SessionStatus::Succeeded,
            Self::Failed { .. } => SessionStatus::Failed,
        }
    }

    fn selected(&self) -> Option<&SelectedImage> {
        match self {
            Self::Idle => None,
            Self::ImageSelected { selected }
            | Self::Submitting { selected }
            | Self::Succeeded { selected, .. } => Some(selected),
            Self::Failed { selected, .. } => selected.as_ref(),
        }
    }

    fn edited(&self) -> Option<&DisplayResource> {
        match self {
            Self::Succeeded { edited, .. } => Some(edited),
            Self::Failed { edited, .. } => edited.as_ref(),
            _ => None,
        }
    }

    /// Moves to `Failed`, keeping whatever image and edited preview were showing.
    fn into_failed(self, message: String) -> Self {
        match self {
            Self::Idle => Self::Failed {
                selected: None,
                edited: None,
                message,
            },
            Self::ImageSelected { selected } | Self::Submitting { selected } => Self::Failed {
                selected: Some(selected),
                edited: None,
                message,
            },
            Self::Succeeded { selected, edited } => Self::Failed {
                selected: Some(selected),
                edited: Some(edited),
                message,
            },
            Self::Failed { selected, edited, .. } => Self::Failed {
                selected,
                edited,
                message,
            },
        }
    }
}

/// Work handed out by [`Session::submit`], to run off the control thread.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub image: UploadedImage,
    pub prompt: String,
}

impl PendingEdit {
    /// Runs the edit through `pipeline`. The result goes back to
    /// [`Session::complete`].
    pub async fn run(&self, pipeline: &EditPipeline) -> EditResult {
        pipeline.submit(Some(&self.image), &self.prompt).await
    }
}

/// The interaction state machine.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    prompt: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.state.selected().map(|s| &s.image)
    }

    pub fn original_preview(&self) -> Option<&DisplayResource> {
        self.state.selected().map(|s| &s.preview)
    }

    pub fn edited_preview(&self) -> Option<&DisplayResource> {
        self.state.edited()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SessionState::Submitting { .. })
    }

    /// Whether the window should enable its submit control.
    pub fn can_submit(&self) -> bool {
        !self.is_in_flight() && self.image().is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_in_flight() {
            tracing::warn!("action ignored while an edit is in flight");
            return Err(AppError::RequestInFlight);
        }
        Ok(())
    }

    fn fail(&mut self, message: String) {
        let state = std::mem::take(&mut self.state);
        self.state = state.into_failed(message);
    }

    /// Selects a new image.
    ///
    /// An oversize file moves the session to `Failed` and leaves the previous
    /// image and previews in place; the rejection is also returned.
    pub fn select_image(&mut self, image: UploadedImage) -> Result<()> {
        self.ensure_idle()?;

        if let Err(err) = image.validate_size() {
            tracing::debug!(file = %image.name(), bytes = image.size(), "rejected oversize image");
            self.fail(err.to_string());
            return Err(err.into());
        }

        tracing::debug!(file = %image.name(), bytes = image.size(), mime = %image.mime(), "image selected");
        self.state = SessionState::ImageSelected {
            selected: SelectedImage::new(image),
        };
        Ok(())
    }

    /// Records a failure that happened before an image could be offered,
    /// such as an unreadable or unsupported file.
    pub fn reject_selection(&mut self, err: &AppError) -> Result<()> {
        self.ensure_idle()?;
        self.fail(err.to_string());
        Ok(())
    }

    /// Stores the prompt verbatim.
    pub fn set_prompt(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_idle()?;
        self.prompt = text.into();
        Ok(())
    }

    /// Starts an edit.
    ///
    /// On success the session is `Submitting` and the returned work must be
    /// run and fed back through [`Session::complete`]. Validation failures
    /// move the session to `Failed` and no work is handed out.
    pub fn submit(&mut self) -> Result<PendingEdit> {
        self.ensure_idle()?;

        let validation = match self.state.selected() {
            None => Err(ValidationError::MissingImage),
            Some(_) if self.prompt.trim().is_empty() => Err(ValidationError::MissingPrompt),
            Some(selected) => Ok(selected.clone()),
        };

        let selected = match validation {
            Ok(selected) => selected,
            Err(err) => {
                self.fail(err.to_string());
                return Err(err.into());
            }
        };

        let pending = PendingEdit {
            image: selected.image.clone(),
            prompt: self.prompt.clone(),
        };
        // Clears the error and the previous edited preview
        self.state = SessionState::Submitting { selected };
        Ok(pending)
    }

    /// Applies the outcome of the running edit.
    ///
    /// Outcomes that arrive when no edit is running are dropped.
    pub fn complete(&mut self, result: &EditResult) {
        let state = std::mem::take(&mut self.state);
        self.state = match (state, result) {
            (SessionState::Submitting { selected }, Ok(edited)) => SessionState::Succeeded {
                selected,
                edited: edited.clone(),
            },
            (SessionState::Submitting { selected }, Err(err)) => {
                tracing::debug!(error = %err, "edit failed");
                SessionState::Failed {
                    selected: Some(selected),
                    edited: None,
                    message: err.to_string(),
                }
            }
            (other, _) => {
                tracing::warn!(status = ?other.status(), "dropping edit outcome with no request in flight");
                other
            }
        };
    }

    /// Submits and awaits the edit in one step, for callers that own the
    /// session across the await.
    pub async fn submit_and_wait(&mut self, pipeline: &EditPipeline) -> EditResult {
        let pending = self.submit()?;
        let result = pending.run(pipeline).await;
        self.complete(&result);
        result
    }
}
