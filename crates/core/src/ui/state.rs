//! Events passed from the edit worker back to the window thread.

use crate::pipeline::EditResult;

/// Sent through a channel from the background edit task to the UI thread,
/// which applies it to the session.
pub(crate) enum EditEvent {
    /// The pipeline finished, with an image or an error.
    Finished(EditResult),
    /// The worker could not start its async runtime.
    WorkerFailed(String),
}
