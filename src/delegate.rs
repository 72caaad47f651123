//! Host-facing event callbacks.
//!
//! The host implements [`SurfaceDelegate`] to observe the surface. Every
//! method has a default no-op implementation — override only what you need.
//! All callbacks arrive on the host's UI thread, re-entered from
//! [`crate::controller::SurfaceController::handle_engine_event`] or a timer
//! pump; they must not call back into the controller synchronously.

use url::Url;

use crate::engine::{ContextMenuParams, InputEventParams};
use crate::error::LoadError;

pub trait SurfaceDelegate {
    /// Loading indicator: `true` at navigation start, `false` when the load
    /// finishes or fails.
    fn notify_loading(&self, _loading: bool) {}

    /// The document finished loading.
    fn notify_loaded(&self, _url: &Url) {}

    /// The main-frame URL was committed (navigation, redirect).
    fn notify_navigated(&self, _url: &Url) {}

    /// A non-benign main-frame load failure. The only failure kind meant to
    /// reach the user, as an inline error affordance with a reload action.
    fn notify_load_error(&self, _error: &LoadError) {}

    fn notify_title_changed(&self, _title: &str) {}

    fn notify_context_menu(&self, _params: &ContextMenuParams) {}

    fn notify_input_event(&self, _event: &InputEventParams) {}
}

/// Delegate that ignores everything.
pub struct NullDelegate;

impl SurfaceDelegate for NullDelegate {}
