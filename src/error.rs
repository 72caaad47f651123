//! Error taxonomy for the surface controller.
//!
//! Engine-level faults never cross the host boundary as panics: every public
//! command catches [`EngineError`] and degrades to a `bool`/`None` result
//! plus a logged diagnostic. The only failure the host is expected to show
//! the user is [`LoadError`] (a non-benign main-frame load failure).

use thiserror::Error;

/// Faults raised by the embedding engine or by commands issued against it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No live engine handle — typically after a failed surface recreation.
    /// Commands must detect this and return a structured "not ready" result.
    #[error("surface engine is not ready")]
    NotReady,

    /// The handle was destroyed while a command was in flight. Commands
    /// against a destroyed handle fail silently rather than erroring upward.
    #[error("surface engine was destroyed")]
    Destroyed,

    /// Opaque failure reported by the engine backend.
    #[error("engine backend failure: {0}")]
    Backend(String),
}

/// Host-facing payload for a non-benign main-frame load failure.
///
/// Subresource failures (ads, trackers, embedded media) are never promoted
/// to this type — conflating them would show spurious error UI on pages
/// that render correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub code: i32,
    pub description: String,
    pub url: String,
}

/// Chromium-embedder convention: a load superseded by a newer navigation.
pub const ERR_ABORTED: i32 = -3;

/// Returns `true` for abort-class codes: the navigation was superseded by a
/// newer one. These are swallowed, never reported to the host.
pub fn is_benign_abort(code: i32) -> bool {
    matches!(code, 0 | ERR_ABORTED)
}
