//! Input-routing recovery.
//!
//! In CSS-zoom mode the embedding engine can silently stop delivering input
//! and touch events to the surface after a subsequent navigation. The only
//! reliable fix observed is destructive: tear the surface down and rebuild
//! it with an identical session profile before the navigation starts.
//! Device-emulation mode has a working input path of its own and is never
//! recreated. Both conditions are empirical and configurable
//! ([`crate::config::RecoveryPolicy`]).
//!
//! When recreation did not run, a best-effort nudge runs shortly after
//! `DomReady`: blur to the host, refocus the surface, perturb the bounds by
//! one unit and restore them, then ask the content to re-register its input
//! listeners. A heuristic, not a guarantee; failures are logged, never
//! surfaced.

use tracing::{debug, info, warn};

use crate::config::{RecoveryPolicy, SessionConfig};
use crate::engine::{Engine, EngineFactory, SessionProfile};
use crate::error::EngineError;
use crate::state::{NavPhase, SurfaceSettings, SurfaceState};
use crate::visibility;

/// What to do before the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Keep the current surface (emulation mode, or nothing loaded yet).
    Preserve,
    /// Tear down and rebuild the surface before navigating.
    Recreate,
}

/// Selects the strategy from settings alone. Never recreates on the first
/// navigation — there is no broken input routing to recover from.
pub fn strategy_for(
    settings: &SurfaceSettings,
    page_loaded: bool,
    policy: &RecoveryPolicy,
) -> RecoveryStrategy {
    if !settings.visual_zoom && page_loaded && policy.recreate_in_css_zoom {
        RecoveryStrategy::Recreate
    } else {
        RecoveryStrategy::Preserve
    }
}

/// Destroys the surface in `slot` and builds a fresh one with the same
/// profile, restoring placement, visibility and mute state from
/// `SurfaceState`. On failure the slot is left empty; the caller reports
/// "not ready" on subsequent commands rather than erroring.
pub fn recreate<F: EngineFactory>(
    factory: &mut F,
    profile: &SessionProfile,
    slot: &mut Option<F::Handle>,
    state: &mut SurfaceState,
    session: &SessionConfig,
) -> Result<(), EngineError> {
    if let Some(mut old) = slot.take() {
        old.destroy();
    }

    let mut fresh = factory.create(profile)?;

    // The fresh handle has engine-default zoom; resend before the caller
    // issues the navigation this recreation was performed for.
    if let Err(e) = fresh.set_zoom_factor(state.settings.zoom_factor) {
        warn!(error = %e, "Could not restore zoom factor on recreated surface");
    }
    if let Err(e) = fresh.set_css_zoom(state.css_zoom_level) {
        warn!(error = %e, "Could not restore zoom level on recreated surface");
    }
    fresh.set_audio_muted(state.audio_muted);
    let placement = if state.visible && state.bounds_valid() {
        state.bounds
    } else {
        visibility::park_rect(state.bounds, session.park_offset_x)
    };
    if let Err(e) = fresh.set_placement(placement) {
        warn!(error = %e, "Could not restore placement on recreated surface");
    }

    state.page_loaded = false;
    state.phase = NavPhase::Idle;
    state.pending_reveal = false;
    state.prearmed_emulation = false;
    state.recovered_before_nav = true;
    state.bump_epoch();

    *slot = Some(fresh);
    info!("Surface recreated for input-routing recovery");
    Ok(())
}

/// Best-effort input re-routing for the path where recreation did not run.
pub fn nudge<E: Engine>(state: &SurfaceState, engine: &mut E) {
    debug!("Running post-load input nudge");
    engine.focus_host();
    engine.focus();

    // Perturb-and-restore by one unit forces the engine to re-route input.
    if state.visible && state.bounds_valid() {
        let perturbed = state
            .bounds
            .translate(euclid::default::Vector2D::new(1, 0));
        if let Err(e) = engine.set_placement(perturbed) {
            warn!(error = %e, "Input nudge perturbation failed");
        }
        if let Err(e) = engine.set_placement(state.bounds) {
            warn!(error = %e, "Input nudge restore failed");
        }
    }

    engine.reinstall_input_listeners();
}
