//! Visibility coordination: on-canvas placement, off-canvas parking, and the
//! late-hide / show-after-emulation protocol.
//!
//! A hidden surface is parked off-canvas rather than destroyed so the
//! engine's compositing state survives and the next reveal does not flash.
//! An ordinary hide also clears the content (navigate to blank); a
//! preserve-content hide leaves it intact for the case where a host-drawn
//! placeholder (typically a screenshot) covers the area.
//!
//! Protocol (visual-zoom mode only): hide-with-preserve at `Committed` so
//! the user keeps seeing the old page during the network wait; reveal after
//! emulation is applied at `DomReady` plus a settle delay. A failure before
//! the settle elapses reveals immediately — correctness over smoothness.

use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::state::{DeviceRect, NavPhase, SurfaceState};

/// The parking spot for `bounds`: same size, shifted off-canvas.
pub fn park_rect(bounds: DeviceRect, offset_x: i32) -> DeviceRect {
    bounds.translate(euclid::default::Vector2D::new(offset_x, 0))
}

/// Host-initiated visibility change. The caller bumps the state epoch first
/// so any scheduled reveal or handoff is superseded.
pub fn apply_visibility<E: Engine>(
    state: &mut SurfaceState,
    engine: &mut E,
    session: &SessionConfig,
    visible: bool,
    preserve_content: bool,
) -> Result<(), EngineError> {
    if visible {
        // A visible surface always has positive bounds; refuse the show
        // rather than record an impossible state.
        if !state.bounds_valid() {
            warn!(bounds = ?state.bounds, "Ignoring show with degenerate bounds");
            return Ok(());
        }
        state.visible = true;
        state.pending_reveal = false;
        engine.set_placement(state.bounds)?;
        return Ok(());
    }

    state.visible = false;
    state.pending_reveal = false;
    engine.set_placement(park_rect(state.bounds, session.park_offset_x))?;
    if !preserve_content {
        engine.clear_content()?;
        state.current_url = None;
        state.phase = NavPhase::Idle;
        state.page_loaded = false;
        state.prearmed_emulation = false;
    } else {
        debug!("Surface parked with content preserved");
    }
    Ok(())
}

/// Late-hide at `Committed`: park the surface with the old content intact
/// and arm the show-after-emulation reveal. At most one reveal is pending
/// at a time; callers guard on `state.pending_reveal`.
pub fn hide_preserving<E: Engine>(
    state: &mut SurfaceState,
    engine: &mut E,
    session: &SessionConfig,
) -> Result<(), EngineError> {
    engine.set_placement(park_rect(state.bounds, session.park_offset_x))?;
    state.pending_reveal = true;
    debug!("Late-hide armed; surface parked until emulation settles");
    Ok(())
}

/// Completes a pending reveal by placing the surface back at its bounds.
/// No-op when nothing is pending or the host hid the surface meanwhile.
pub fn resolve_pending_reveal<E: Engine>(
    state: &mut SurfaceState,
    engine: &mut E,
) -> Result<(), EngineError> {
    if !state.pending_reveal {
        return Ok(());
    }
    state.pending_reveal = false;
    if state.visible && state.bounds_valid() {
        engine.set_placement(state.bounds)?;
        debug!("Surface revealed");
    }
    Ok(())
}
