//! Placement and focus handling.
//!
//! Bounds from the host are stored unconditionally but pushed to the live
//! surface only while it is actually showing — resizing a parked surface is
//! pointless jank. A bounds change under a loaded page re-triggers the
//! emulation math, since the viewport computation depends on physical size.
//!
//! Focus handoff after an emulation change is ordered: focus the host,
//! wait a short delay, focus the surface. Focusing the surface directly
//! could steal focus mid a host-initiated transition (e.g. while a dialog
//! is being dismissed).

use std::time::Instant;

use tracing::debug;

use crate::config::Config;
use crate::emulation;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::state::{DeviceRect, SurfaceState};
use crate::timers::{TimerAction, Timers};

/// Stores `rect` and applies it to the surface when legal to do so.
pub fn set_bounds<E: Engine>(
    state: &mut SurfaceState,
    engine: &mut E,
    config: &Config,
    rect: DeviceRect,
) -> Result<(), EngineError> {
    state.bounds = rect;

    // Mid-reveal the surface is parked even though the host considers it
    // visible; placing it now would flash the half-settled page.
    if state.visible && !state.pending_reveal && state.bounds_valid() {
        engine.set_placement(rect)?;
    } else {
        debug!(bounds = ?rect, "Bounds stored, application deferred");
    }

    if state.page_loaded {
        emulation::sync(state, engine, &config.emulation)?;
    }
    Ok(())
}

/// Starts the ordered focus handoff: host now, surface after the delay.
/// The second half runs through the timer pump and dies with the epoch if a
/// navigation or hide supersedes it.
pub fn begin_focus_handoff<E: Engine>(
    engine: &mut E,
    timers: &mut Timers,
    config: &Config,
    epoch: u64,
    now: Instant,
) {
    engine.focus_host();
    timers.schedule(
        now,
        config.timing.focus_handoff_delay(),
        epoch,
        TimerAction::FocusSurface,
    );
}
