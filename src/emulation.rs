//! Viewport emulation math and the single guarded engine call.
//!
//! Pinch zoom is emulated by presenting the content against a virtual
//! viewport size and scale decoupled from the physical surface size.
//! [`compute`] is a pure function of [`SurfaceState`] and policy; the only
//! side effect in this module is the one `apply`/`clear` call [`sync`]
//! issues against the engine's device-metrics primitive.
//!
//! The guard matters: invoking the primitive on a surface that has never
//! produced a live document is fatal in the underlying engine. A skipped
//! sync is a debug-logged no-op, never an error.

use tracing::debug;

use crate::config::EmulationPolicy;
use crate::engine::Engine;
use crate::state::SurfaceState;

/// Device-metrics override sent to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EmulationParams {
    /// Logical viewport width, CSS pixels.
    pub width: i32,
    /// Logical viewport height, CSS pixels.
    pub height: i32,
    /// Page scale applied on top of the viewport.
    pub scale: f64,
    /// Mobile device emulation (touch metrics, meta-viewport handling).
    pub mobile: bool,
}

/// Outcome of the pure computation.
#[derive(Debug, Clone, PartialEq)]
pub enum EmulationDecision {
    /// Override the metrics with these parameters.
    Apply(EmulationParams),
    /// Visual zoom is off: remove any active override.
    Clear,
    /// Precondition not met; touch nothing.
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Bounds have no positive area; viewport math would be nonsense.
    InvalidBounds,
    /// No document has loaded and emulation was not pre-armed.
    NotLoaded,
}

/// Computes the emulation decision for the current state.
///
/// Desktop mode: `scale = zoom_factor`; above 1.0 the viewport is shrunk
/// proportionally instead of letting content overflow the surface.
///
/// Mobile mode: fixed logical viewport `min(mobile_viewport_max, width)`,
/// scaled so the layout fills the physical width; when the effective scale
/// would push content past the physical width, the viewport is shrunk so the
/// recomputed scale again exactly spans it.
pub fn compute(state: &SurfaceState, policy: &EmulationPolicy) -> EmulationDecision {
    if !state.bounds_valid() {
        return EmulationDecision::Skip(SkipReason::InvalidBounds);
    }
    if !state.page_loaded && !state.prearmed_emulation {
        return EmulationDecision::Skip(SkipReason::NotLoaded);
    }
    if !state.settings.visual_zoom {
        return EmulationDecision::Clear;
    }

    let physical_width = state.bounds.size.width;
    let physical_height = state.bounds.size.height;
    let zoom = state.settings.zoom_factor;

    if state.settings.mobile_mode {
        let viewport_width = policy.mobile_viewport_max.min(physical_width);
        let base_scale = physical_width as f64 / viewport_width as f64;
        let effective_scale = base_scale * zoom;
        let critical_scale = physical_width as f64 / viewport_width as f64;

        if effective_scale > critical_scale {
            // Content would overflow the physical width: shrink the viewport
            // and recompute the scale so it exactly spans it again.
            let new_width = (physical_width as f64 / effective_scale).round() as i32;
            let new_height = (physical_height as f64 / effective_scale).round() as i32;
            let new_width = new_width.max(1);
            EmulationDecision::Apply(EmulationParams {
                width: new_width,
                height: new_height.max(1),
                scale: physical_width as f64 / new_width as f64,
                mobile: true,
            })
        } else {
            EmulationDecision::Apply(EmulationParams {
                width: viewport_width,
                height: (physical_height as f64 / base_scale).round() as i32,
                scale: effective_scale,
                mobile: true,
            })
        }
    } else if zoom > 1.0 {
        EmulationDecision::Apply(EmulationParams {
            width: ((physical_width as f64 / zoom).round() as i32).max(1),
            height: ((physical_height as f64 / zoom).round() as i32).max(1),
            scale: zoom,
            mobile: false,
        })
    } else {
        EmulationDecision::Apply(EmulationParams {
            width: physical_width,
            height: physical_height,
            scale: zoom,
            mobile: false,
        })
    }
}

/// Applies the computed decision to the engine. Returns `true` when an
/// engine call was issued (apply or clear), `false` on skip.
pub fn sync<E: Engine>(
    state: &SurfaceState,
    engine: &mut E,
    policy: &EmulationPolicy,
) -> Result<bool, crate::error::EngineError> {
    match compute(state, policy) {
        EmulationDecision::Apply(params) => {
            debug!(
                width = params.width,
                height = params.height,
                scale = params.scale,
                mobile = params.mobile,
                "Applying viewport emulation"
            );
            engine.apply_emulation(&params)?;
            Ok(true)
        }
        EmulationDecision::Clear => {
            debug!("Clearing viewport emulation");
            engine.clear_emulation()?;
            Ok(true)
        }
        EmulationDecision::Skip(reason) => {
            debug!(?reason, "Emulation skipped");
            Ok(false)
        }
    }
}
