//! Surface state model.
//!
//! One [`SurfaceState`] exists per host window, exclusively owned by
//! [`crate::controller::SurfaceController`]. The per-navigation lifecycle is
//! an explicit [`NavPhase`] enum; what an operation may legally do derives
//! from the phase plus the small orthogonal [`SurfaceSettings`] set, never
//! from ad hoc flag combinations.
//!
//! Timer-visible mutations (navigation start, hide, recreation) bump the
//! state `epoch`; a scheduled action whose captured epoch no longer matches
//! is stale and must not act (see [`crate::timers`]).

use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Physical placement rectangle within the host window, in device pixels.
pub type DeviceRect = euclid::default::Rect<i32>;
/// Physical size in device pixels.
pub type DeviceSize = euclid::default::Size2D<i32>;

/// Shorthand constructor for a [`DeviceRect`].
pub fn device_rect(x: i32, y: i32, width: i32, height: i32) -> DeviceRect {
    DeviceRect::new(
        euclid::default::Point2D::new(x, y),
        DeviceSize::new(width, height),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Zoom scale
// ─────────────────────────────────────────────────────────────────────────────

/// Keyboard zoom factor range accepted by the engine.
pub const ZOOM_FACTOR_MIN: f64 = 0.25;
pub const ZOOM_FACTOR_MAX: f64 = 5.0;

/// CSS zoom level range the engine's zoom primitive accepts.
/// One level step corresponds to a 0.1 change in zoom factor.
pub const CSS_ZOOM_LEVEL_MIN: f64 = -6.0;
pub const CSS_ZOOM_LEVEL_MAX: f64 = 40.0;

const CSS_ZOOM_STEP: f64 = 0.1;

/// Maps a keyboard zoom factor to the engine's CSS zoom level scale.
/// The factor is clamped to its valid range first.
pub fn css_zoom_level_for(factor: f64) -> f64 {
    (factor.clamp(ZOOM_FACTOR_MIN, ZOOM_FACTOR_MAX) - 1.0) / CSS_ZOOM_STEP
}

/// Inverse of [`css_zoom_level_for`]: the factor a CSS zoom level denotes.
/// The level is clamped to the engine's accepted range first.
pub fn zoom_factor_for_level(level: f64) -> f64 {
    1.0 + level.clamp(CSS_ZOOM_LEVEL_MIN, CSS_ZOOM_LEVEL_MAX) * CSS_ZOOM_STEP
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation phase
// ─────────────────────────────────────────────────────────────────────────────

/// Per-navigation lifecycle phase.
///
/// Engine events drive `Idle → Started → Committed → DomReady → Finished`;
/// `Failed` is reachable from `Started`, `Committed` and `DomReady` for
/// non-benign failures, while benign aborts return the machine to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NavPhase {
    Idle,
    Started,
    Committed,
    DomReady,
    Finished,
    Failed,
}

impl NavPhase {
    /// `DomReady` is the earliest point at which the document is live, and
    /// therefore the earliest safe point for emulation and content messaging.
    pub fn dom_is_live(self) -> bool {
        matches!(self, NavPhase::DomReady | NavPhase::Finished)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Orthogonal presentation settings, independent of navigation phase.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSettings {
    /// Keyboard zoom factor, always within [`ZOOM_FACTOR_MIN`]..[`ZOOM_FACTOR_MAX`].
    /// Mutate through [`SurfaceState::set_zoom_factor`] so the CSS zoom level
    /// stays in lockstep.
    pub zoom_factor: f64,
    /// Pinch-zoom viewport emulation mode. When off, zoom is plain CSS zoom.
    pub visual_zoom: bool,
    /// Fixed mobile-width logical viewport instead of the desktop viewport.
    pub mobile_mode: bool,
    /// Forward zoom-level notifications into the content so it can show a
    /// transient zoom overlay.
    pub show_zoom_overlay: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            zoom_factor: 1.0,
            visual_zoom: false,
            mobile_mode: false,
            show_zoom_overlay: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SurfaceState
// ─────────────────────────────────────────────────────────────────────────────

/// The single authoritative record of one embedded surface.
///
/// Created at controller initialization, destroyed when the host window
/// closes. Surface recreation replaces the engine handle in place while
/// preserving `bounds`, `visible` and `audio_muted`.
#[derive(Debug)]
pub struct SurfaceState {
    /// URL of the current (or in-flight) main-frame document.
    pub current_url: Option<Url>,
    /// Host-intended visibility. The surface may be transiently parked
    /// off-canvas while `visible` is still `true` (late-hide protocol).
    pub visible: bool,
    /// Last placement the host asked for. Applied to the live surface only
    /// while visible and not mid-reveal; stored unconditionally.
    pub bounds: DeviceRect,
    /// Current navigation lifecycle phase.
    pub phase: NavPhase,
    /// Whether any document has reached `DomReady` on this engine handle.
    /// Reset by surface recreation.
    pub page_loaded: bool,
    /// Presentation settings.
    pub settings: SurfaceSettings,
    /// Engine CSS zoom level, always `(clamp(zoom_factor) - 1.0) / 0.1`.
    pub css_zoom_level: f64,
    /// Emulation was explicitly pre-armed for a navigation that has not yet
    /// produced a live document.
    pub prearmed_emulation: bool,
    /// A show-after-emulation reveal is pending. At most one at a time.
    pub pending_reveal: bool,
    /// Audio mute flag, preserved across recreation.
    pub audio_muted: bool,
    /// Recreation ran immediately before the navigation currently in flight,
    /// so the post-load input nudge is unnecessary.
    pub recovered_before_nav: bool,
    epoch: u64,
}

impl SurfaceState {
    pub fn new() -> Self {
        Self {
            current_url: None,
            visible: false,
            bounds: device_rect(0, 0, 0, 0),
            phase: NavPhase::Idle,
            page_loaded: false,
            settings: SurfaceSettings::default(),
            css_zoom_level: 0.0,
            prearmed_emulation: false,
            pending_reveal: false,
            audio_muted: false,
            recovered_before_nav: false,
            epoch: 0,
        }
    }

    /// Sets the keyboard zoom factor (clamped) and recomputes the CSS zoom
    /// level with it. Returns the new level. This is the only mutation path
    /// for either value.
    pub fn set_zoom_factor(&mut self, factor: f64) -> f64 {
        self.settings.zoom_factor = factor.clamp(ZOOM_FACTOR_MIN, ZOOM_FACTOR_MAX);
        self.css_zoom_level = css_zoom_level_for(self.settings.zoom_factor);
        self.css_zoom_level
    }

    /// Placement is usable only with a strictly positive area.
    pub fn bounds_valid(&self) -> bool {
        self.bounds.size.width > 0 && self.bounds.size.height > 0
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Invalidates every scheduled action captured before this point.
    pub fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_factor_clamps_and_recomputes_level() {
        let mut state = SurfaceState::new();

        state.set_zoom_factor(2.5);
        assert_eq!(state.settings.zoom_factor, 2.5);
        assert_eq!(state.css_zoom_level, 15.0);

        state.set_zoom_factor(99.0);
        assert_eq!(state.settings.zoom_factor, ZOOM_FACTOR_MAX);
        assert_eq!(state.css_zoom_level, 40.0);

        state.set_zoom_factor(0.0);
        assert_eq!(state.settings.zoom_factor, ZOOM_FACTOR_MIN);
        assert_eq!(state.css_zoom_level, css_zoom_level_for(ZOOM_FACTOR_MIN));
    }

    #[test]
    fn test_level_always_matches_formula() {
        let mut state = SurfaceState::new();
        for factor in [0.1, 0.25, 0.4, 1.0, 1.3, 3.7, 5.0, 8.0] {
            state.set_zoom_factor(factor);
            assert_eq!(state.css_zoom_level, css_zoom_level_for(factor));
        }
    }

    #[test]
    fn test_zoom_factor_for_level_roundtrip() {
        assert!((zoom_factor_for_level(15.0) - 2.5).abs() < 1e-9);
        assert!((zoom_factor_for_level(0.0) - 1.0).abs() < 1e-9);
        // Out-of-range levels clamp to the engine's accepted range.
        assert!((zoom_factor_for_level(100.0) - 5.0).abs() < 1e-9);
        assert!((zoom_factor_for_level(-100.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_validity() {
        let mut state = SurfaceState::new();
        assert!(!state.bounds_valid());
        state.bounds = device_rect(10, 10, 800, 600);
        assert!(state.bounds_valid());
        state.bounds = device_rect(0, 0, 800, 0);
        assert!(!state.bounds_valid());
    }

    #[test]
    fn test_epoch_bumps_monotonically() {
        let mut state = SurfaceState::new();
        let first = state.epoch();
        assert!(state.bump_epoch() > first);
        assert!(state.bump_epoch() > first + 1);
    }

    #[test]
    fn test_phase_dom_liveness() {
        assert!(!NavPhase::Idle.dom_is_live());
        assert!(!NavPhase::Committed.dom_is_live());
        assert!(NavPhase::DomReady.dom_is_live());
        assert!(NavPhase::Finished.dom_is_live());
        assert!(!NavPhase::Failed.dom_is_live());
    }
}
