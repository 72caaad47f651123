//! The root surface controller.
//!
//! [`SurfaceController`] owns the single [`SurfaceState`] and is the only
//! component holding the live engine handle; nothing else retains it beyond
//! a single call. Host commands mutate the state and delegate to the
//! coordinator modules; engine lifecycle events flow in through
//! [`SurfaceController::handle_engine_event`]; deferred actions run when the
//! host pumps [`SurfaceController::pump_timers`].
//!
//! Every command catches engine faults at this boundary and converts them to
//! a `bool`/`None` result plus a logged diagnostic — a bad navigation must
//! never crash the host. After a failed surface recreation the handle slot
//! is empty and every command reports not-ready the same way.

use std::time::Instant;

use tracing::{debug, warn};
use url::Url;

use crate::bounds;
use crate::config::Config;
use crate::delegate::SurfaceDelegate;
use crate::emulation;
use crate::engine::{CapturedFrame, Engine, EngineEvent, EngineFactory, SessionProfile};
use crate::error::EngineError;
use crate::navigation;
use crate::recovery::{self, RecoveryStrategy};
use crate::state::{
    zoom_factor_for_level, DeviceRect, SurfaceState, CSS_ZOOM_LEVEL_MAX, CSS_ZOOM_LEVEL_MIN,
};
use crate::timers::{TimerAction, Timers};
use crate::visibility;

/// Settings applied atomically before a navigation starts, eliminating the
/// race between "settings changed" and "navigation started".
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSettings {
    pub zoom_factor: f64,
    pub visual_zoom: bool,
    pub mobile_mode: bool,
    pub show_zoom_overlay: bool,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            zoom_factor: 1.0,
            visual_zoom: false,
            mobile_mode: false,
            show_zoom_overlay: false,
        }
    }
}

pub struct SurfaceController<F: EngineFactory, D: SurfaceDelegate> {
    state: SurfaceState,
    engine: Option<F::Handle>,
    factory: F,
    profile: SessionProfile,
    timers: Timers,
    config: Config,
    delegate: D,
}

impl<F: EngineFactory, D: SurfaceDelegate> SurfaceController<F, D> {
    /// Builds the controller and its initial surface. The surface is not
    /// placed anywhere until the host supplies bounds and shows it.
    pub fn new(mut factory: F, delegate: D, config: Config) -> Result<Self, EngineError> {
        let profile = SessionProfile {
            partition: config.session.partition.clone(),
            user_agent: if config.session.user_agent.is_empty() {
                None
            } else {
                Some(config.session.user_agent.clone())
            },
            sandboxed: true,
        };
        let engine = factory.create(&profile)?;
        Ok(Self {
            state: SurfaceState::new(),
            engine: Some(engine),
            factory,
            profile,
            timers: Timers::new(),
            config,
            delegate,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    /// `false` after a failed recreation left the controller without a
    /// usable surface.
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn url(&self) -> Option<&Url> {
        self.state.current_url.as_ref()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.state.settings.zoom_factor
    }

    pub fn css_zoom_level(&self) -> f64 {
        self.state.css_zoom_level
    }

    // ─────────────────────────────────────────────────────────────────────
    // Navigation commands
    // ─────────────────────────────────────────────────────────────────────

    pub fn navigate(&mut self, url: &str) -> bool {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url, error = %e, "Rejecting unparseable navigation target");
                return false;
            }
        };
        if !self.prepare_for_navigation() {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            warn!("navigate: surface not ready");
            return false;
        };
        match engine.load_url(&url) {
            Ok(()) => true,
            Err(e) => {
                warn!(%url, error = %e, "Navigation request failed");
                false
            }
        }
    }

    /// Applies `settings` synchronously, then navigates. With visual zoom
    /// requested on a surface that has never loaded, emulation is pre-armed
    /// and applied before the load starts.
    pub fn navigate_with_settings(&mut self, url: &str, settings: NavigationSettings) -> bool {
        if !self.apply_navigation_settings(&settings) {
            return false;
        }
        self.navigate(url)
    }

    /// Loads a generated inline document (e.g. an extracted article).
    pub fn load_inline_content(&mut self, html: &str, base_url: Option<&str>) -> bool {
        let base = match base_url {
            Some(raw) => match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(base_url = raw, error = %e, "Ignoring unparseable base URL");
                    None
                }
            },
            None => None,
        };
        if !self.prepare_for_navigation() {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            warn!("load_inline_content: surface not ready");
            return false;
        };
        match engine.load_html(html, base.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Inline content load failed");
                false
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
    }

    pub fn reload(&mut self) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        match engine.reload() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Reload failed");
                false
            }
        }
    }

    pub fn go_back(&mut self) -> bool {
        self.engine.as_mut().is_some_and(|e| e.go_back())
    }

    pub fn go_forward(&mut self) -> bool {
        self.engine.as_mut().is_some_and(|e| e.go_forward())
    }

    pub fn can_go_back(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.can_go_back())
    }

    pub fn can_go_forward(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.can_go_forward())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Placement, visibility, focus
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_bounds(&mut self, rect: DeviceRect) {
        let Some(engine) = self.engine.as_mut() else {
            self.state.bounds = rect;
            return;
        };
        if let Err(e) = bounds::set_bounds(&mut self.state, engine, &self.config, rect) {
            warn!(error = %e, "set_bounds failed");
        }
    }

    pub fn set_visible(&mut self, visible: bool, preserve_content: bool) {
        // Supersede any scheduled reveal or handoff before changing intent.
        self.state.bump_epoch();
        let Some(engine) = self.engine.as_mut() else {
            self.state.visible = visible && self.state.bounds_valid();
            return;
        };
        if let Err(e) = visibility::apply_visibility(
            &mut self.state,
            engine,
            &self.config.session,
            visible,
            preserve_content,
        ) {
            warn!(error = %e, "set_visible failed");
        }
    }

    pub fn focus(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.focus();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Zoom and presentation settings
    // ─────────────────────────────────────────────────────────────────────

    /// Synchronous rendezvous point: when this returns, the engine has the
    /// new factor and a navigation issued immediately afterward cannot
    /// observe the old one.
    pub fn set_zoom_factor(&mut self, factor: f64) -> bool {
        let level = self.state.set_zoom_factor(factor);
        let Some(engine) = self.engine.as_mut() else {
            warn!("set_zoom_factor: surface not ready");
            return false;
        };
        if let Err(e) = engine.set_zoom_factor(self.state.settings.zoom_factor) {
            warn!(error = %e, "Engine rejected zoom factor");
            return false;
        }
        if let Err(e) = engine.set_css_zoom(level) {
            warn!(error = %e, "Engine rejected CSS zoom level");
            return false;
        }
        engine.notify_zoom_level(level, self.state.settings.show_zoom_overlay);

        // With emulation pre-armed for a navigation that has not produced a
        // document yet, reapplying now would target the not-yet-live page;
        // DomReady will sync with the updated factor.
        if self.state.prearmed_emulation {
            debug!(level, "Zoom updated under pre-armed emulation; sync deferred");
            return true;
        }
        self.resync_emulation_with_handoff()
    }

    /// Sets zoom via the engine's CSS zoom level scale. Level is clamped to
    /// the engine's accepted range; factor and level stay in lockstep.
    pub fn set_css_zoom(&mut self, level: f64) -> bool {
        let level = level.clamp(CSS_ZOOM_LEVEL_MIN, CSS_ZOOM_LEVEL_MAX);
        self.set_zoom_factor(zoom_factor_for_level(level))
    }

    pub fn set_visual_zoom(&mut self, enabled: bool) -> bool {
        if self.state.settings.visual_zoom == enabled {
            return true;
        }
        self.state.settings.visual_zoom = enabled;
        if !enabled {
            self.state.prearmed_emulation = false;
        }
        self.resync_emulation_with_handoff()
    }

    pub fn set_mobile_mode(&mut self, enabled: bool) -> bool {
        if self.state.settings.mobile_mode == enabled {
            return true;
        }
        self.state.settings.mobile_mode = enabled;
        self.resync_emulation_with_handoff()
    }

    pub fn set_audio_muted(&mut self, muted: bool) {
        self.state.audio_muted = muted;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_audio_muted(muted);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Capture
    // ─────────────────────────────────────────────────────────────────────

    pub fn capture_screen(&mut self) -> Option<CapturedFrame> {
        self.engine.as_mut()?.capture()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Event and timer pumping (host loop integration)
    // ─────────────────────────────────────────────────────────────────────

    /// Feeds one engine lifecycle event into the state machine.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let Some(engine) = self.engine.as_mut() else {
            debug!(?event, "Event for destroyed surface ignored");
            return;
        };
        navigation::handle_event(
            &mut self.state,
            engine,
            &mut self.timers,
            &self.delegate,
            &self.config,
            Instant::now(),
            event,
        );
    }

    /// Runs every scheduled action due at `now` whose captured epoch is
    /// still current. Stale actions are dropped inside [`Timers`].
    pub fn pump_timers(&mut self, now: Instant) {
        let fired = self.timers.fire_due(now, self.state.epoch());
        if fired.is_empty() {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        for action in fired {
            match action {
                TimerAction::RevealAfterSettle => {
                    if let Err(e) = visibility::resolve_pending_reveal(&mut self.state, engine) {
                        warn!(error = %e, "Deferred reveal failed");
                    }
                }
                TimerAction::FocusSurface => {
                    engine.focus();
                }
                TimerAction::PostLoadNudge => {
                    recovery::nudge(&self.state, engine);
                }
            }
        }
    }

    /// Earliest pending deadline, for hosts that sleep between pumps.
    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    /// Runs the recovery policy ahead of a navigation. Returns `false` when
    /// the surface is unusable — either a prior recreation already failed
    /// (the slot stays empty until the host tears the window down) or one
    /// required now could not complete.
    fn prepare_for_navigation(&mut self) -> bool {
        if self.engine.is_none() {
            warn!(error = %EngineError::NotReady, "Navigation refused");
            return false;
        }
        match recovery::strategy_for(
            &self.state.settings,
            self.state.page_loaded,
            &self.config.recovery,
        ) {
            RecoveryStrategy::Preserve => true,
            RecoveryStrategy::Recreate => {
                match recovery::recreate(
                    &mut self.factory,
                    &self.profile,
                    &mut self.engine,
                    &mut self.state,
                    &self.config.session,
                ) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "Surface recreation failed; surface is not ready");
                        false
                    }
                }
            }
        }
    }

    fn apply_navigation_settings(&mut self, settings: &NavigationSettings) -> bool {
        self.state.settings.visual_zoom = settings.visual_zoom;
        self.state.settings.mobile_mode = settings.mobile_mode;
        self.state.settings.show_zoom_overlay = settings.show_zoom_overlay;
        let level = self.state.set_zoom_factor(settings.zoom_factor);

        let Some(engine) = self.engine.as_mut() else {
            warn!("navigate_with_settings: surface not ready");
            return false;
        };
        if let Err(e) = engine.set_zoom_factor(self.state.settings.zoom_factor) {
            warn!(error = %e, "Engine rejected zoom factor");
            return false;
        }
        if let Err(e) = engine.set_css_zoom(level) {
            warn!(error = %e, "Engine rejected CSS zoom level");
            return false;
        }

        // Pre-arm: the surface has never loaded, so DomReady cannot be the
        // first emulation point — apply before the navigation starts.
        if settings.visual_zoom && !self.state.page_loaded {
            self.state.prearmed_emulation = true;
            match emulation::sync(&self.state, engine, &self.config.emulation) {
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Pre-armed emulation failed"),
            }
        }
        true
    }

    /// Re-syncs emulation after a host-initiated setting change, then hands
    /// focus back through the ordered host→surface sequence.
    fn resync_emulation_with_handoff(&mut self) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        match emulation::sync(&self.state, engine, &self.config.emulation) {
            Ok(true) => {
                bounds::begin_focus_handoff(
                    engine,
                    &mut self.timers,
                    &self.config,
                    self.state.epoch(),
                    Instant::now(),
                );
                true
            }
            Ok(false) => true,
            Err(e) => {
                warn!(error = %e, "Emulation resync failed");
                false
            }
        }
    }
}
