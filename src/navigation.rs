//! Navigation lifecycle: the engine-event state machine.
//!
//! Engine lifecycle events arrive in engine-defined order
//! (`LoadStarted ≤ Committed ≤ DomReady ≤ Finished`) and drive the
//! [`NavPhase`] machine. `DomReady` is the earliest point at which the new
//! document is live, so it is where zoom parameters are (re)sent into the
//! content and the emulation override is synchronized. `Finished` is an
//! idempotent confirmation, not a new trigger.
//!
//! Failure handling follows the taxonomy in [`crate::error`]: abort-class
//! codes are swallowed, subresource failures are logged only, and a real
//! main-frame failure is reported to the host and resolves any pending
//! reveal immediately so the surface is never left invisible.

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::Config;
use crate::delegate::SurfaceDelegate;
use crate::emulation;
use crate::engine::{Engine, EngineEvent};
use crate::error::{is_benign_abort, LoadError};
use crate::state::{NavPhase, SurfaceState};
use crate::timers::{TimerAction, Timers};
use crate::visibility;

/// Applies one engine lifecycle event to the surface.
pub fn handle_event<E: Engine, D: SurfaceDelegate>(
    state: &mut SurfaceState,
    engine: &mut E,
    timers: &mut Timers,
    delegate: &D,
    config: &Config,
    now: Instant,
    event: EngineEvent,
) {
    match event {
        EngineEvent::LoadStarted { url } => {
            // A new navigation supersedes every scheduled action.
            state.bump_epoch();
            state.phase = NavPhase::Started;
            state.current_url = Some(url);
            delegate.notify_loading(true);
        }

        EngineEvent::Committed { url } => {
            state.phase = NavPhase::Committed;
            state.current_url = Some(url.clone());
            delegate.notify_navigated(&url);

            // Late-hide: while the network wait runs, keep showing the old
            // page parked off-canvas instead of a blank frame. Only in
            // visual-zoom mode, and only once a page exists to preserve.
            if state.settings.visual_zoom
                && state.page_loaded
                && state.visible
                && !state.pending_reveal
            {
                if let Err(e) = visibility::hide_preserving(state, engine, &config.session) {
                    warn!(error = %e, "Late-hide failed; continuing visible");
                }
            }
        }

        EngineEvent::DomReady => {
            state.phase = NavPhase::DomReady;
            state.page_loaded = true;
            state.prearmed_emulation = false;
            let recovered = std::mem::take(&mut state.recovered_before_nav);

            // The fresh document knows nothing about our zoom: resend it.
            if let Err(e) = engine.set_css_zoom(state.css_zoom_level) {
                warn!(error = %e, "Could not resend zoom level to document");
            }
            engine.notify_zoom_level(state.css_zoom_level, state.settings.show_zoom_overlay);

            if let Err(e) = emulation::sync(state, engine, &config.emulation) {
                warn!(error = %e, "Emulation sync failed after DomReady");
            }

            if state.pending_reveal {
                timers.schedule(
                    now,
                    config.timing.settle_delay(),
                    state.epoch(),
                    TimerAction::RevealAfterSettle,
                );
            }

            // CSS-zoom input-routing workaround: when the surface was not
            // rebuilt before this navigation, nudge input routing shortly
            // after the document settles.
            if !state.settings.visual_zoom && !recovered && config.recovery.nudge_after_load {
                timers.schedule(
                    now,
                    config.timing.nudge_delay(),
                    state.epoch(),
                    TimerAction::PostLoadNudge,
                );
            }
        }

        EngineEvent::Finished => {
            if state.phase == NavPhase::Finished {
                debug!("Duplicate Finished ignored");
                return;
            }
            state.phase = NavPhase::Finished;
            delegate.notify_loading(false);
            if let Some(url) = &state.current_url {
                delegate.notify_loaded(url);
            }
        }

        EngineEvent::LoadFailed {
            code,
            description,
            url,
            main_frame,
        } => {
            if !main_frame {
                // Ads, trackers, embedded media. Never promoted to an error.
                debug!(code, url, "Subresource load failed");
                return;
            }
            if is_benign_abort(code) {
                debug!(code, url, "Navigation superseded; abort swallowed");
                if state.phase != NavPhase::Idle {
                    state.phase = NavPhase::Idle;
                }
                return;
            }

            state.phase = NavPhase::Failed;
            delegate.notify_loading(false);
            delegate.notify_load_error(&LoadError {
                code,
                description,
                url,
            });

            // Never leave the surface invisible behind a failed load.
            if let Err(e) = visibility::resolve_pending_reveal(state, engine) {
                warn!(error = %e, "Could not reveal surface after load failure");
            }
        }

        EngineEvent::TitleChanged(title) => {
            delegate.notify_title_changed(&title);
        }

        EngineEvent::ContextMenuRequested(params) => {
            delegate.notify_context_menu(&params);
        }

        EngineEvent::Input(params) => {
            delegate.notify_input_event(&params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{commands, Command, MockFactory};
    use crate::engine::{EngineFactory, SessionProfile};
    use crate::error::ERR_ABORTED;
    use crate::state::device_rect;
    use std::cell::RefCell;
    use url::Url;

    #[derive(Debug, Clone, PartialEq)]
    enum HostEvent {
        Loading(bool),
        Loaded(String),
        Navigated(String),
        Error(i32, String),
        Title(String),
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<HostEvent>>,
    }

    impl SurfaceDelegate for Recorder {
        fn notify_loading(&self, loading: bool) {
            self.events.borrow_mut().push(HostEvent::Loading(loading));
        }
        fn notify_loaded(&self, url: &Url) {
            self.events
                .borrow_mut()
                .push(HostEvent::Loaded(url.to_string()));
        }
        fn notify_navigated(&self, url: &Url) {
            self.events
                .borrow_mut()
                .push(HostEvent::Navigated(url.to_string()));
        }
        fn notify_load_error(&self, error: &LoadError) {
            self.events
                .borrow_mut()
                .push(HostEvent::Error(error.code, error.url.clone()));
        }
        fn notify_title_changed(&self, title: &str) {
            self.events
                .borrow_mut()
                .push(HostEvent::Title(title.to_string()));
        }
    }

    struct Fixture {
        state: SurfaceState,
        engine: crate::engine::mock::MockEngine,
        log: crate::engine::mock::CommandLog,
        timers: Timers,
        delegate: Recorder,
        config: Config,
        now: Instant,
    }

    impl Fixture {
        fn new() -> Self {
            let (mut factory, log) = MockFactory::new();
            let engine = factory.create(&SessionProfile::default()).unwrap();
            let mut state = SurfaceState::new();
            state.bounds = device_rect(0, 0, 1024, 768);
            Self {
                state,
                engine,
                log,
                timers: Timers::new(),
                delegate: Recorder::default(),
                config: Config::default(),
                now: Instant::now(),
            }
        }

        fn feed(&mut self, event: EngineEvent) {
            handle_event(
                &mut self.state,
                &mut self.engine,
                &mut self.timers,
                &self.delegate,
                &self.config,
                self.now,
                event,
            );
        }

        fn events(&self) -> Vec<HostEvent> {
            self.delegate.events.borrow().clone()
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_full_lifecycle_phases_and_events() {
        let mut fx = Fixture::new();

        fx.feed(EngineEvent::LoadStarted {
            url: url("https://a.test/"),
        });
        assert_eq!(fx.state.phase, NavPhase::Started);

        fx.feed(EngineEvent::Committed {
            url: url("https://a.test/"),
        });
        assert_eq!(fx.state.phase, NavPhase::Committed);

        fx.feed(EngineEvent::DomReady);
        assert_eq!(fx.state.phase, NavPhase::DomReady);
        assert!(fx.state.page_loaded);

        fx.feed(EngineEvent::Finished);
        assert_eq!(fx.state.phase, NavPhase::Finished);

        assert_eq!(
            fx.events(),
            vec![
                HostEvent::Loading(true),
                HostEvent::Navigated("https://a.test/".to_string()),
                HostEvent::Loading(false),
                HostEvent::Loaded("https://a.test/".to_string()),
            ]
        );
    }

    #[test]
    fn test_finished_is_idempotent() {
        let mut fx = Fixture::new();
        fx.feed(EngineEvent::LoadStarted {
            url: url("https://a.test/"),
        });
        fx.feed(EngineEvent::Finished);
        let count = fx.events().len();
        fx.feed(EngineEvent::Finished);
        assert_eq!(fx.events().len(), count);
    }

    #[test]
    fn test_dom_ready_resends_zoom_into_content() {
        let mut fx = Fixture::new();
        fx.state.set_zoom_factor(1.5);
        fx.feed(EngineEvent::DomReady);

        let cmds = commands(&fx.log);
        assert!(cmds.contains(&Command::SetCssZoom(5.0)));
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::NotifyZoomLevel { level, .. } if *level == 5.0
        )));
    }

    #[test]
    fn test_committed_late_hides_only_with_prior_page() {
        let mut fx = Fixture::new();
        fx.state.settings.visual_zoom = true;
        fx.state.visible = true;
        // No page loaded yet: first navigation must not hide anything.
        fx.feed(EngineEvent::Committed {
            url: url("https://a.test/"),
        });
        assert!(!fx.state.pending_reveal);
        assert!(commands(&fx.log).is_empty());

        // Second navigation over a loaded page parks the old content.
        fx.state.page_loaded = true;
        fx.feed(EngineEvent::Committed {
            url: url("https://b.test/"),
        });
        assert!(fx.state.pending_reveal);
        assert!(matches!(commands(&fx.log)[0], Command::SetPlacement(_)));
    }

    #[test]
    fn test_dom_ready_schedules_reveal_when_pending() {
        let mut fx = Fixture::new();
        fx.state.settings.visual_zoom = true;
        fx.state.visible = true;
        fx.state.page_loaded = true;
        fx.state.pending_reveal = true;

        fx.feed(EngineEvent::DomReady);

        let fired = fx.timers.fire_due(
            fx.now + fx.config.timing.settle_delay(),
            fx.state.epoch(),
        );
        assert!(fired.contains(&TimerAction::RevealAfterSettle));
    }

    #[test]
    fn test_benign_abort_is_swallowed() {
        let mut fx = Fixture::new();
        fx.feed(EngineEvent::LoadStarted {
            url: url("https://a.test/"),
        });
        fx.feed(EngineEvent::LoadFailed {
            code: ERR_ABORTED,
            description: "aborted".to_string(),
            url: "https://a.test/".to_string(),
            main_frame: true,
        });

        assert_eq!(fx.state.phase, NavPhase::Idle);
        assert!(!fx
            .events()
            .iter()
            .any(|e| matches!(e, HostEvent::Error(..))));
    }

    #[test]
    fn test_subresource_failure_is_logged_only() {
        let mut fx = Fixture::new();
        fx.feed(EngineEvent::LoadStarted {
            url: url("https://a.test/"),
        });
        fx.feed(EngineEvent::LoadFailed {
            code: -105,
            description: "name not resolved".to_string(),
            url: "https://tracker.test/pixel.gif".to_string(),
            main_frame: false,
        });

        assert_eq!(fx.state.phase, NavPhase::Started);
        assert!(!fx
            .events()
            .iter()
            .any(|e| matches!(e, HostEvent::Error(..))));
    }

    #[test]
    fn test_main_frame_failure_reports_and_reveals() {
        let mut fx = Fixture::new();
        fx.state.visible = true;
        fx.state.pending_reveal = true;

        fx.feed(EngineEvent::LoadFailed {
            code: -106,
            description: "internet disconnected".to_string(),
            url: "https://b.test/".to_string(),
            main_frame: true,
        });

        assert_eq!(fx.state.phase, NavPhase::Failed);
        assert!(fx
            .events()
            .contains(&HostEvent::Error(-106, "https://b.test/".to_string())));
        // Revealed immediately, emulation state notwithstanding.
        assert!(!fx.state.pending_reveal);
        assert!(matches!(
            commands(&fx.log).last(),
            Some(Command::SetPlacement(_))
        ));
    }

    #[test]
    fn test_nudge_scheduled_in_css_zoom_mode_only() {
        let mut fx = Fixture::new();
        fx.feed(EngineEvent::DomReady);
        let fired = fx
            .timers
            .fire_due(fx.now + fx.config.timing.nudge_delay(), fx.state.epoch());
        assert!(fired.contains(&TimerAction::PostLoadNudge));

        let mut fx = Fixture::new();
        fx.state.settings.visual_zoom = true;
        fx.feed(EngineEvent::DomReady);
        let fired = fx
            .timers
            .fire_due(fx.now + fx.config.timing.nudge_delay(), fx.state.epoch());
        assert!(!fired.contains(&TimerAction::PostLoadNudge));
    }

    #[test]
    fn test_nudge_not_scheduled_after_recreation() {
        let mut fx = Fixture::new();
        fx.state.recovered_before_nav = true;
        fx.feed(EngineEvent::DomReady);
        let fired = fx
            .timers
            .fire_due(fx.now + fx.config.timing.nudge_delay(), fx.state.epoch());
        assert!(!fired.contains(&TimerAction::PostLoadNudge));
        assert!(!fx.state.recovered_before_nav);
    }

    #[test]
    fn test_title_forwarded() {
        let mut fx = Fixture::new();
        fx.feed(EngineEvent::TitleChanged("Hello".to_string()));
        assert_eq!(fx.events(), vec![HostEvent::Title("Hello".to_string())]);
    }
}
