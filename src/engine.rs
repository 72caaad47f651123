//! Engine seam: the contract between the controller and the embedding engine.
//!
//! The controller never links the concrete rendering engine. It drives a
//! [`Engine`] handle — the one live surface — and rebuilds it through an
//! [`EngineFactory`] when the recovery workaround demands a teardown.
//! Engine lifecycle notifications flow back as [`EngineEvent`] values, fed
//! into [`crate::controller::SurfaceController::handle_engine_event`] by the
//! host's event loop glue.
//!
//! Every mutating call is asynchronous from the engine's point of view
//! except [`Engine::set_zoom_factor`] and [`Engine::set_css_zoom`], which
//! are specified as synchronous round-trips: a navigation issued right after
//! them must never observe stale zoom settings.

use url::Url;

use crate::emulation::EmulationParams;
use crate::error::EngineError;
use crate::state::DeviceRect;

// ─────────────────────────────────────────────────────────────────────────────
// Engine handle
// ─────────────────────────────────────────────────────────────────────────────

/// Commands understood by the live surface handle.
///
/// Calls made after the underlying surface was destroyed must fail with
/// [`EngineError::Destroyed`] (or silently no-op for the infallible
/// methods), never crash.
pub trait Engine {
    fn load_url(&mut self, url: &Url) -> Result<(), EngineError>;

    /// Loads a generated inline document, optionally resolving relative
    /// references against `base_url`.
    fn load_html(&mut self, html: &str, base_url: Option<&Url>) -> Result<(), EngineError>;

    /// Navigates to a blank document, dropping the current content.
    fn clear_content(&mut self) -> Result<(), EngineError>;

    /// Advisory: asks the engine to abandon the in-flight load.
    fn stop(&mut self);

    fn reload(&mut self) -> Result<(), EngineError>;

    fn go_back(&mut self) -> bool;
    fn go_forward(&mut self) -> bool;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;

    /// Places the surface at `rect` within the host window. Parking the
    /// surface off-canvas is expressed through this same primitive.
    fn set_placement(&mut self, rect: DeviceRect) -> Result<(), EngineError>;

    fn focus(&mut self);
    /// Moves focus to the host window, blurring the surface.
    fn focus_host(&mut self);

    /// Synchronous round-trip. See module docs.
    fn set_zoom_factor(&mut self, factor: f64) -> Result<(), EngineError>;
    /// Synchronous round-trip. See module docs.
    fn set_css_zoom(&mut self, level: f64) -> Result<(), EngineError>;

    /// Overrides the device metrics the content lays out against. Calling
    /// this on a surface that has never produced a live document is fatal in
    /// the underlying engine; [`crate::emulation`] guards every call site.
    fn apply_emulation(&mut self, params: &EmulationParams) -> Result<(), EngineError>;
    /// Removes the device-metrics override. Same precondition as
    /// [`Engine::apply_emulation`].
    fn clear_emulation(&mut self) -> Result<(), EngineError>;

    /// Sends the current zoom level into the content (overlay display).
    fn notify_zoom_level(&mut self, level: f64, show_overlay: bool);

    /// Best-effort: asks the content to re-register its input listeners
    /// after an input-routing nudge. Failures are invisible by design.
    fn reinstall_input_listeners(&mut self);

    fn set_audio_muted(&mut self, muted: bool);

    /// Captures the surface as an image, e.g. for a host-drawn placeholder
    /// covering a preserve-content hide. `None` when the engine cannot
    /// produce a frame right now.
    fn capture(&mut self) -> Option<CapturedFrame>;

    /// Releases the surface and its engine resources. Idempotent.
    fn destroy(&mut self);
}

/// A captured surface frame, tightly packed RGBA.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Isolation and session settings a surface is created with. Recreation
/// passes the same profile again so the rebuilt surface is indistinguishable
/// from the original.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    /// Storage partition the surface's session lives in.
    pub partition: String,
    /// User-agent override; `None` keeps the engine default.
    pub user_agent: Option<String>,
    /// Whether the content process runs sandboxed.
    pub sandboxed: bool,
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self {
            partition: "persist:surface".to_string(),
            user_agent: None,
            sandboxed: true,
        }
    }
}

/// Builds surface handles. The controller holds one factory for the lifetime
/// of the host window and calls it once at startup plus once per recovery
/// teardown/rebuild.
pub trait EngineFactory {
    type Handle: Engine;

    fn create(&mut self, profile: &SessionProfile) -> Result<Self::Handle, EngineError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle events
// ─────────────────────────────────────────────────────────────────────────────

/// Engine lifecycle notifications, assumed to arrive in engine-defined order
/// (`LoadStarted ≤ Committed ≤ DomReady ≤ Finished`). The controller never
/// reorders them.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    LoadStarted {
        url: Url,
    },
    /// The main-frame response was committed; the old document is gone.
    Committed {
        url: Url,
    },
    /// The new document is live — earliest safe point for emulation.
    DomReady,
    /// Idempotent confirmation that loading finished, not a new trigger.
    Finished,
    LoadFailed {
        code: i32,
        description: String,
        url: String,
        main_frame: bool,
    },
    TitleChanged(String),
    ContextMenuRequested(ContextMenuParams),
    Input(InputEventParams),
}

/// Context-menu request forwarded verbatim to the host.
#[derive(Debug, Clone)]
pub struct ContextMenuParams {
    pub x: i32,
    pub y: i32,
    pub link_url: Option<Url>,
    pub selection_text: Option<String>,
}

/// Raw input notification forwarded to the host (used by host-level gesture
/// handling, e.g. pinch begin/end).
#[derive(Debug, Clone)]
pub struct InputEventParams {
    pub kind: InputKind,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    MouseDown,
    MouseUp,
    Wheel,
    TouchStart,
    TouchEnd,
    KeyDown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording mock (test support)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod mock {
    //! A recording engine for controller tests. Every command is appended to
    //! a shared log tagged with the handle's generation, so tests can assert
    //! both what was issued and which handle (pre- or post-recreation)
    //! received it.

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Command {
        LoadUrl(String),
        LoadHtml { len: usize, base: Option<String> },
        ClearContent,
        Stop,
        Reload,
        GoBack,
        GoForward,
        SetPlacement(DeviceRect),
        Focus,
        FocusHost,
        SetZoomFactor(f64),
        SetCssZoom(f64),
        ApplyEmulation(EmulationParams),
        ClearEmulation,
        NotifyZoomLevel { level: f64, overlay: bool },
        ReinstallInputListeners,
        SetAudioMuted(bool),
        Capture,
        Destroy,
    }

    pub type CommandLog = Rc<RefCell<Vec<(u32, Command)>>>;

    pub struct MockEngine {
        pub generation: u32,
        pub log: CommandLog,
        pub history_back: Cell<bool>,
        pub history_forward: Cell<bool>,
        destroyed: bool,
    }

    impl MockEngine {
        fn record(&mut self, command: Command) {
            self.log.borrow_mut().push((self.generation, command));
        }

        fn guard(&mut self) -> Result<(), EngineError> {
            if self.destroyed {
                Err(EngineError::Destroyed)
            } else {
                Ok(())
            }
        }
    }

    impl Engine for MockEngine {
        fn load_url(&mut self, url: &Url) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::LoadUrl(url.to_string()));
            Ok(())
        }

        fn load_html(&mut self, html: &str, base_url: Option<&Url>) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::LoadHtml {
                len: html.len(),
                base: base_url.map(|u| u.to_string()),
            });
            Ok(())
        }

        fn clear_content(&mut self) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::ClearContent);
            Ok(())
        }

        fn stop(&mut self) {
            self.record(Command::Stop);
        }

        fn reload(&mut self) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::Reload);
            Ok(())
        }

        fn go_back(&mut self) -> bool {
            self.record(Command::GoBack);
            self.history_back.get()
        }

        fn go_forward(&mut self) -> bool {
            self.record(Command::GoForward);
            self.history_forward.get()
        }

        fn can_go_back(&self) -> bool {
            self.history_back.get()
        }

        fn can_go_forward(&self) -> bool {
            self.history_forward.get()
        }

        fn set_placement(&mut self, rect: DeviceRect) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::SetPlacement(rect));
            Ok(())
        }

        fn focus(&mut self) {
            self.record(Command::Focus);
        }

        fn focus_host(&mut self) {
            self.record(Command::FocusHost);
        }

        fn set_zoom_factor(&mut self, factor: f64) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::SetZoomFactor(factor));
            Ok(())
        }

        fn set_css_zoom(&mut self, level: f64) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::SetCssZoom(level));
            Ok(())
        }

        fn apply_emulation(&mut self, params: &EmulationParams) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::ApplyEmulation(params.clone()));
            Ok(())
        }

        fn clear_emulation(&mut self) -> Result<(), EngineError> {
            self.guard()?;
            self.record(Command::ClearEmulation);
            Ok(())
        }

        fn notify_zoom_level(&mut self, level: f64, show_overlay: bool) {
            self.record(Command::NotifyZoomLevel {
                level,
                overlay: show_overlay,
            });
        }

        fn reinstall_input_listeners(&mut self) {
            self.record(Command::ReinstallInputListeners);
        }

        fn set_audio_muted(&mut self, muted: bool) {
            self.record(Command::SetAudioMuted(muted));
        }

        fn capture(&mut self) -> Option<CapturedFrame> {
            self.record(Command::Capture);
            Some(CapturedFrame {
                width: 2,
                height: 2,
                pixels: vec![0; 16],
            })
        }

        fn destroy(&mut self) {
            if !self.destroyed {
                self.record(Command::Destroy);
                self.destroyed = true;
            }
        }
    }

    pub struct MockFactory {
        pub log: CommandLog,
        pub created: Cell<u32>,
        pub fail_next_create: Rc<Cell<bool>>,
        pub last_profile: RefCell<Option<SessionProfile>>,
    }

    impl MockFactory {
        pub fn new() -> (Self, CommandLog) {
            let log: CommandLog = Rc::new(RefCell::new(Vec::new()));
            let factory = Self {
                log: log.clone(),
                created: Cell::new(0),
                fail_next_create: Rc::new(Cell::new(false)),
                last_profile: RefCell::new(None),
            };
            (factory, log)
        }
    }

    impl EngineFactory for MockFactory {
        type Handle = MockEngine;

        fn create(&mut self, profile: &SessionProfile) -> Result<Self::Handle, EngineError> {
            if self.fail_next_create.replace(false) {
                return Err(EngineError::Backend("window destroyed".to_string()));
            }
            let generation = self.created.get() + 1;
            self.created.set(generation);
            *self.last_profile.borrow_mut() = Some(profile.clone());
            Ok(MockEngine {
                generation,
                log: self.log.clone(),
                history_back: Cell::new(false),
                history_forward: Cell::new(false),
                destroyed: false,
            })
        }
    }

    /// Commands as recorded, ignoring which generation issued them.
    pub fn commands(log: &CommandLog) -> Vec<Command> {
        log.borrow().iter().map(|(_, c)| c.clone()).collect()
    }
}
