//! # Lectern — embedded content surface controller
//!
//! Lifecycle, zoom and visibility controller for a sandboxed embedded
//! content surface hosted inside a native window, engine-agnostic behind
//! the [`engine::Engine`] seam.
//!
//! ## Module map
//!
//! - [`controller`] : The root [`controller::SurfaceController`] — owns the
//!   state and the live engine handle, exposes the host command API, feeds
//!   engine events into the state machine and pumps deferred actions.
//!
//! - [`state`] : The [`state::SurfaceState`] record — navigation phase enum,
//!   presentation settings, zoom factor/level lockstep, state epoch.
//!
//! - [`engine`] : The engine seam — [`engine::Engine`] handle trait,
//!   [`engine::EngineFactory`] for recreation, [`engine::EngineEvent`]
//!   lifecycle notifications, [`engine::SessionProfile`] isolation settings.
//!
//! - [`navigation`] : The engine-event state machine — phase transitions,
//!   failure taxonomy handling, zoom resend and emulation sync at `DomReady`.
//!
//! - [`emulation`] : Pinch-zoom viewport emulation math — pure decision
//!   function plus the guarded engine sync that never targets a dead DOM.
//!
//! - [`visibility`] : Placement and the late-hide protocol — off-canvas
//!   parking that keeps the old page rendered during a navigation wait,
//!   with the settled reveal afterwards.
//!
//! - [`bounds`] : Host-window geometry tracking and the ordered
//!   host-then-surface focus handoff after presentation changes.
//!
//! - [`recovery`] : The input-routing recovery workarounds — surface
//!   teardown/rebuild before CSS-zoom navigations, best-effort nudge
//!   otherwise.
//!
//! - [`timers`] : Epoch-stamped deferred actions; anything scheduled before
//!   a superseding state change is dropped instead of fired.
//!
//! - [`delegate`] : [`delegate::SurfaceDelegate`] — host-side notification
//!   sink with default no-op methods.
//!
//! - [`config`] : TOML configuration with panic-free loading and full
//!   defaults (timings, emulation policy, recovery policy, session).
//!
//! - [`error`] : Engine fault types and the load-failure taxonomy.

pub mod bounds;
pub mod config;
pub mod controller;
pub mod delegate;
pub mod emulation;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod recovery;
pub mod state;
pub mod timers;
pub mod visibility;

pub use config::Config;
pub use controller::{NavigationSettings, SurfaceController};
pub use delegate::SurfaceDelegate;
pub use engine::{Engine, EngineEvent, EngineFactory, SessionProfile};
pub use error::{EngineError, LoadError};
pub use state::{DeviceRect, NavPhase, SurfaceState};
