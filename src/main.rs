//! Lectern demo driver.
//!
//! Usage:
//!   lectern [URL]
//!
//! Examples:
//!   cargo run                          → drives https://example.com
//!   cargo run -- https://servo.org     → drives servo.org
//!   cargo run -- wikipedia.org         → adds https:// automatically
//!
//! There is no real engine here: the demo binds the controller to a tracing
//! engine that logs every command it would issue, then scripts a session —
//! show, navigate in visual-zoom mode, zoom to 2.5×, navigate again to
//! exercise the late-hide/reveal path — and pumps the timers to completion.

use std::env;
use std::error::Error;
use std::thread;
use std::time::Instant;

use tracing::info;
use url::Url;

use lectern::engine::{
    CapturedFrame, ContextMenuParams, Engine, EngineEvent, EngineFactory, InputEventParams,
    SessionProfile,
};
use lectern::state::device_rect;
use lectern::{
    Config, DeviceRect, EngineError, LoadError, NavigationSettings, SurfaceController,
    SurfaceDelegate,
};

/// Target when no URL is given on the command line.
const DEFAULT_URL: &str = "https://example.com";

fn main() -> Result<(), Box<dyn Error>> {
    // ── 1. Logging / tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ── 2. Configuration ───────────────────────────────────────────────
    let config = Config::load();

    // ── 3. Controller with the tracing engine ──────────────────────────
    let mut controller = SurfaceController::new(TracingFactory, LogDelegate, config)?;

    // ── 4. Scripted session ────────────────────────────────────────────
    let url = parse_url_from_args();
    info!(%url, "Demo session starting");

    controller.set_bounds(device_rect(0, 60, 1280, 660));
    controller.set_visible(true, false);

    controller.navigate_with_settings(
        url.as_str(),
        NavigationSettings {
            zoom_factor: 1.0,
            visual_zoom: true,
            mobile_mode: false,
            show_zoom_overlay: true,
        },
    );
    drive_load(&mut controller, &url);

    controller.set_zoom_factor(2.5);

    // Host window resize mid-session re-triggers the viewport math.
    controller.set_bounds(device_rect(0, 60, 1600, 840));

    // Second navigation over a loaded page exercises late-hide and the
    // settled reveal.
    let second = Url::parse("https://example.org/")?;
    info!(url = %second, "Second navigation");
    controller.navigate(second.as_str());
    drive_load(&mut controller, &second);

    pump_until_idle(&mut controller);
    info!(url = ?controller.url(), "Demo session finished");
    Ok(())
}

/// Feeds the lifecycle events a real engine would emit for a successful load.
fn drive_load(
    controller: &mut SurfaceController<TracingFactory, LogDelegate>,
    url: &Url,
) {
    controller.handle_engine_event(EngineEvent::LoadStarted { url: url.clone() });
    controller.handle_engine_event(EngineEvent::Committed { url: url.clone() });
    controller.handle_engine_event(EngineEvent::DomReady);
    controller.handle_engine_event(EngineEvent::Finished);
    controller.handle_engine_event(EngineEvent::TitleChanged(format!("Demo — {url}")));
}

/// Sleeps up to each pending deadline and pumps, until no timer remains.
fn pump_until_idle(controller: &mut SurfaceController<TracingFactory, LogDelegate>) {
    while let Some(deadline) = controller.next_timer_deadline() {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        controller.pump_timers(Instant::now());
    }
}

/// First CLI argument as a URL, prefixing `https://` when the scheme is
/// missing. Falls back to [`DEFAULT_URL`].
fn parse_url_from_args() -> Url {
    let raw = env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());
    match Url::parse(&raw) {
        Ok(url) => url,
        Err(_) => {
            let with_scheme = format!("https://{raw}");
            Url::parse(&with_scheme).unwrap_or_else(|_| {
                Url::parse(DEFAULT_URL).unwrap()
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing engine
// ─────────────────────────────────────────────────────────────────────────────

/// Logs every command the controller issues instead of rendering anything.
struct TracingEngine {
    generation: u32,
}

impl Engine for TracingEngine {
    fn load_url(&mut self, url: &Url) -> Result<(), EngineError> {
        info!(generation = self.generation, %url, "engine: load_url");
        Ok(())
    }

    fn load_html(&mut self, html: &str, base_url: Option<&Url>) -> Result<(), EngineError> {
        info!(generation = self.generation, len = html.len(), base = ?base_url.map(Url::as_str), "engine: load_html");
        Ok(())
    }

    fn clear_content(&mut self) -> Result<(), EngineError> {
        info!(generation = self.generation, "engine: clear_content");
        Ok(())
    }

    fn stop(&mut self) {
        info!(generation = self.generation, "engine: stop");
    }

    fn reload(&mut self) -> Result<(), EngineError> {
        info!(generation = self.generation, "engine: reload");
        Ok(())
    }

    fn go_back(&mut self) -> bool {
        info!(generation = self.generation, "engine: go_back");
        false
    }

    fn go_forward(&mut self) -> bool {
        info!(generation = self.generation, "engine: go_forward");
        false
    }

    fn can_go_back(&self) -> bool {
        false
    }

    fn can_go_forward(&self) -> bool {
        false
    }

    fn set_placement(&mut self, rect: DeviceRect) -> Result<(), EngineError> {
        info!(generation = self.generation, ?rect, "engine: set_placement");
        Ok(())
    }

    fn focus(&mut self) {
        info!(generation = self.generation, "engine: focus");
    }

    fn focus_host(&mut self) {
        info!(generation = self.generation, "engine: focus_host");
    }

    fn set_zoom_factor(&mut self, factor: f64) -> Result<(), EngineError> {
        info!(generation = self.generation, factor, "engine: set_zoom_factor");
        Ok(())
    }

    fn set_css_zoom(&mut self, level: f64) -> Result<(), EngineError> {
        info!(generation = self.generation, level, "engine: set_css_zoom");
        Ok(())
    }

    fn apply_emulation(
        &mut self,
        params: &lectern::emulation::EmulationParams,
    ) -> Result<(), EngineError> {
        info!(
            generation = self.generation,
            width = params.width,
            height = params.height,
            scale = params.scale,
            mobile = params.mobile,
            "engine: apply_emulation"
        );
        Ok(())
    }

    fn clear_emulation(&mut self) -> Result<(), EngineError> {
        info!(generation = self.generation, "engine: clear_emulation");
        Ok(())
    }

    fn notify_zoom_level(&mut self, level: f64, show_overlay: bool) {
        info!(generation = self.generation, level, show_overlay, "engine: notify_zoom_level");
    }

    fn reinstall_input_listeners(&mut self) {
        info!(generation = self.generation, "engine: reinstall_input_listeners");
    }

    fn set_audio_muted(&mut self, muted: bool) {
        info!(generation = self.generation, muted, "engine: set_audio_muted");
    }

    fn capture(&mut self) -> Option<CapturedFrame> {
        None
    }

    fn destroy(&mut self) {
        info!(generation = self.generation, "engine: destroy");
    }
}

struct TracingFactory;

impl EngineFactory for TracingFactory {
    type Handle = TracingEngine;

    fn create(&mut self, profile: &SessionProfile) -> Result<Self::Handle, EngineError> {
        static NEXT: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(1);
        let generation = NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        info!(
            generation,
            partition = %profile.partition,
            sandboxed = profile.sandboxed,
            "engine: surface created"
        );
        Ok(TracingEngine { generation })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host delegate
// ─────────────────────────────────────────────────────────────────────────────

/// Prints host notifications the way a chrome layer would consume them.
struct LogDelegate;

impl SurfaceDelegate for LogDelegate {
    fn notify_loading(&self, loading: bool) {
        info!(loading, "host: loading indicator");
    }

    fn notify_loaded(&self, url: &Url) {
        info!(%url, "host: page loaded");
    }

    fn notify_navigated(&self, url: &Url) {
        info!(%url, "host: address bar update");
    }

    fn notify_load_error(&self, error: &LoadError) {
        info!(code = error.code, url = %error.url, "host: load error page");
    }

    fn notify_title_changed(&self, title: &str) {
        info!(title, "host: window title update");
    }

    fn notify_context_menu(&self, params: &ContextMenuParams) {
        info!(x = params.x, y = params.y, "host: context menu");
    }

    fn notify_input_event(&self, params: &InputEventParams) {
        info!(kind = ?params.kind, "host: input event");
    }
}
