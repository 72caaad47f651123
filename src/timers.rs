//! Epoch-stamped settle-delay scheduler.
//!
//! Everything in the controller runs on the host's single UI thread, so a
//! "timer" is just a deadline the host loop pumps past. Each scheduled
//! action captures the [`crate::state::SurfaceState`] epoch at schedule
//! time; if a later navigation, hide or recreation bumped the epoch before
//! the deadline fires, the action is stale and is dropped instead of acting
//! on superseded intent. Closure-captured state is never trusted blindly.

use std::time::{Duration, Instant};

use tracing::debug;

/// Deferred actions the controller knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Reveal the surface after emulation has been applied and the settle
    /// delay elapsed (show-after-emulation protocol).
    RevealAfterSettle,
    /// Second half of a focus handoff: refocus the surface after the host
    /// briefly held focus.
    FocusSurface,
    /// Best-effort input-routing nudge after `DomReady` in CSS-zoom mode.
    PostLoadNudge,
}

#[derive(Debug)]
struct Entry {
    due: Instant,
    epoch: u64,
    action: TimerAction,
}

/// Fire-and-forget deadline queue. No cancellation API: superseded entries
/// die by epoch mismatch when they come due.
#[derive(Debug, Default)]
pub struct Timers {
    entries: Vec<Entry>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, epoch: u64, action: TimerAction) {
        debug!(?action, epoch, delay_ms = delay.as_millis() as u64, "Timer scheduled");
        self.entries.push(Entry {
            due: now + delay,
            epoch,
            action,
        });
    }

    /// Removes every entry due at `now` and returns the actions whose epoch
    /// still matches `current_epoch`, in schedule order. Stale entries are
    /// dropped with a debug log.
    pub fn fire_due(&mut self, now: Instant, current_epoch: u64) -> Vec<TimerAction> {
        let mut fired = Vec::new();
        let mut remaining = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.due > now {
                remaining.push(entry);
            } else if entry.epoch == current_epoch {
                fired.push(entry.action);
            } else {
                debug!(
                    action = ?entry.action,
                    scheduled_epoch = entry.epoch,
                    current_epoch,
                    "Stale timer dropped"
                );
            }
        }
        self.entries = remaining;
        fired
    }

    /// Earliest pending deadline, for hosts that sleep between pumps.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_schedule_order() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(now, Duration::from_millis(10), 1, TimerAction::RevealAfterSettle);
        timers.schedule(now, Duration::from_millis(5), 1, TimerAction::FocusSurface);

        let fired = timers.fire_due(now + Duration::from_millis(20), 1);
        assert_eq!(
            fired,
            vec![TimerAction::RevealAfterSettle, TimerAction::FocusSurface]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn test_not_due_entries_stay_queued() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(now, Duration::from_millis(100), 1, TimerAction::PostLoadNudge);

        assert!(timers.fire_due(now + Duration::from_millis(50), 1).is_empty());
        assert!(!timers.is_empty());

        let fired = timers.fire_due(now + Duration::from_millis(100), 1);
        assert_eq!(fired, vec![TimerAction::PostLoadNudge]);
    }

    #[test]
    fn test_stale_epoch_is_dropped() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(now, Duration::from_millis(10), 1, TimerAction::RevealAfterSettle);

        // Epoch advanced before the deadline: the captured intent is dead.
        let fired = timers.fire_due(now + Duration::from_millis(20), 2);
        assert!(fired.is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_next_deadline_is_earliest() {
        let now = Instant::now();
        let mut timers = Timers::new();
        assert!(timers.next_deadline().is_none());

        timers.schedule(now, Duration::from_millis(100), 1, TimerAction::PostLoadNudge);
        timers.schedule(now, Duration::from_millis(40), 1, TimerAction::FocusSurface);
        assert_eq!(timers.next_deadline(), Some(now + Duration::from_millis(40)));
    }
}
