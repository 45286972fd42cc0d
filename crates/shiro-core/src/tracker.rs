//! Per-player sliding-window press counter with cooldown.
//!
//! Each press is timestamped and kept while it falls inside the half-open
//! window `(now - window, now]`. The number of surviving timestamps *is* the
//! player's progress. A completed activation calls [`PressTracker::reset`],
//! which discards the window and starts a cooldown during which presses are
//! thrown away entirely.
//!
//! State is created lazily on the first press and can be dropped at any time
//! with [`PressTracker::forget`]; orphaned entries are harmless.
//!
//! Calls for distinct players run concurrently. Calls for the same player are
//! expected to arrive in order from a single input stream.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use shiro_types::PlayerId;

use crate::clock::{Clock, SystemClock};
use crate::config::{DEFAULT_COOLDOWN_MS, DEFAULT_WINDOW_MS};

#[derive(Debug, Default)]
struct PressWindow {
    /// Oldest first, non-decreasing.
    presses: VecDeque<Instant>,
    cooldown_until: Option<Instant>,
}

impl PressWindow {
    fn in_cooldown(&self, now: Instant) -> bool {
        matches!(self.cooldown_until, Some(until) if now < until)
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        // Before the clock has run a full window nothing can be stale.
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        while self.presses.front().is_some_and(|t| *t <= cutoff) {
            self.presses.pop_front();
        }
    }
}

pub struct PressTracker {
    windows: DashMap<PlayerId, PressWindow>,
    window: Duration,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
}

impl PressTracker {
    /// Tracker with the reference timing (3s window, 2s cooldown) on wall time.
    pub fn new() -> Self {
        Self::with_timing(
            Duration::from_millis(DEFAULT_WINDOW_MS),
            Duration::from_millis(DEFAULT_COOLDOWN_MS),
            Arc::new(SystemClock),
        )
    }

    pub fn with_timing(window: Duration, cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            cooldown,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Record one press and return the resulting progress count.
    ///
    /// Returns 0 without recording anything while the player is cooling down.
    pub fn record_press(&self, player: PlayerId) -> usize {
        let now = self.clock.now();
        let mut entry = self.windows.entry(player).or_default();

        if entry.in_cooldown(now) {
            tracing::trace!(player = %player, "press discarded during cooldown");
            return 0;
        }
        entry.cooldown_until = None;

        entry.presses.push_back(now);
        entry.prune(now, self.window);
        entry.presses.len()
    }

    /// Discard the player's window and start the cooldown.
    pub fn reset(&self, player: PlayerId) {
        let until = self.clock.now() + self.cooldown;
        let mut entry = self.windows.entry(player).or_default();
        entry.presses.clear();
        entry.cooldown_until = Some(until);
    }

    /// Current progress without recording a press. 0 during cooldown.
    pub fn progress(&self, player: PlayerId) -> usize {
        let now = self.clock.now();
        match self.windows.get_mut(&player) {
            Some(mut entry) if !entry.in_cooldown(now) => {
                entry.prune(now, self.window);
                entry.presses.len()
            }
            _ => 0,
        }
    }

    pub fn in_cooldown(&self, player: PlayerId) -> bool {
        let now = self.clock.now();
        self.windows
            .get(&player)
            .is_some_and(|entry| entry.in_cooldown(now))
    }

    /// Drop all state for a player (e.g. on disconnect).
    pub fn forget(&self, player: PlayerId) {
        self.windows.remove(&player);
    }

    /// Number of players with live state.
    pub fn tracked_players(&self) -> usize {
        self.windows.len()
    }
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PressTracker")
            .field("window", &self.window)
            .field("cooldown", &self.cooldown)
            .field("tracked_players", &self.windows.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tracker() -> (PressTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        // Start well past one window so checked_sub never bottoms out.
        clock.advance_ms(10_000);
        let tracker = PressTracker::with_timing(
            Duration::from_millis(3000),
            Duration::from_millis(2000),
            clock.clone(),
        );
        (tracker, clock)
    }

    #[test]
    fn test_counts_presses_in_window() {
        let (tracker, clock) = tracker();
        let p = PlayerId::new();

        for expected in 1..=5 {
            assert_eq!(tracker.record_press(p), expected);
            clock.advance_ms(200);
        }
        assert_eq!(tracker.progress(p), 5);
    }

    #[test]
    fn test_old_presses_fall_out() {
        let (tracker, clock) = tracker();
        let p = PlayerId::new();

        tracker.record_press(p);
        clock.advance_ms(1000);
        tracker.record_press(p);
        clock.advance_ms(2500);

        // First press is 3.5s old, second 2.5s old
        assert_eq!(tracker.record_press(p), 2);
    }

    #[test]
    fn test_press_exactly_at_cutoff_is_dropped() {
        let (tracker, clock) = tracker();
        let p = PlayerId::new();

        tracker.record_press(p);
        clock.advance_ms(3000);
        assert_eq!(tracker.record_press(p), 1, "window is half-open at the old end");
    }

    #[test]
    fn test_press_just_inside_window_is_kept() {
        let (tracker, clock) = tracker();
        let p = PlayerId::new();

        tracker.record_press(p);
        clock.advance_ms(2999);
        assert_eq!(tracker.record_press(p), 2);
    }

    #[test]
    fn test_cooldown_discards_presses() {
        let (tracker, clock) = tracker();
        let p = PlayerId::new();

        tracker.record_press(p);
        tracker.record_press(p);
        tracker.reset(p);
        assert!(tracker.in_cooldown(p));

        clock.advance_ms(50);
        assert_eq!(tracker.record_press(p), 0);
        clock.advance_ms(1000);
        assert_eq!(tracker.record_press(p), 0);
        assert_eq!(tracker.progress(p), 0);

        // Cooldown ends exactly 2000ms after reset; discarded presses left no trace.
        clock.advance_ms(950);
        assert!(!tracker.in_cooldown(p));
        assert_eq!(tracker.record_press(p), 1);
    }

    #[test]
    fn test_never_reset_means_no_cooldown() {
        let (tracker, clock) = tracker();
        let p = PlayerId::new();

        for _ in 0..20 {
            tracker.record_press(p);
            clock.advance_ms(100);
        }
        assert!(!tracker.in_cooldown(p));
        assert!(tracker.record_press(p) > 10);
    }

    #[test]
    fn test_players_are_independent() {
        let (tracker, _clock) = tracker();
        let a = PlayerId::new();
        let b = PlayerId::new();

        tracker.record_press(a);
        tracker.record_press(a);
        tracker.reset(a);

        assert_eq!(tracker.record_press(b), 1);
        assert_eq!(tracker.record_press(a), 0);
        assert_eq!(tracker.tracked_players(), 2);
    }

    #[test]
    fn test_forget_drops_state() {
        let (tracker, _clock) = tracker();
        let p = PlayerId::new();

        tracker.record_press(p);
        tracker.reset(p);
        tracker.forget(p);

        assert_eq!(tracker.tracked_players(), 0);
        assert!(!tracker.in_cooldown(p));
        assert_eq!(tracker.record_press(p), 1);
    }

    #[test]
    fn test_progress_of_unknown_player() {
        let (tracker, _clock) = tracker();
        assert_eq!(tracker.progress(PlayerId::new()), 0);
        assert_eq!(tracker.tracked_players(), 0);
    }

    #[test]
    fn test_concurrent_players() {
        let (tracker, _clock) = tracker();
        let tracker = Arc::new(tracker);
        let players: Vec<PlayerId> = (0..8).map(|_| PlayerId::new()).collect();

        let handles: Vec<_> = players
            .iter()
            .map(|&p| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        tracker.record_press(p);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Clock never moved, so every press is still in the window.
        for p in players {
            assert_eq!(tracker.progress(p), 25);
        }
    }
}
