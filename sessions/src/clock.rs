//! Per-side countdown clock.
//!
//! The clock does not own a timer; the hosting application calls [`tick`] once
//! per second while a timed game runs. A missed tick is not reconciled, drift
//! is accepted.
//!
//! [`tick`]: ClockManager::tick

use chess::PlayerSide;

/// Label for a time control, used in saved game records.
pub fn time_control_label(initial_seconds: Option<u64>) -> &'static str {
    match initial_seconds {
        None => "Standard",
        Some(s) if s <= 120 => "Bullet",
        Some(s) if s <= 300 => "Blitz",
        Some(s) if s <= 900 => "Rapid",
        Some(_) => "Standard",
    }
}

/// Countdown state for both sides.
///
/// An unlimited clock (started with `None`) is decorative: it runs but never
/// decrements and never expires.
#[derive(Debug, Clone)]
pub struct ClockManager {
    white_remaining: u64,
    black_remaining: u64,
    turn: PlayerSide,
    running: bool,
    limited: bool,
    expired: bool,
}

impl ClockManager {
    /// Start a clock with the given per-side budget, White to move.
    pub fn start(initial_seconds: Option<u64>) -> Self {
        let budget = initial_seconds.unwrap_or(0);
        Self {
            white_remaining: budget,
            black_remaining: budget,
            turn: PlayerSide::White,
            running: true,
            limited: initial_seconds.is_some(),
            expired: false,
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Hand the clock to the side now on move.
    pub fn set_turn(&mut self, side: PlayerSide) {
        self.turn = side;
    }

    pub fn turn(&self) -> PlayerSide {
        self.turn
    }

    /// One second elapses for the side on move. Returns the expired side the
    /// single time a flag falls; the clock stops itself at that point.
    pub fn tick(&mut self) -> Option<PlayerSide> {
        if !self.running || !self.limited {
            return None;
        }

        let remaining = match self.turn {
            PlayerSide::White => &mut self.white_remaining,
            PlayerSide::Black => &mut self.black_remaining,
        };
        *remaining = remaining.saturating_sub(1);

        if *remaining == 0 && !self.expired {
            self.expired = true;
            self.running = false;
            return Some(self.turn);
        }
        None
    }

    pub fn remaining(&self, side: PlayerSide) -> u64 {
        match side {
            PlayerSide::White => self.white_remaining,
            PlayerSide::Black => self.black_remaining,
        }
    }

    /// mm:ss display string; unlimited clocks render as `--:--`.
    pub fn formatted(&self, side: PlayerSide) -> String {
        if !self.limited {
            return "--:--".to_string();
        }
        let remaining = self.remaining(side);
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_decrements_side_on_move() {
        let mut clock = ClockManager::start(Some(65));
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(PlayerSide::White), 64);
        assert_eq!(clock.remaining(PlayerSide::Black), 65);
        assert_eq!(clock.formatted(PlayerSide::White), "01:04");
    }

    #[test]
    fn test_expiry_fires_exactly_once() {
        let mut clock = ClockManager::start(Some(2));
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.tick(), Some(PlayerSide::White));
        assert!(!clock.is_running());
        // The clock has stopped; further ticks do nothing.
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(PlayerSide::White), 0);
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut clock = ClockManager::start(Some(1));
        assert_eq!(clock.tick(), Some(PlayerSide::White));
        for _ in 0..5 {
            clock.tick();
        }
        assert_eq!(clock.remaining(PlayerSide::White), 0);
        assert_eq!(clock.formatted(PlayerSide::White), "00:00");
    }

    #[test]
    fn test_unlimited_clock_never_expires() {
        let mut clock = ClockManager::start(None);
        for _ in 0..1000 {
            assert_eq!(clock.tick(), None);
        }
        assert_eq!(clock.formatted(PlayerSide::White), "--:--");
    }

    #[test]
    fn test_turn_switch_charges_the_other_side() {
        let mut clock = ClockManager::start(Some(60));
        clock.tick();
        clock.set_turn(PlayerSide::Black);
        clock.tick();
        assert_eq!(clock.remaining(PlayerSide::White), 59);
        assert_eq!(clock.remaining(PlayerSide::Black), 59);
    }

    #[test]
    fn test_stopped_clock_does_not_tick() {
        let mut clock = ClockManager::start(Some(60));
        clock.stop();
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(PlayerSide::White), 60);
    }

    #[test]
    fn test_time_control_labels() {
        assert_eq!(time_control_label(None), "Standard");
        assert_eq!(time_control_label(Some(60)), "Bullet");
        assert_eq!(time_control_label(Some(180)), "Blitz");
        assert_eq!(time_control_label(Some(600)), "Rapid");
        assert_eq!(time_control_label(Some(3600)), "Standard");
    }
}
