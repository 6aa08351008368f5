//! One-shot question countdown
//!
//! The countdown is a small state machine driven by the embedder: call
//! [`Timer::tick`] once per second or hand wall-clock time to
//! [`Timer::advance`]. Nothing here sleeps or spawns.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

/// The state of a countdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "remaining", rename_all = "snake_case")]
pub enum Countdown {
    /// Not started
    #[default]
    Idle,
    /// Counting down, with whole seconds left
    Running(u64),
    /// Reached zero; stays here until reset
    Expired,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown has not been started
    Idle,
    /// One second passed, this many remain
    Running(u64),
    /// The countdown just reached zero
    Expired,
    /// The countdown had already expired; nothing happened
    Stopped,
}

/// A countdown of whole seconds that expires exactly once
#[derive(Debug, Clone)]
pub struct Timer {
    length: u64,
    state: Countdown,
    carry: Duration,
}

impl Timer {
    /// Creates an idle countdown of the given length, in whole seconds
    pub fn new(length: Duration) -> Self {
        Self {
            length: length.as_secs(),
            state: Countdown::Idle,
            carry: Duration::ZERO,
        }
    }

    /// The current state
    pub fn state(&self) -> Countdown {
        self.state
    }

    /// Seconds left to display; the full length while idle and zero once
    /// expired
    pub fn remaining(&self) -> u64 {
        match self.state {
            Countdown::Idle => self.length,
            Countdown::Running(n) => n,
            Countdown::Expired => 0,
        }
    }

    /// Checks if the countdown is in progress
    pub fn is_running(&self) -> bool {
        matches!(self.state, Countdown::Running(_))
    }

    /// Starts an idle countdown
    ///
    /// Returns `None`, leaving the state untouched, if the countdown is
    /// already running or expired. Otherwise behaves like
    /// [`Timer::restart`].
    pub fn start(&mut self) -> Option<Tick> {
        (self.state == Countdown::Idle).then(|| self.restart())
    }

    /// Starts over from the full length whatever the current state
    ///
    /// A zero length countdown expires right away and returns
    /// [`Tick::Expired`], so callers handle expiry the same way as for
    /// [`Timer::tick`].
    pub fn restart(&mut self) -> Tick {
        self.carry = Duration::ZERO;
        if self.length == 0 {
            self.state = Countdown::Expired;
            Tick::Expired
        } else {
            self.state = Countdown::Running(self.length);
            Tick::Running(self.length)
        }
    }

    /// Returns to idle
    pub fn reset(&mut self) {
        self.carry = Duration::ZERO;
        self.state = Countdown::Idle;
    }

    /// Counts down one second
    pub fn tick(&mut self) -> Tick {
        match self.state {
            Countdown::Idle => Tick::Idle,
            Countdown::Expired => Tick::Stopped,
            Countdown::Running(n) => match n.saturating_sub(1) {
                0 => {
                    self.state = Countdown::Expired;
                    Tick::Expired
                }
                left => {
                    self.state = Countdown::Running(left);
                    Tick::Running(left)
                }
            },
        }
    }

    /// Feeds elapsed wall-clock time, ticking once per whole second
    ///
    /// Sub-second remainders carry over to the next call. Returns `true` if
    /// the countdown expired during this call.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.is_running() {
            return false;
        }
        self.carry += elapsed;
        while self.carry >= Duration::from_secs(1) {
            self.carry -= Duration::from_secs(1);
            match self.tick() {
                Tick::Expired => {
                    self.carry = Duration::ZERO;
                    return true;
                }
                Tick::Running(_) => {}
                Tick::Idle | Tick::Stopped => break,
            }
        }
        false
    }
}

/// Measures wall-clock time between calls, in the browser as on native
///
/// Meant to feed [`Timer::advance`] from an event loop that wakes up at
/// irregular intervals.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    last: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Starts measuring from now
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Time since the previous lap, or since creation for the first one
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }
}
