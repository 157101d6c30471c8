//! Countdown between sets.
//!
//! The timer does not read a clock; it counts the one-second ticks it is
//! given. Backgrounding pauses it so the remaining time is frozen rather
//! than silently elapsing.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RestTimer {
    #[default]
    Idle,
    Running {
        remaining: u32,
    },
    Paused {
        remaining: u32,
    },
}

/// What a tick did to the timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Timer is idle or paused
    Ignored,
    Counting(u32),
    Finished,
}

impl RestTimer {
    /// Start (or restart) a countdown
    pub fn start(&mut self, seconds: u32) {
        *self = if seconds == 0 {
            RestTimer::Idle
        } else {
            RestTimer::Running { remaining: seconds }
        };
    }

    pub fn tick(&mut self) -> Tick {
        match *self {
            RestTimer::Running { remaining } if remaining <= 1 => {
                *self = RestTimer::Idle;
                Tick::Finished
            }
            RestTimer::Running { remaining } => {
                *self = RestTimer::Running {
                    remaining: remaining - 1,
                };
                Tick::Counting(remaining - 1)
            }
            RestTimer::Idle | RestTimer::Paused { .. } => Tick::Ignored,
        }
    }

    pub fn pause(&mut self) {
        if let RestTimer::Running { remaining } = *self {
            *self = RestTimer::Paused { remaining };
        }
    }

    pub fn resume(&mut self) {
        if let RestTimer::Paused { remaining } = *self {
            *self = RestTimer::Running { remaining };
        }
    }

    pub fn cancel(&mut self) {
        *self = RestTimer::Idle;
    }

    pub fn remaining(&self) -> Option<u32> {
        match *self {
            RestTimer::Idle => None,
            RestTimer::Running { remaining } | RestTimer::Paused { remaining } => Some(remaining),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RestTimer::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RestTimer::Running { .. })
    }
}
