//! Suspension points of the poll-driven engine
//!
//! A phase stores the `Wait` it is parked on. Each tick the wait is elapsed
//! by the tick's time step, then checked; a ready wait lets the phase run
//! its next step in the same tick.

/// Collaborator or character a wait can block on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    Display,
    Deck,
    Attacker,
    Defender,
    /// Both characters
    Characters,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Wait {
    /// Not suspended
    #[default]
    None,
    /// Resume on the next tick
    Tick { elapsed: bool },
    /// Resume once the remaining time has run out; never on the tick that set it
    Seconds(f64),
    /// Resume as soon as the target is idle; checked immediately
    UntilIdle(Busy),
}

/// Remaining time below this counts as elapsed
const EPSILON: f64 = 1e-9;

impl Wait {
    pub fn tick() -> Self {
        Wait::Tick { elapsed: false }
    }

    /// Timed wait; non-positive durations do not suspend at all
    pub fn seconds(seconds: f64) -> Self {
        if seconds > 0.0 {
            Wait::Seconds(seconds)
        } else {
            Wait::None
        }
    }

    /// Account for a new tick of `dt` seconds
    pub fn elapse(&mut self, dt: f64) {
        match self {
            Wait::Tick { elapsed } => *elapsed = true,
            Wait::Seconds(remaining) => *remaining -= dt,
            Wait::None | Wait::UntilIdle(_) => {}
        }
    }

    /// Whether the engine may move on; `busy` is the state of the wait target
    pub fn is_ready(&self, busy: bool) -> bool {
        match *self {
            Wait::None => true,
            Wait::Tick { elapsed } => elapsed,
            Wait::Seconds(remaining) => remaining <= EPSILON,
            Wait::UntilIdle(_) => !busy,
        }
    }

    pub fn target(&self) -> Option<Busy> {
        match self {
            Wait::UntilIdle(target) => Some(*target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_waits_one_tick() {
        let mut wait = Wait::tick();
        assert!(!wait.is_ready(false));
        wait.elapse(0.0);
        assert!(wait.is_ready(false));
    }

    #[test]
    fn test_seconds_accumulate() {
        let mut wait = Wait::seconds(0.1);
        assert!(!wait.is_ready(false));
        for _ in 0..2 {
            wait.elapse(1.0 / 30.0);
            assert!(!wait.is_ready(false));
        }
        wait.elapse(1.0 / 30.0);
        assert!(wait.is_ready(false));
    }

    #[test]
    fn test_zero_seconds_does_not_suspend() {
        assert_eq!(Wait::seconds(0.0), Wait::None);
        assert_eq!(Wait::seconds(-1.0), Wait::None);
    }

    #[test]
    fn test_until_idle() {
        let wait = Wait::UntilIdle(Busy::Deck);
        assert!(!wait.is_ready(true));
        assert!(wait.is_ready(false));
        assert_eq!(wait.target(), Some(Busy::Deck));
        assert_eq!(Wait::tick().target(), None);
    }
}
