//! Logical clock and ACK deadlines.
//!
//! Timeouts in this crate are measured in *ticks*, not wall-clock time.  The
//! scheduler advances the clock once per cycle; engines only read the current
//! value and compare it against a previously captured [`Deadline`].  Any
//! monotonic, externally advanced counter satisfies the [`Clock`] contract.

/// One unit of the logical clock.
pub type Tick = u64;

/// Read-only access to a monotonic tick counter.
pub trait Clock {
    fn now(&self) -> Tick;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// A manually advanced tick counter owned by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounter {
    ticks: Tick,
}

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `ticks` instead of zero.
    pub fn starting_at(ticks: Tick) -> Self {
        Self { ticks }
    }

    /// Advance by one tick and return the new value.
    pub fn advance(&mut self) -> Tick {
        self.advance_by(1)
    }

    /// Advance by `n` ticks, saturating at `Tick::MAX`.
    pub fn advance_by(&mut self, n: Tick) -> Tick {
        self.ticks = self.ticks.saturating_add(n);
        self.ticks
    }
}

impl Clock for TickCounter {
    fn now(&self) -> Tick {
        self.ticks
    }
}

/// An absolute tick at which a wait expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Tick);

impl Deadline {
    /// Deadline `period` ticks after `now`.
    pub fn after(now: Tick, period: Tick) -> Self {
        Self(now.saturating_add(period))
    }

    pub fn at(&self) -> Tick {
        self.0
    }

    /// `true` once `now >= deadline`.
    pub fn expired(&self, now: Tick) -> bool {
        now >= self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_advances_monotonically() {
        let mut clock = TickCounter::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance_by(9), 10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn counter_saturates() {
        let mut clock = TickCounter::starting_at(Tick::MAX - 1);
        clock.advance_by(5);
        assert_eq!(clock.now(), Tick::MAX);
    }

    #[test]
    fn deadline_expires_at_boundary() {
        let d = Deadline::after(6, 100);
        assert_eq!(d.at(), 106);
        assert!(!d.expired(105));
        assert!(d.expired(106));
        assert!(d.expired(500));
    }

    #[test]
    fn clock_through_reference() {
        fn read<C: Clock>(clock: C) -> Tick {
            clock.now()
        }
        let clock = TickCounter::starting_at(42);
        assert_eq!(read(&clock), 42);
    }
}
