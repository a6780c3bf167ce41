//! Timestamp sources.
//!
//! The CRDTs in this crate never read a clock; every mutation takes its
//! timestamp as an argument. A [`Clock`] supplies those timestamps for
//! callers who want the current time filled in, see
//! [`Replica`](crate::replica::Replica).

use chrono::Utc;

/// A source of totally ordered `u64` timestamps.
pub trait Clock {

    /// The timestamp for a new local operation.
    fn now(&mut self) -> u64;

    /// Record a timestamp seen on a remote replica.
    ///
    /// Clocks which can move forward should do so, so that local operations
    /// issued afterwards win over everything already observed.
    fn observe(&mut self, _timestamp: u64) {}
}

/// Wall-clock milliseconds since the Unix epoch.
///
/// Successive timestamps from one clock are strictly increasing, even if the
/// system clock stalls or steps backwards, so that two operations issued in
/// sequence by the same replica never tie. The clock saturates at
/// `u64::MAX`: once there, every further timestamp is `u64::MAX`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    last: u64,
}

impl SystemClock {
    pub fn new() -> SystemClock {
        SystemClock::default()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> u64 {
        let wall = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.last = wall.max(self.last.saturating_add(1));
        self.last
    }

    fn observe(&mut self, timestamp: u64) {
        self.last = self.last.max(timestamp);
    }
}

/// A Lamport clock.
///
/// Every local operation ticks the counter; observing a remote timestamp
/// moves the counter up to it. The counter saturates at `u64::MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LamportClock {
    counter: u64,
}

impl LamportClock {
    pub fn new() -> LamportClock {
        LamportClock::default()
    }

    /// The last timestamp handed out or observed.
    pub fn current(&self) -> u64 {
        self.counter
    }
}

impl Clock for LamportClock {
    fn now(&mut self) -> u64 {
        self.counter = self.counter.saturating_add(1);
        self.counter
    }

    fn observe(&mut self, timestamp: u64) {
        self.counter = self.counter.max(timestamp);
    }
}

#[cfg(test)]
mod test {

    use super::{Clock, LamportClock, SystemClock};

    /// Observed timestamps are kept to the lower half of the range, well
    /// below saturation.
    #[quickcheck]
    fn check_system_clock_is_strictly_increasing(observed: Vec<u64>) -> bool {
        let mut clock = SystemClock::new();
        let mut last = clock.now();
        observed.into_iter().all(|ts| {
            let ts = ts / 2;
            clock.observe(ts);
            let now = clock.now();
            let increasing = now > last && now > ts;
            last = now;
            increasing
        })
    }

    #[test]
    fn clocks_saturate() {
        let mut system = SystemClock::new();
        system.observe(u64::MAX);
        assert_eq!(u64::MAX, system.now());
        assert_eq!(u64::MAX, system.now());

        let mut lamport = LamportClock::new();
        lamport.observe(u64::MAX - 1);
        assert_eq!(u64::MAX, lamport.now());
        assert_eq!(u64::MAX, lamport.now());
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = chrono::Utc::now().timestamp_millis() as u64;
        let now = SystemClock::new().now();
        assert!(now >= before);
    }

    #[test]
    fn lamport_clock_ticks_and_observes() {
        let mut clock = LamportClock::new();
        assert_eq!(1, clock.now());
        assert_eq!(2, clock.now());

        clock.observe(10);
        assert_eq!(10, clock.current());
        assert_eq!(11, clock.now());

        clock.observe(3);
        assert_eq!(12, clock.now());
    }
}
