use std::time::{Duration, Instant};

/// Monotonic nanosecond time, anchored to an arbitrary epoch fixed at first use.
///
/// Deadlines and arrival stamps throughout this crate are `i64` nanosecond
/// offsets from that epoch rather than raw [`Instant`]s, so they are cheap to
/// compare, subtract, and carry across the inbox/outbox boundary without
/// dragging `Instant`'s opaque representation into every data structure.
pub struct Clock;

impl Clock {
    /// Current monotonic timestamp in nanoseconds since the process-wide epoch.
    pub fn now_ns() -> i64 {
        EPOCH.elapsed().as_nanos() as i64
    }

    /// Suspends the calling thread until `deadline_ns`, or returns immediately
    /// if the deadline has already passed.
    pub fn sleep_until_ns(deadline_ns: i64) {
        let now = Self::now_ns();
        if deadline_ns <= now {
            return;
        }

        std::thread::sleep(Duration::from_nanos((deadline_ns - now) as u64));
    }
}

static EPOCH: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);
