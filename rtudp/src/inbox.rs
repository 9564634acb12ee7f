use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A packet delivered to the local endpoint, stamped with its arrival time.
#[derive(Debug, Clone)]
pub struct DeliveredPacket {
    pub payload: Vec<u8>,
    pub arrival_ns: i64,
}

struct InboxState {
    queue: VecDeque<DeliveredPacket>,
    capacity: usize,
}

/// A fixed-capacity, thread-safe FIFO of delivered packets.
///
/// Both the socket reader and the emulated transport's `send` write into an
/// [`Inbox`] via [`Inbox::try_put`]; the owning endpoint (or, in emulation, a
/// peer endpoint) drains it via [`Inbox::get`]. A full inbox never blocks the
/// writer — it reports the drop back to the caller, who is responsible for
/// incrementing the appropriate drop counter.
pub struct Inbox {
    state: Mutex<InboxState>,
    signal: Condvar,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(InboxState {
                queue: VecDeque::with_capacity(capacity.min(4096)),
                capacity,
            }),
            signal: Condvar::new(),
        }
    }

    /// Attempts to enqueue `packet`. Returns `false` without blocking if the
    /// inbox is already at `capacity`.
    pub fn try_put(&self, packet: DeliveredPacket) -> bool {
        let mut state = self.state.lock();
        if state.queue.len() >= state.capacity {
            return false;
        }

        state.queue.push_back(packet);
        drop(state);
        self.signal.notify_one();
        true
    }

    /// Blocks up to `timeout` for a packet to become available.
    pub fn get(&self, timeout: Duration) -> Option<DeliveredPacket> {
        let mut state = self.state.lock();

        if let Some(packet) = state.queue.pop_front() {
            return Some(packet);
        }

        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return state.queue.pop_front();
            }

            let timed_out = self.signal.wait_for(&mut state, remaining).timed_out();
            if let Some(packet) = state.queue.pop_front() {
                return Some(packet);
            }
            if timed_out {
                return None;
            }
        }
    }

    pub fn size(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn clear(&self) {
        self.state.lock().queue.clear();
    }
}
