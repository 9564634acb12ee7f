use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A packet the caller has scheduled for a future send.
#[derive(Debug, Clone)]
pub struct ScheduledPacket {
    pub deadline_ns: i64,
    pub payload: Vec<u8>,
}

/// Orders [`ScheduledPacket`]s for the outbox heap: earliest deadline first,
/// ties broken by insertion order so a burst of immediately-deadlined sends
/// keeps FIFO order.
struct HeapEntry {
    deadline_ns: i64,
    sequence: u64,
    packet: ScheduledPacket,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline_ns == other.deadline_ns && self.sequence == other.sequence
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap; invert so the earliest deadline (and,
        // among ties, the lowest sequence number) sorts to the top.
        other
            .deadline_ns
            .cmp(&self.deadline_ns)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

struct OutboxState {
    heap: BinaryHeap<HeapEntry>,
    next_sequence: u64,
}

/// Thread-safe, deadline-ordered priority queue of outbound packets.
///
/// A single [`parking_lot::Mutex`] guards the heap; [`Outbox::push`] signals
/// a [`parking_lot::Condvar`] so a dispatcher blocked in
/// [`Outbox::wait_for_work`] wakes promptly instead of polling on a fixed
/// interval.
pub struct Outbox {
    state: Mutex<OutboxState>,
    signal: Condvar,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OutboxState {
                heap: BinaryHeap::new(),
                next_sequence: 0,
            }),
            signal: Condvar::new(),
        }
    }

    pub fn push(&self, packet: ScheduledPacket) {
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        state.heap.push(HeapEntry {
            deadline_ns: packet.deadline_ns,
            sequence,
            packet,
        });

        drop(state);
        self.signal.notify_all();
    }

    /// Removes and returns the head packet iff its deadline has arrived.
    pub fn pop_ready(&self, now_ns: i64) -> Option<ScheduledPacket> {
        let mut state = self.state.lock();

        match state.heap.peek() {
            Some(top) if top.deadline_ns <= now_ns => state.heap.pop().map(|e| e.packet),
            _ => None,
        }
    }

    pub fn peek_deadline(&self) -> Option<i64> {
        self.state.lock().heap.peek().map(|e| e.deadline_ns)
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state.lock().heap.clear();
    }

    /// Blocks the dispatcher until either a packet is pushed or `timeout`
    /// elapses, whichever comes first. Used with a short bound (≤1ms) so an
    /// idle dispatcher still notices `running` flip to `false` promptly.
    pub fn wait_for_work(&self, timeout: Duration) {
        let mut state = self.state.lock();
        if !state.heap.is_empty() {
            return;
        }
        self.signal.wait_for(&mut state, timeout);
    }

    /// Sleeps until `timeout` elapses or a push re-arms the wait, whichever
    /// comes first — unlike [`Outbox::wait_for_work`], this always blocks, so
    /// the dispatcher's sleep-until-next-deadline (§4.6 step 4) notices a
    /// newly-pushed, earlier-deadline packet instead of sleeping past it.
    pub fn sleep_or_rearm(&self, timeout: Duration) {
        let mut state = self.state.lock();
        self.signal.wait_for(&mut state, timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkt(deadline_ns: i64, tag: u8) -> ScheduledPacket {
        ScheduledPacket {
            deadline_ns,
            payload: vec![tag],
        }
    }

    #[test]
    fn pops_in_deadline_order() {
        let outbox = Outbox::new();
        outbox.push(pkt(300, 3));
        outbox.push(pkt(100, 1));
        outbox.push(pkt(200, 2));

        assert_eq!(outbox.pop_ready(1_000).unwrap().payload, vec![1]);
        assert_eq!(outbox.pop_ready(1_000).unwrap().payload, vec![2]);
        assert_eq!(outbox.pop_ready(1_000).unwrap().payload, vec![3]);
    }

    #[test]
    fn ties_broken_by_insertion_order() {
        let outbox = Outbox::new();
        outbox.push(pkt(100, 1));
        outbox.push(pkt(100, 2));
        outbox.push(pkt(100, 3));

        assert_eq!(outbox.pop_ready(100).unwrap().payload, vec![1]);
        assert_eq!(outbox.pop_ready(100).unwrap().payload, vec![2]);
        assert_eq!(outbox.pop_ready(100).unwrap().payload, vec![3]);
    }

    #[test]
    fn does_not_pop_future_packets() {
        let outbox = Outbox::new();
        outbox.push(pkt(1_000_000, 1));

        assert!(outbox.pop_ready(0).is_none());
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn clear_empties_the_heap() {
        let outbox = Outbox::new();
        outbox.push(pkt(0, 1));
        outbox.push(pkt(0, 2));

        outbox.clear();

        assert!(outbox.is_empty());
        assert_eq!(outbox.peek_deadline(), None);
    }
}
