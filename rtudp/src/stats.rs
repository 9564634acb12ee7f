use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Per-endpoint counters and latency extrema, updated concurrently by the
/// caller thread and the dispatcher/reader workers.
///
/// Every field is an independent atomic; a [`PacketStats`] snapshot is
/// therefore consistent per-field but not necessarily across fields (a
/// concurrent writer may land between two loads). This matches the
/// looser-than-transactional guarantee documented for statistics reads.
#[derive(Debug, Default)]
pub struct Stats {
    n_packets_req: AtomicU64,
    n_packets_sent: AtomicU64,
    n_packets_rec: AtomicU64,
    n_rx_dropped: AtomicU64,
    n_tx_dropped: AtomicU64,
    n_send_ticks: AtomicU64,
    n_rec_ticks: AtomicU64,
    n_immediate_packets: AtomicU64,
    max_latency_ns: AtomicI64,
    min_latency_ns: AtomicI64,
    total_latency_ns: AtomicI64,
}

/// A point-in-time read of [`Stats`], with derived fields computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PacketStats {
    pub n_packets_req: u64,
    pub n_packets_sent: u64,
    pub n_packets_rec: u64,
    pub n_rx_packets_dropped: u64,
    pub n_tx_packets_dropped: u64,
    pub max_latency_ns: i64,
    pub min_latency_ns: i64,
    pub total_latency_ns: i64,
    pub avg_latency_ns: i64,
    pub n_send_ticks: u64,
    pub n_rec_ticks: u64,
    pub n_immediate_packets: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            min_latency_ns: AtomicI64::new(i64::MAX),
            ..Default::default()
        }
    }

    pub fn inc_packets_req(&self) {
        self.n_packets_req.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_packets_rec(&self) {
        self.n_packets_rec.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rx_dropped(&self) {
        self.n_rx_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tx_dropped(&self) {
        self.n_tx_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_send_ticks(&self) {
        self.n_send_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rec_ticks(&self) {
        self.n_rec_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_immediate_packets(&self) {
        self.n_immediate_packets.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful dispatch with the given non-negative scheduling
    /// slack (`dispatch_time - deadline`).
    pub fn record_sent(&self, latency_ns: i64) {
        debug_assert!(latency_ns >= 0, "dispatch observed before its deadline");

        self.n_packets_sent.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(latency_ns, Ordering::Relaxed);
        self.min_latency_ns.fetch_min(latency_ns, Ordering::Relaxed);
    }

    pub fn n_packets_sent(&self) -> u64 {
        self.n_packets_sent.load(Ordering::Relaxed)
    }

    pub fn n_tx_dropped(&self) -> u64 {
        self.n_tx_dropped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> PacketStats {
        let n_packets_sent = self.n_packets_sent.load(Ordering::Relaxed);
        let total_latency_ns = self.total_latency_ns.load(Ordering::Relaxed);
        let min_latency_ns = self.min_latency_ns.load(Ordering::Relaxed);

        PacketStats {
            n_packets_req: self.n_packets_req.load(Ordering::Relaxed),
            n_packets_sent,
            n_packets_rec: self.n_packets_rec.load(Ordering::Relaxed),
            n_rx_packets_dropped: self.n_rx_dropped.load(Ordering::Relaxed),
            n_tx_packets_dropped: self.n_tx_dropped.load(Ordering::Relaxed),
            max_latency_ns: self.max_latency_ns.load(Ordering::Relaxed),
            min_latency_ns: if min_latency_ns == i64::MAX { 0 } else { min_latency_ns },
            total_latency_ns,
            avg_latency_ns: total_latency_ns / (n_packets_sent.max(1) as i64),
            n_send_ticks: self.n_send_ticks.load(Ordering::Relaxed),
            n_rec_ticks: self.n_rec_ticks.load(Ordering::Relaxed),
            n_immediate_packets: self.n_immediate_packets.load(Ordering::Relaxed),
        }
    }
}
