pub mod emulated;
pub mod socket;

use std::sync::Arc;

use crate::addr::EndpointAddr;
use crate::error::Result;
use crate::inbox::Inbox;
use crate::stats::Stats;

/// Whether a [`Transport::send`] call actually handed `payload` off to the
/// wire (or the peer's inbox), or silently dropped it as backpressure.
///
/// Distinguishing these is the caller's only way to know whether a send
/// counts towards `n_packets_sent` — folding both into a bare `Ok(())` would
/// double-book a dropped packet as also sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Dropped,
}

/// The single abstraction both backends satisfy.
///
/// Where the original implementation dispatched through an abstract base
/// class with per-language bindings to a socket or a queue, a [`Transport`]
/// is the one seam the [`crate::Endpoint`] façade depends on: it never knows
/// whether it is driving a kernel socket or an in-process emulation.
pub trait Transport: Send + Sync {
    /// Sends `payload` towards this transport's remote address.
    ///
    /// Transient backpressure (a full kernel send buffer, a full peer inbox)
    /// is not an error: the caller's `stats` are updated and
    /// [`SendOutcome::Dropped`] is returned rather than an `Err`, matching
    /// §7's policy that drops are observed, not raised.
    fn send(&self, payload: &[u8], stats: &Stats) -> Result<SendOutcome>;

    /// Drains whatever is immediately available from this transport into
    /// `inbox`, blocking for at most a short, backend-chosen interval. A
    /// no-op for the emulated backend, whose inbox is filled directly by
    /// peers' [`Transport::send`].
    fn recv_into_inbox(&self, inbox: &Arc<Inbox>, stats: &Stats) -> Result<()>;

    fn local_addr(&self) -> EndpointAddr;

    fn remote_addr(&self) -> EndpointAddr;
}
