use std::sync::Arc;

use crate::addr::EndpointAddr;
use crate::config::EndpointConfig;
use crate::error::Result;
use crate::inbox::{DeliveredPacket, Inbox};
use crate::registry;
use crate::stats::Stats;

use super::{SendOutcome, Transport};

/// In-process emulation backend.
///
/// `send` resolves the destination's inbox through the process-global
/// [`registry`] and writes into it directly — there is no kernel socket, no
/// serialization, and no network stack involved. This produces delivery
/// semantics a caller cannot distinguish from [`super::socket::SocketTransport`]:
/// the same bounded-drop, same-ordering contract, just without leaving the
/// process.
pub struct EmulatedTransport {
    local: EndpointAddr,
    remote: EndpointAddr,
    remote_inbox: Arc<Inbox>,
}

impl EmulatedTransport {
    /// `local_inbox` is the endpoint's own inbox (already registered by the
    /// façade before workers start); this only needs to resolve the peer's.
    pub fn open(config: &EndpointConfig) -> Result<Self> {
        let local = EndpointAddr::new(config.local_ip, config.local_port);
        let remote = EndpointAddr::new(config.remote_ip, config.remote_port);

        let remote_inbox = registry::get_or_create(remote.ip, remote.port, config.capacity as usize);

        Ok(Self {
            local,
            remote,
            remote_inbox,
        })
    }
}

impl Transport for EmulatedTransport {
    fn send(&self, payload: &[u8], stats: &Stats) -> Result<SendOutcome> {
        let delivered = DeliveredPacket {
            payload: payload.to_vec(),
            arrival_ns: crate::clock::Clock::now_ns(),
        };

        if self.remote_inbox.try_put(delivered) {
            return Ok(SendOutcome::Delivered);
        }

        stats.inc_tx_dropped();
        tracing::trace!(local = %self.local, remote = %self.remote, "Dropped outbound packet: peer inbox full");
        Ok(SendOutcome::Dropped)
    }

    /// Nothing to poll: the endpoint's own inbox is populated directly by
    /// peers' `send`. Still sleeps a tick so the reader loop ticks at a
    /// bounded rate instead of spinning.
    fn recv_into_inbox(&self, _inbox: &Arc<Inbox>, _stats: &Stats) -> Result<()> {
        std::thread::sleep(std::time::Duration::from_millis(1));
        Ok(())
    }

    fn local_addr(&self) -> EndpointAddr {
        self.local
    }

    fn remote_addr(&self) -> EndpointAddr {
        self.remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn config(local_port: u16, remote_port: u16) -> EndpointConfig {
        EndpointConfig::new(
            Ipv4Addr::new(127, 10, 0, 1).into(),
            local_port,
            Ipv4Addr::new(127, 10, 0, 2).into(),
            remote_port,
        )
        .with_capacity(4)
    }

    #[test]
    fn send_lands_directly_in_peers_registered_inbox() {
        let sender = EmulatedTransport::open(&config(6000, 6001)).unwrap();
        let peer_inbox = registry::get_or_create(Ipv4Addr::new(127, 10, 0, 2).into(), 6001, 4);

        let stats = Stats::new();
        assert_eq!(sender.send(b"hi", &stats).unwrap(), SendOutcome::Delivered);

        let delivered = peer_inbox.get(Duration::from_millis(100)).unwrap();
        assert_eq!(delivered.payload, b"hi");
    }

    #[test]
    fn full_peer_inbox_counts_as_a_tx_drop() {
        let sender = EmulatedTransport::open(&config(6010, 6011)).unwrap();
        let stats = Stats::new();

        for _ in 0..4 {
            assert_eq!(sender.send(b"x", &stats).unwrap(), SendOutcome::Delivered);
        }
        assert_eq!(sender.send(b"overflow", &stats).unwrap(), SendOutcome::Dropped);

        assert_eq!(stats.n_tx_dropped(), 1);
    }
}
