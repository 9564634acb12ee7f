use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::affinity;
use crate::inbox::Inbox;
use crate::stats::Stats;
use crate::transport::Transport;

/// Receive-side worker (socket backend only): repeatedly drains the
/// transport into the endpoint's own inbox.
///
/// A no-op for the emulated backend ([`crate::transport::emulated::EmulatedTransport::recv_into_inbox`]
/// never blocks), but still spawned uniformly so `direction` handling stays
/// backend-agnostic in the façade.
pub fn spawn(
    transport: Arc<dyn Transport>,
    inbox: Arc<Inbox>,
    stats: Arc<Stats>,
    running: Arc<AtomicBool>,
    cpu: i32,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("rtudp-reader".to_owned())
        .spawn(move || {
            affinity::pin_current_thread(cpu);
            run(transport.as_ref(), &inbox, &stats, &running);
        })
        .expect("spawning the reader thread should not fail")
}

fn run(transport: &dyn Transport, inbox: &Arc<Inbox>, stats: &Stats, running: &AtomicBool) {
    while running.load(Ordering::Acquire) {
        stats.inc_rec_ticks();

        if let Err(e) = transport.recv_into_inbox(inbox, stats) {
            tracing::warn!(error = %crate::error::err_with_sources(&e), "Reader transport recv failed fatally");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::transport::socket::SocketTransport;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn loopback_config(local_port: u16, remote_port: u16) -> EndpointConfig {
        EndpointConfig::new(
            Ipv4Addr::new(127, 0, 0, 1).into(),
            local_port,
            Ipv4Addr::new(127, 0, 0, 1).into(),
            remote_port,
        )
    }

    #[test]
    fn reader_deposits_received_packets_into_the_inbox() {
        let receiver = SocketTransport::open(&loopback_config(0, 0)).unwrap();
        let recv_port = receiver.bound_port();

        let sender = SocketTransport::open(&loopback_config(0, recv_port)).unwrap();

        let inbox = Arc::new(Inbox::new(8));
        let stats = Arc::new(Stats::new());
        let running = Arc::new(AtomicBool::new(true));

        let transport: Arc<dyn Transport> = Arc::new(receiver);
        let handle = spawn(transport, inbox.clone(), stats, running.clone(), -1);

        sender.send(b"read-me", &Stats::new()).unwrap();

        let delivered = inbox
            .get(Duration::from_secs(2))
            .expect("reader should deliver the packet");
        assert_eq!(delivered.payload, b"read-me");

        running.store(false, Ordering::Release);
        handle.join().unwrap();
    }
}
