use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::affinity;
use crate::clock::Clock;
use crate::outbox::Outbox;
use crate::stats::Stats;
use crate::transport::{SendOutcome, Transport};

/// Upper bound on how long the dispatcher blocks waiting on the outbox
/// condition variable before re-checking `running`, so an idle, empty
/// outbox still notices `stop()` promptly.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Send-side worker: drains outbox entries whose deadline has arrived,
/// hands each to the transport, and updates statistics.
///
/// Spawned by [`crate::Endpoint::start`] for `direction ∈ {Send, Full}`.
pub fn spawn(
    outbox: Arc<Outbox>,
    transport: Arc<dyn Transport>,
    stats: Arc<Stats>,
    running: Arc<AtomicBool>,
    cpu: i32,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("rtudp-dispatcher".to_owned())
        .spawn(move || {
            affinity::pin_current_thread(cpu);
            run(&outbox, transport.as_ref(), &stats, &running);
        })
        .expect("spawning the dispatcher thread should not fail")
}

fn run(outbox: &Outbox, transport: &dyn Transport, stats: &Stats, running: &AtomicBool) {
    while running.load(Ordering::Acquire) {
        stats.inc_send_ticks();

        outbox.wait_for_work(IDLE_POLL_INTERVAL);

        let now = Clock::now_ns();
        while let Some(packet) = outbox.pop_ready(now) {
            if packet.deadline_ns < now {
                stats.inc_immediate_packets();
            }

            match transport.send(&packet.payload, stats) {
                Ok(SendOutcome::Delivered) => {
                    let latency_ns = now - packet.deadline_ns;
                    stats.record_sent(latency_ns);
                }
                Ok(SendOutcome::Dropped) => {
                    // Transport already recorded the drop against `stats`.
                }
                Err(e) => {
                    tracing::warn!(error = %crate::error::err_with_sources(&e), "Dispatcher transport send failed fatally");
                    return;
                }
            }
        }

        if let Some(next_deadline) = outbox.peek_deadline() {
            let now = Clock::now_ns();
            if next_deadline > now {
                outbox.sleep_or_rearm(Duration::from_nanos((next_deadline - now) as u64));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::emulated::EmulatedTransport;
    use crate::config::EndpointConfig;
    use crate::outbox::ScheduledPacket;
    use crate::registry;
    use std::net::Ipv4Addr;
    use std::time::Duration as StdDuration;

    #[test]
    fn dispatches_ready_packet_and_records_nonnegative_latency() {
        let config = EndpointConfig::new(
            Ipv4Addr::new(127, 20, 0, 1).into(),
            7000,
            Ipv4Addr::new(127, 20, 0, 2).into(),
            7001,
        )
        .with_capacity(8);

        let transport: Arc<dyn Transport> = Arc::new(EmulatedTransport::open(&config).unwrap());
        let peer_inbox = registry::get_or_create(Ipv4Addr::new(127, 20, 0, 2).into(), 7001, 8);

        let outbox = Arc::new(Outbox::new());
        let stats = Arc::new(Stats::new());
        let running = Arc::new(AtomicBool::new(true));

        outbox.push(ScheduledPacket {
            deadline_ns: Clock::now_ns(),
            payload: vec![42],
        });

        let handle = spawn(outbox.clone(), transport, stats.clone(), running.clone(), -1);

        let delivered = peer_inbox
            .get(StdDuration::from_secs(2))
            .expect("packet delivered within two seconds");
        assert_eq!(delivered.payload, vec![42]);

        running.store(false, Ordering::Release);
        handle.join().unwrap();

        let snap = stats.snapshot();
        assert_eq!(snap.n_packets_sent, 1);
        assert!(snap.max_latency_ns >= 0);
    }
}
