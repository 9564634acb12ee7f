use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::addr::{EndpointAddr, EndpointIdentity};
use crate::config::{Direction, EndpointConfig};
use crate::dispatcher;
use crate::error::{Error, Result};
use crate::inbox::Inbox;
use crate::outbox::{Outbox, ScheduledPacket};
use crate::reader;
use crate::registry;
use crate::stats::{PacketStats, Stats};
use crate::transport::emulated::EmulatedTransport;
use crate::transport::socket::SocketTransport;
use crate::transport::Transport;

/// How a bound-but-not-yet-running [`Endpoint`] will build its [`Transport`]
/// once [`Endpoint::init`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Socket,
    Emulated,
}

#[derive(Default)]
struct Workers {
    dispatcher: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

/// A configured local/remote address pair with its own workers and
/// statistics — the one type applications construct and drive.
///
/// `Endpoint` is the façade described in the design doc's §4.8: it owns an
/// outbox, holds the shared [`Transport`] once initialized, and spawns 0–2
/// worker threads on [`Endpoint::start`] depending on `direction`.
pub struct Endpoint {
    config: EndpointConfig,
    backend: Backend,
    direction: parking_lot::Mutex<Direction>,

    initialized: AtomicBool,
    running: Arc<AtomicBool>,

    transport: parking_lot::Mutex<Option<Arc<dyn Transport>>>,
    inbox: parking_lot::Mutex<Option<Arc<Inbox>>>,
    outbox: Arc<Outbox>,
    stats: Arc<Stats>,

    workers: parking_lot::Mutex<Workers>,
}

impl Endpoint {
    /// Builds an endpoint backed by a real kernel UDP socket.
    pub fn new_socket(config: EndpointConfig) -> Result<Self> {
        Self::new(config, Backend::Socket)
    }

    /// Builds an endpoint backed by the in-process emulation registry.
    pub fn new_emulated(config: EndpointConfig) -> Result<Self> {
        Self::new(config, Backend::Emulated)
    }

    fn new(config: EndpointConfig, backend: Backend) -> Result<Self> {
        config.validate()?;

        let direction = config.direction;

        Ok(Self {
            config,
            backend,
            direction: parking_lot::Mutex::new(direction),
            initialized: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
            transport: parking_lot::Mutex::new(None),
            inbox: parking_lot::Mutex::new(None),
            outbox: Arc::new(Outbox::new()),
            stats: Arc::new(Stats::new()),
            workers: parking_lot::Mutex::new(Workers::default()),
        })
    }

    /// Constructs a bidirectional pair of in-process emulated endpoints: `a`
    /// sends to `b`, `b` receives from `a` (§6, "Pair factory"). Either side
    /// can be switched to full duplex afterwards with [`Endpoint::set_direction`].
    pub fn emulated_pair(
        a: EndpointAddr,
        b: EndpointAddr,
        capacity: u32,
    ) -> Result<(Endpoint, Endpoint)> {
        let a_config = EndpointConfig::new(a.ip, a.port, b.ip, b.port)
            .with_direction(Direction::Send)
            .with_capacity(capacity);
        let b_config = EndpointConfig::new(b.ip, b.port, a.ip, a.port)
            .with_direction(Direction::Recv)
            .with_capacity(capacity);

        Ok((Endpoint::new_emulated(a_config)?, Endpoint::new_emulated(b_config)?))
    }

    pub fn local_addr(&self) -> EndpointAddr {
        EndpointAddr::new(self.config.local_ip, self.config.local_port)
    }

    pub fn remote_addr(&self) -> EndpointAddr {
        EndpointAddr::new(self.config.remote_ip, self.config.remote_port)
    }

    pub fn identity(&self) -> EndpointIdentity {
        EndpointIdentity {
            local: self.local_addr(),
            remote: self.remote_addr(),
        }
    }

    /// Overrides `direction` prior to [`Endpoint::start`] latching it — e.g.
    /// to upgrade a freshly-constructed pair to full duplex.
    pub fn set_direction(&self, direction: Direction) {
        *self.direction.lock() = direction;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Allocates the inbox and opens the transport. Idempotent only in the
    /// sense that repeated calls without an intervening [`Endpoint::close`]
    /// fail with [`Error::AlreadyInitialized`].
    pub fn init(&self) -> Result<()> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized);
        }

        let capacity = self.config.capacity as usize;
        let local = self.local_addr();

        let (inbox, transport): (Arc<Inbox>, Arc<dyn Transport>) = match self.backend {
            Backend::Socket => (
                Arc::new(Inbox::new(capacity)),
                Arc::new(SocketTransport::open(&self.config)?),
            ),
            Backend::Emulated => (
                registry::get_or_create(local.ip, local.port, capacity),
                Arc::new(EmulatedTransport::open(&self.config)?),
            ),
        };

        *self.inbox.lock() = Some(inbox);
        *self.transport.lock() = Some(transport);
        self.initialized.store(true, Ordering::Release);

        tracing::debug!(name = %self.config.name, local = %local, remote = %self.remote_addr(), "Initialized RtUdp endpoint");

        Ok(())
    }

    /// Idempotent: releases the transport. The inbox itself is left intact
    /// (for the emulation backend it lives on in the process-global registry
    /// so peers keep a working destination).
    pub fn close(&self) {
        if !self.initialized.swap(false, Ordering::AcqRel) {
            return;
        }

        *self.transport.lock() = None;
        tracing::debug!(local = %self.local_addr(), "Closed RtUdp endpoint");
    }

    /// Spawns the dispatcher and/or reader according to the latched
    /// `direction`.
    pub fn start(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyRunning);
        }

        let direction = *self.direction.lock();
        let transport = self
            .transport
            .lock()
            .clone()
            .expect("initialized endpoint always has a transport");
        let inbox = self
            .inbox
            .lock()
            .clone()
            .expect("initialized endpoint always has an inbox");

        let mut workers = self.workers.lock();

        if direction.spawns_dispatcher() {
            workers.dispatcher = Some(dispatcher::spawn(
                self.outbox.clone(),
                transport.clone(),
                self.stats.clone(),
                self.running.clone(),
                self.config.cpu,
            ));
        }

        if direction.spawns_reader() {
            workers.reader = Some(reader::spawn(
                transport,
                inbox,
                self.stats.clone(),
                self.running.clone(),
                self.config.cpu,
            ));
        }

        Ok(())
    }

    /// Signals workers to stop and joins them with a bounded wait. Residual
    /// outbox entries are discarded, matching §4.8.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        let mut workers = self.workers.lock();
        join_with_timeout(workers.dispatcher.take(), Duration::from_secs(1));
        join_with_timeout(workers.reader.take(), Duration::from_secs(1));

        self.outbox.clear();
    }

    /// Requires [`Endpoint::init`]. Schedules `payload` for dispatch at
    /// `deadline_ns`, or immediately (`Clock::now_ns()`) if omitted. Never
    /// blocks on the dispatcher.
    pub fn send_data(&self, payload: Vec<u8>, deadline_ns: Option<i64>) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let deadline_ns = deadline_ns.unwrap_or_else(crate::clock::Clock::now_ns);
        self.stats.inc_packets_req();
        self.outbox.push(ScheduledPacket { deadline_ns, payload });

        Ok(())
    }

    /// Requires [`Endpoint::init`]. Blocks up to `timeout_ns` for the next
    /// delivered packet.
    pub fn receive_data(&self, timeout_ns: i64) -> Result<(Vec<u8>, i64)> {
        let inbox = self.require_inbox()?;

        let timeout = Duration::from_nanos(timeout_ns.max(0) as u64);
        match inbox.get(timeout) {
            Some(packet) => {
                self.stats.inc_packets_rec();
                Ok((packet.payload, packet.arrival_ns))
            }
            None => Err(Error::Timeout),
        }
    }

    /// Requires [`Endpoint::init`]. Collects exactly `n` packets against a
    /// single shared deadline. On timeout, packets already pulled from the
    /// inbox during this call are discarded (not returned) — preserved from
    /// the original implementation's all-or-nothing batch semantics.
    pub fn receive_batch(&self, n: usize, timeout_ns: i64) -> Result<Vec<(Vec<u8>, i64)>> {
        let inbox = self.require_inbox()?;

        let deadline = std::time::Instant::now() + Duration::from_nanos(timeout_ns.max(0) as u64);
        let mut out = Vec::with_capacity(n);

        for _ in 0..n {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }

            match inbox.get(remaining) {
                Some(packet) => {
                    self.stats.inc_packets_rec();
                    out.push((packet.payload, packet.arrival_ns));
                }
                None => return Err(Error::Timeout),
            }
        }

        Ok(out)
    }

    pub fn get_packet_stats(&self) -> PacketStats {
        self.stats.snapshot()
    }

    pub fn get_send_length(&self) -> usize {
        self.outbox.len()
    }

    pub fn get_receive_length(&self) -> usize {
        self.inbox.lock().as_ref().map(|i| i.size()).unwrap_or(0)
    }

    /// Clears both the outbox and the inbox.
    pub fn purge(&self) {
        self.outbox.clear();
        if let Some(inbox) = self.inbox.lock().as_ref() {
            inbox.clear();
        }
    }

    fn require_inbox(&self) -> Result<Arc<Inbox>> {
        self.inbox
            .lock()
            .clone()
            .ok_or(Error::NotInitialized)
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.stop();
        self.close();
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match *self.direction.lock() {
            Direction::Send => "send",
            Direction::Recv => "recv",
            Direction::Full => "full",
        };
        let backend = match self.backend {
            Backend::Socket => "Socket",
            Backend::Emulated => "Emulated",
        };

        write!(f, "RtUdp{backend}[{direction}]({})", self.local_addr())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("local", &self.local_addr())
            .field("remote", &self.remote_addr())
            .field("backend", &self.backend)
            .field("initialized", &self.is_initialized())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Joins `handle` if it finishes within `timeout`, otherwise gives up and
/// lets the thread finish on its own. `std::thread::JoinHandle` has no
/// built-in timed join, so this polls `is_finished` at a fine interval —
/// worker loops are bounded by a ≤1ms tick, so this resolves promptly in
/// the common case and only hits the full timeout if a worker is wedged.
fn join_with_timeout(handle: Option<JoinHandle<()>>, timeout: Duration) {
    let Some(handle) = handle else { return };

    let deadline = std::time::Instant::now() + timeout;
    while !handle.is_finished() {
        if std::time::Instant::now() >= deadline {
            tracing::warn!("Worker thread did not stop within the join timeout");
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    let _ = handle.join();
}
