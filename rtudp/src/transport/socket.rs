use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Socket, Type};

use crate::addr::EndpointAddr;
use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::inbox::{DeliveredPacket, Inbox};
use crate::stats::Stats;

use super::{SendOutcome, Transport};

/// How long [`SocketTransport::recv_into_inbox`] sleeps before returning when
/// the socket has nothing to read, bounding how quickly the reader notices a
/// `stop()` request.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(50);

const MAX_DATAGRAM: usize = 65536;

/// Real kernel UDP socket backend.
///
/// Grounded in the non-blocking `socket2`-based construction used throughout
/// the teacher's `socket-factory` crate: a `SOCK_DGRAM` socket with
/// `SO_REUSEADDR`, optionally bound to `local` and optionally connected to
/// `remote`, left in non-blocking mode so send and receive are both
/// poll-driven rather than kernel-blocking.
pub struct SocketTransport {
    socket: Socket,
    local: EndpointAddr,
    remote: EndpointAddr,
    connected: bool,
}

impl SocketTransport {
    pub fn open(config: &EndpointConfig) -> Result<Self> {
        let local = EndpointAddr::new(config.local_ip, config.local_port);
        let remote = EndpointAddr::new(config.remote_ip, config.remote_port);

        let socket = Socket::new(Domain::for_address(local.into()), Type::DGRAM, None)
            .map_err(|e| fatal(local, e))?;

        socket.set_reuse_address(true).map_err(|e| fatal(local, e))?;
        socket.set_nonblocking(true).map_err(|e| fatal(local, e))?;

        if config.bind {
            let bind_addr: SocketAddr = local.into();
            socket
                .bind(&bind_addr.into())
                .map_err(|e| fatal(local, e))?;
        }

        if config.connect {
            let remote_addr: SocketAddr = remote.into();
            socket
                .connect(&remote_addr.into())
                .map_err(|e| fatal(local, e))?;
        }

        tracing::debug!(name = %config.name, %local, %remote, "Opened RtUdp socket transport");

        Ok(Self {
            socket,
            local,
            remote,
            connected: config.connect,
        })
    }
}

impl Transport for SocketTransport {
    fn send(&self, payload: &[u8], stats: &Stats) -> Result<SendOutcome> {
        let result = if self.connected {
            self.socket.send(payload)
        } else {
            let remote_addr: SocketAddr = self.remote.into();
            self.socket.send_to(payload, &remote_addr.into())
        };

        match result {
            Ok(_) => Ok(SendOutcome::Delivered),
            Err(e) if is_transient_send_error(&e) => {
                stats.inc_tx_dropped();
                tracing::trace!(local = %self.local, remote = %self.remote, error = %e, "Dropped outbound packet");
                Ok(SendOutcome::Dropped)
            }
            Err(e) => Err(fatal(self.local, e)),
        }
    }

    fn recv_into_inbox(&self, inbox: &Arc<Inbox>, stats: &Stats) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM];

        loop {
            match self.socket.recv(uninit(&mut buf)) {
                Ok(n) => {
                    let arrival_ns = crate::clock::Clock::now_ns();
                    let delivered = DeliveredPacket {
                        payload: buf[..n].to_vec(),
                        arrival_ns,
                    };

                    if !inbox.try_put(delivered) {
                        stats.inc_rx_dropped();
                        tracing::trace!(local = %self.local, "Inbox full, dropping received packet");
                    }

                    // Keep draining until the kernel buffer is empty so a
                    // burst of back-to-back datagrams does not starve behind
                    // the reader's poll interval.
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(RECV_POLL_INTERVAL);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(fatal(self.local, e)),
            }
        }
    }

    fn local_addr(&self) -> EndpointAddr {
        self.local
    }

    fn remote_addr(&self) -> EndpointAddr {
        self.remote
    }
}

impl SocketTransport {
    /// The OS-assigned local port, useful in tests that bind to port 0.
    #[cfg(test)]
    pub(crate) fn bound_port(&self) -> u16 {
        match self.socket.local_addr().unwrap().as_socket().unwrap() {
            SocketAddr::V4(a) => a.port(),
            SocketAddr::V6(a) => a.port(),
        }
    }
}

fn is_transient_send_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    ) || e.raw_os_error() == Some(libc_enobufs())
}

/// `ENOBUFS`'s value on Linux; used as a best-effort check since `std::io`
/// has no portable `ErrorKind` for "kernel send buffer full".
#[cfg(target_os = "linux")]
fn libc_enobufs() -> i32 {
    105
}

#[cfg(not(target_os = "linux"))]
fn libc_enobufs() -> i32 {
    -1
}

fn fatal(local: EndpointAddr, source: io::Error) -> Error {
    Error::TransportFatal { local, source }
}

fn uninit(buf: &mut [u8]) -> &mut [std::mem::MaybeUninit<u8>] {
    // SAFETY: `u8` has no invalid bit patterns, so a `&mut [u8]` can be
    // reinterpreted as `&mut [MaybeUninit<u8>]` for `Socket::recv`'s API.
    unsafe { &mut *(buf as *mut [u8] as *mut [std::mem::MaybeUninit<u8>]) }
}
