//! Real-time, deadline-scheduled UDP messaging with two interchangeable
//! transports: a real kernel socket, or an in-process emulation useful for
//! tests and single-process simulations that still want realistic queuing
//! and drop behavior.
//!
//! The public surface is small and centers on [`Endpoint`]: construct one
//! with [`Endpoint::new_socket`] or [`Endpoint::new_emulated`], [`Endpoint::init`]
//! it to open the transport, [`Endpoint::start`] its workers, then drive it
//! with [`Endpoint::send_data`] / [`Endpoint::receive_data`].

mod addr;
mod affinity;
mod clock;
mod config;
mod dispatcher;
mod endpoint;
mod error;
mod inbox;
mod logging;
mod outbox;
mod reader;
mod registry;
mod stats;
mod transport;

pub use addr::{EndpointAddr, EndpointIdentity};
pub use clock::Clock;
pub use config::{Direction, EndpointConfig};
pub use endpoint::Endpoint;
pub use error::{err_with_sources, Error, ErrorWithSources, Result};
pub use logging::{init_global_subscriber, test_subscriber};
pub use stats::PacketStats;
pub use transport::emulated::EmulatedTransport;
pub use transport::socket::SocketTransport;
pub use transport::{SendOutcome, Transport};
