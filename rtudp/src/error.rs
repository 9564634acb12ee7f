use std::fmt;
use std::io;

use crate::EndpointAddr;

/// Errors surfaced by the [`crate::Endpoint`] façade.
///
/// Transient, self-healing conditions (a full inbox, a kernel send buffer
/// that is momentarily full) are never represented here: they are observed
/// through [`crate::PacketStats`] instead. Only programming errors and
/// unrecoverable I/O reach the caller as an [`Error`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("endpoint is not initialized")]
    NotInitialized,
    #[error("endpoint is already initialized")]
    AlreadyInitialized,
    #[error("endpoint is already running")]
    AlreadyRunning,
    #[error("receive timed out")]
    Timeout,
    #[error("transport for {local} is unusable: {source}")]
    TransportFatal {
        local: EndpointAddr,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Formats an error together with its full [`std::error::Error::source`] chain.
///
/// Mirrors the one-liner each layer of context gets when a caller only has a
/// `Display` impl to log through, without pulling in a full error-reporting
/// crate for a single adapter.
pub fn err_with_sources(e: &(dyn std::error::Error + 'static)) -> ErrorWithSources<'_> {
    ErrorWithSources { e }
}

pub struct ErrorWithSources<'a> {
    e: &'a (dyn std::error::Error + 'static),
}

impl fmt::Display for ErrorWithSources<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.e)?;

        let mut cause = self.e.source();
        while let Some(e) = cause {
            write!(f, ": {e}")?;
            cause = e.source();
        }

        Ok(())
    }
}
