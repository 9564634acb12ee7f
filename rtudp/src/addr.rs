use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// An `(ip, port)` pair identifying one side of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EndpointAddr {
    pub ip: IpAddr,
    pub port: u16,
}

impl EndpointAddr {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }
}

impl fmt::Display for EndpointAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl From<EndpointAddr> for std::net::SocketAddr {
    fn from(addr: EndpointAddr) -> Self {
        std::net::SocketAddr::new(addr.ip, addr.port)
    }
}

/// Identity of an endpoint: the `(local, remote)` address quadruple.
///
/// Two endpoints constructed with the same quadruple hash and compare equal,
/// regardless of any other configuration (capacity, direction, ...).
#[derive(Debug, Clone, Copy)]
pub struct EndpointIdentity {
    pub local: EndpointAddr,
    pub remote: EndpointAddr,
}

impl PartialEq for EndpointIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.remote == other.remote
    }
}

impl Eq for EndpointIdentity {}

impl Hash for EndpointIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.remote.hash(state);
    }
}
