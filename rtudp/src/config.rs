use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which workers an endpoint spawns on [`crate::Endpoint::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Dispatcher only.
    Send,
    /// Reader only (socket backend) / nothing extra (emulated backend — its
    /// inbox is filled directly by peers).
    Recv,
    /// Both dispatcher and reader.
    Full,
}

impl Direction {
    pub fn spawns_dispatcher(self) -> bool {
        matches!(self, Direction::Send | Direction::Full)
    }

    pub fn spawns_reader(self) -> bool {
        matches!(self, Direction::Recv | Direction::Full)
    }
}

const fn default_capacity() -> u32 {
    1024
}

const fn default_cpu() -> i32 {
    -1
}

const fn default_timeout_ns() -> i64 {
    10_000_000_000
}

const fn default_bind() -> bool {
    true
}

const fn default_connect() -> bool {
    false
}

fn default_name() -> String {
    "RtUdp".to_owned()
}

/// Construction parameters shared by both backends (§6 of the design doc).
///
/// Deliberately `serde`-deserializable so an embedding application can load
/// endpoint configuration from TOML/JSON/env the same way it configures
/// anything else, in addition to the plain constructor methods on
/// [`crate::Endpoint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub local_ip: IpAddr,
    pub local_port: u16,
    pub remote_ip: IpAddr,
    pub remote_port: u16,

    #[serde(default = "default_capacity")]
    pub capacity: u32,

    #[serde(default = "Direction::default_direction")]
    pub direction: Direction,

    #[serde(default = "default_cpu")]
    pub cpu: i32,

    #[serde(default = "default_timeout_ns")]
    pub timeout_ns: i64,

    /// Socket backend only: whether to bind `local_ip:local_port`.
    #[serde(default = "default_bind")]
    pub bind: bool,

    /// Socket backend only: whether to connect to `remote_ip:remote_port`.
    #[serde(default = "default_connect")]
    pub connect: bool,

    /// Socket backend only: diagnostic label included in tracing spans.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Direction {
    fn default_direction() -> Direction {
        Direction::Send
    }
}

impl EndpointConfig {
    pub fn new(local_ip: IpAddr, local_port: u16, remote_ip: IpAddr, remote_port: u16) -> Self {
        Self {
            local_ip,
            local_port,
            remote_ip,
            remote_port,
            capacity: default_capacity(),
            direction: Direction::default_direction(),
            cpu: default_cpu(),
            timeout_ns: default_timeout_ns(),
            bind: default_bind(),
            connect: default_connect(),
            name: default_name(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_cpu(mut self, cpu: i32) -> Self {
        self.cpu = cpu;
        self
    }

    pub fn with_timeout_ns(mut self, timeout_ns: i64) -> Self {
        self.timeout_ns = timeout_ns;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.local_port == 0 || self.remote_port == 0 {
            return Err(Error::InvalidConfig("port 0 is not a valid endpoint port".to_owned()));
        }
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("capacity must be non-zero".to_owned()));
        }

        Ok(())
    }
}
