//! Target descriptors
//!
//! A module is pointed at either a plain network endpoint or an EtherCAT
//! segment. Reports carry their own copies of the target, so a caller may
//! keep using (or drop) its descriptor independently of any result.

use serde::Serialize;
use std::fmt;

/// Host/port endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

/// EtherCAT segment as seen from the attacking interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtherCatTarget {
    /// Network interface name (e.g. "eth0")
    pub iface: String,
    /// Master MAC address as observed on the wire
    pub mac_address: String,
    /// Number of slaves observed
    pub slave_count: u32,
    /// Observed slave station addresses
    pub slaves: Vec<u16>,
}

impl EtherCatTarget {
    pub fn new(iface: impl Into<String>, mac_address: impl Into<String>) -> Self {
        Self {
            iface: iface.into(),
            mac_address: mac_address.into(),
            slave_count: 0,
            slaves: Vec::new(),
        }
    }

    /// Attach observed slave station addresses; the slave count follows them
    pub fn with_slaves(mut self, slaves: Vec<u16>) -> Self {
        self.slave_count = slaves.len() as u32;
        self.slaves = slaves;
        self
    }
}

/// What a module runs against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Network(HostPort),
    #[serde(rename = "ethercat")]
    EtherCat(EtherCatTarget),
}

impl Target {
    pub fn network(host: impl Into<String>, port: u16) -> Self {
        Target::Network(HostPort {
            host: host.into(),
            port,
        })
    }

    /// First observed slave station address, if this is an EtherCAT target
    pub fn first_slave(&self) -> Option<u16> {
        match self {
            Target::EtherCat(t) => t.slaves.first().copied(),
            Target::Network(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Network(hp) => write!(f, "{}:{}", hp.host, hp.port),
            Target::EtherCat(t) => write!(
                f,
                "{} (master {}, {} slaves)",
                t.iface, t.mac_address, t.slave_count
            ),
        }
    }
}
