//! Connection capability set
//!
//! Modules never open sockets themselves. The caller hands them an already
//! established connection and every operation on it carries an explicit
//! timeout, so no module call can block indefinitely.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Kind of conduit behind a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Stream,
    Datagram,
    Frame,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Stream => write!(f, "stream"),
            ConnectionType::Datagram => write!(f, "datagram"),
            ConnectionType::Frame => write!(f, "frame"),
        }
    }
}

/// Description of an established connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub conn_type: ConnectionType,
    pub local_addr: String,
    pub remote_addr: String,
    /// Protocol layers from the outermost inwards (e.g. ["ethernet", "ethercat"])
    pub stack_layers: Vec<String>,
}

/// Bidirectional raw connection to the segment under test
pub trait Connection {
    /// Send one frame.
    ///
    /// Returns the number of bytes handed to the link. A zero count means
    /// nothing went out; callers treat only positive counts as sent.
    fn send(&mut self, data: &[u8], timeout: Duration) -> Result<usize>;

    /// Receive one chunk into `buf`.
    ///
    /// Returns `Ok(0)` when the timeout expired or the peer closed.
    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Describe this connection
    fn info(&self) -> ConnectionInfo;

    /// Open a sibling connection with the same conduit configuration
    fn open(&mut self, _timeout: Duration) -> Result<Box<dyn Connection>> {
        Err(Error::NotSupported("open".to_string()))
    }

    /// Close a connection obtained through [`Connection::open`]
    fn close(&mut self) {}
}
