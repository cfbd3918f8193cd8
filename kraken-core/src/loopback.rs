//! Scripted in-memory connection
//!
//! Plays back a queue of inbound chunks and records what was sent. Used as
//! the I/O double in tests and by dry runs that should not touch a real
//! interface.

use crate::connection::{Connection, ConnectionInfo, ConnectionType};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

/// Number of sent frames kept for inspection; later frames are only counted
const DEFAULT_RETAIN: usize = 4096;

/// In-memory connection with scripted receive traffic
#[derive(Debug)]
pub struct ScriptedConnection {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    sent_count: u64,
    sent_bytes: u64,
    retain: usize,
    fail_sends: bool,
    idle_wait: bool,
}

impl ScriptedConnection {
    /// Create a connection with no inbound traffic that accepts every send
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            sent: Vec::new(),
            sent_count: 0,
            sent_bytes: 0,
            retain: DEFAULT_RETAIN,
            fail_sends: false,
            idle_wait: true,
        }
    }

    /// Create a connection whose sends all fail
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::new()
        }
    }

    /// Queue chunks to be returned by `recv`, in order
    pub fn with_inbound<I: IntoIterator<Item = Vec<u8>>>(mut self, chunks: I) -> Self {
        self.inbound.extend(chunks);
        self
    }

    /// Keep at most `retain` sent frames
    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain;
        self
    }

    /// Return immediately from `recv` when the inbound queue is empty
    /// instead of waiting out the timeout.
    pub fn without_idle_wait(mut self) -> Self {
        self.idle_wait = false;
        self
    }

    /// Frames sent so far (bounded by the retain limit)
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Total number of successful sends
    pub fn sent_count(&self) -> u64 {
        self.sent_count
    }

    /// Total bytes accepted by `send`
    pub fn sent_bytes(&self) -> u64 {
        self.sent_bytes
    }

    /// Inbound chunks not yet received
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for ScriptedConnection {
    fn send(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
        if self.fail_sends {
            return Err(Error::transport("scripted send failure"));
        }

        self.sent_count += 1;
        self.sent_bytes += data.len() as u64;
        if self.sent.len() < self.retain {
            self.sent.push(data.to_vec());
        }
        Ok(data.len())
    }

    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        match self.inbound.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            None => {
                if self.idle_wait {
                    thread::sleep(timeout);
                }
                Ok(0)
            }
        }
    }

    fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            conn_type: ConnectionType::Frame,
            local_addr: "loopback".to_string(),
            remote_addr: "scripted".to_string(),
            stack_layers: vec!["ethernet".to_string(), "ethercat".to_string()],
        }
    }
}
