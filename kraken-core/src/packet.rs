//! Packet types

use std::time::SystemTime;

/// A captured link-layer frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// When the frame was received
    pub timestamp: SystemTime,
    /// Frame bytes including the link header
    pub data: Vec<u8>,
}

impl Packet {
    /// Create a new packet stamped with the current time
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            data,
        }
    }

    /// Get packet data as slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get packet length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if packet is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
