//! Ethernet II link header
//!
//! EtherCAT rides directly on Ethernet II with EtherType 0x88A4. Captured
//! traffic arrives with the 14-byte link header in front of the EtherCAT
//! sub-frame; outgoing sub-frames get one prepended by the transport.

use bytes::{BufMut, BytesMut};
use kraken_core::{ethertypes, MacAddr};
use std::fmt;

/// Length of the Ethernet II header (dst + src + EtherType)
pub const LINK_HEADER_LEN: usize = 14;

/// EtherType values this crate cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// EtherCAT (0x88A4)
    EtherCat,
    /// Custom EtherType
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::EtherCat => ethertypes::ETHERCAT,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            ethertypes::ETHERCAT => EtherType::EtherCat,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::EtherCat => write!(f, "EtherCAT"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Parsed Ethernet II header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: EtherType,
}

/// Split a link frame into its header and everything after it.
///
/// Returns `None` when fewer than 14 bytes are present. The payload keeps
/// any trailing padding; EtherCAT declares its own length.
pub fn split_header(data: &[u8]) -> Option<(EthernetHeader, &[u8])> {
    if data.len() < LINK_HEADER_LEN {
        return None;
    }

    let mut dst = [0u8; 6];
    let mut src = [0u8; 6];
    dst.copy_from_slice(&data[0..6]);
    src.copy_from_slice(&data[6..12]);
    let ethertype = EtherType::from_u16(u16::from_be_bytes([data[12], data[13]]));

    Some((
        EthernetHeader {
            destination: MacAddr(dst),
            source: MacAddr(src),
            ethertype,
        },
        &data[LINK_HEADER_LEN..],
    ))
}

/// Ethernet II frame
#[derive(Debug, Clone)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType
    pub ethertype: EtherType,
    /// Payload data
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Maximum Ethernet frame size (without FCS)
    pub const MAX_FRAME_SIZE: usize = 1514;

    /// Create a new Ethernet frame
    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType, payload: Vec<u8>) -> Self {
        EthernetFrame {
            destination,
            source,
            ethertype,
            payload,
        }
    }

    /// Wrap an EtherCAT sub-frame for broadcast from `source`
    pub fn ethercat(source: MacAddr, payload: Vec<u8>) -> Self {
        Self::new(MacAddr::broadcast(), source, EtherType::EtherCat, payload)
    }

    /// Convert the frame to bytes, padded to the minimum frame size
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(LINK_HEADER_LEN + self.payload.len());

        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.to_u16());
        buffer.put_slice(&self.payload);

        let mut result = buffer.to_vec();
        if result.len() < Self::MIN_FRAME_SIZE {
            result.resize(Self::MIN_FRAME_SIZE, 0);
        }

        result
    }

    /// Parse an Ethernet frame from bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let (header, payload) = split_header(data)?;
        Some(EthernetFrame {
            destination: header.destination,
            source: header.source,
            ethertype: header.ethertype,
            payload: payload.to_vec(),
        })
    }
}
