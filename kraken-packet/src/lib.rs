//! Frame construction and parsing for Kraken
//!
//! - [`ethercat`] - EtherCAT sub-frame encoder, header helpers and the
//!   attribution marker
//! - [`ethernet`] - Ethernet II link header used to carry sub-frames
//!
//! # Building a broadcast read
//!
//! ```rust
//! use kraken_packet::ethercat::{decode_header, EcatCommand, EcatDatagram};
//!
//! let frame = EcatDatagram::new(EcatCommand::Brd)
//!     .with_data(vec![0x00, 0x00])
//!     .to_bytes()
//!     .unwrap();
//!
//! let header = decode_header(&frame).unwrap();
//! assert_eq!(header.length, 18);
//! assert_eq!(header.frame_type, 1);
//! ```

pub mod ethercat;
pub mod ethernet;

pub use ethercat::{
    command_name, decode_header, inject_marker, is_read_command, pack_header, DatagramView,
    EcatCommand, EcatDatagram, FrameHeader, ECAT_FRAME_TYPE, MARKER, MAX_FRAME_LEN,
};
pub use ethernet::{split_header, EtherType, EthernetFrame, EthernetHeader, LINK_HEADER_LEN};
