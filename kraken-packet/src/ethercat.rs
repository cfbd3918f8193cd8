//! EtherCAT sub-frame codec
//!
//! ## Sub-frame layout
//! ```text
//!  offset  size  field
//!  0       2     header: bits 0-10 length, bit 11 reserved, bits 12-15 type
//!  2       1     command
//!  3       1     index
//!  4       2     address
//!  6       2     offset
//!  8       2     data length (bits 0-10) + flags (bits 11-15)
//!  10      2     interrupt
//!  12      n     data (attribution marker followed by the payload)
//!  12+n    2     working counter
//! ```
//! All multi-byte fields are little-endian. The header length counts the
//! ten datagram header bytes after the frame header, the data and the
//! working counter, so an encoded frame is always `2 + length` bytes.

use bytes::BufMut;
use kraken_core::{Error, Result};
use std::fmt;

/// Sub-frame type nibble identifying EtherCAT datagrams
pub const ECAT_FRAME_TYPE: u8 = 1;

/// Attribution marker placed at the front of every data section we emit
pub const MARKER: [u8; 4] = *b"KRKN";

/// Length of the attribution marker
pub const MARKER_LEN: usize = MARKER.len();

/// Frame header plus datagram header
pub const DATAGRAM_HEADER_LEN: usize = 12;

/// Datagram header bytes counted by the frame length field
const DATAGRAM_FIELDS_LEN: usize = DATAGRAM_HEADER_LEN - 2;

/// Working counter trailer
pub const WKC_LEN: usize = 2;

/// Largest sub-frame this crate will produce
pub const MAX_FRAME_LEN: usize = 1500;

/// Mask of the 11-bit length fields
pub const LENGTH_MASK: u16 = 0x07FF;

/// Shortest frame `inject_marker` will touch
const MIN_MARKABLE_LEN: usize = DATAGRAM_HEADER_LEN + WKC_LEN;

/// Index byte written by the encoder
const DEFAULT_INDEX: u8 = 0x01;

/// EtherCAT datagram commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EcatCommand {
    /// No operation
    Nop = 0,
    /// Auto-increment physical read
    Aprd = 1,
    /// Auto-increment physical write
    Apwr = 2,
    /// Auto-increment physical read/write
    Aprw = 3,
    /// Configured address physical read
    Fprd = 4,
    /// Configured address physical write
    Fpwr = 5,
    /// Configured address physical read/write
    Fprw = 6,
    /// Broadcast read
    Brd = 7,
    /// Broadcast write
    Bwr = 8,
    /// Broadcast read/write
    Brw = 9,
    /// Logical memory read
    Lrd = 10,
    /// Logical memory write
    Lwr = 11,
    /// Logical memory read/write
    Lrw = 12,
    /// Auto-increment physical read, multiple write
    Armw = 13,
    /// Configured address physical read, multiple write
    Frmw = 14,
}

impl EcatCommand {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(Self::Nop),
            1 => Some(Self::Aprd),
            2 => Some(Self::Apwr),
            3 => Some(Self::Aprw),
            4 => Some(Self::Fprd),
            5 => Some(Self::Fpwr),
            6 => Some(Self::Fprw),
            7 => Some(Self::Brd),
            8 => Some(Self::Bwr),
            9 => Some(Self::Brw),
            10 => Some(Self::Lrd),
            11 => Some(Self::Lwr),
            12 => Some(Self::Lrw),
            13 => Some(Self::Armw),
            14 => Some(Self::Frmw),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Aprd => "APRD",
            Self::Apwr => "APWR",
            Self::Aprw => "APRW",
            Self::Fprd => "FPRD",
            Self::Fpwr => "FPWR",
            Self::Fprw => "FPRW",
            Self::Brd => "BRD",
            Self::Bwr => "BWR",
            Self::Brw => "BRW",
            Self::Lrd => "LRD",
            Self::Lwr => "LWR",
            Self::Lrw => "LRW",
            Self::Armw => "ARMW",
            Self::Frmw => "FRMW",
        }
    }

    /// Pure read commands; each one's write variant has the next code
    pub fn is_read(self) -> bool {
        matches!(self, Self::Aprd | Self::Fprd | Self::Brd | Self::Lrd)
    }

    /// Write counterpart of a read command
    pub fn write_variant(self) -> Option<Self> {
        if self.is_read() {
            Self::from_u8(self.code() + 1)
        } else {
            None
        }
    }
}

impl fmt::Display for EcatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// True when `code` is one of the read commands (APRD, FPRD, BRD, LRD)
pub fn is_read_command(code: u8) -> bool {
    EcatCommand::from_u8(code).map_or(false, EcatCommand::is_read)
}

/// Mnemonic for a raw command byte
pub fn command_name(code: u8) -> &'static str {
    EcatCommand::from_u8(code).map_or("UNKNOWN", EcatCommand::mnemonic)
}

/// Decoded first bytes of a sub-frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Type nibble (bits 12-15)
    pub frame_type: u8,
    /// Declared 11-bit length
    pub length: u16,
    /// Command byte, when present
    pub command: Option<u8>,
}

impl FrameHeader {
    pub fn is_ethercat(&self) -> bool {
        self.frame_type == ECAT_FRAME_TYPE
    }
}

/// Pack a type nibble and an 11-bit length into the 2-byte frame header
pub fn pack_header(frame_type: u8, length: u16) -> [u8; 2] {
    let header = (length & LENGTH_MASK) | (((frame_type & 0x0F) as u16) << 12);
    header.to_le_bytes()
}

/// Read the frame header without touching the input.
///
/// Returns `None` for fewer than two bytes.
pub fn decode_header(bytes: &[u8]) -> Option<FrameHeader> {
    if bytes.len() < 2 {
        return None;
    }

    let header = u16::from_le_bytes([bytes[0], bytes[1]]);
    Some(FrameHeader {
        frame_type: ((header >> 12) & 0x0F) as u8,
        length: header & LENGTH_MASK,
        command: bytes.get(2).copied(),
    })
}

/// Insert the attribution marker into an encoded, unmarked sub-frame.
///
/// The marker goes right after the 12-byte header; everything behind it
/// moves 4 bytes to the right. The frame length and the data length grow
/// by 4 while the type nibble and the flag bits stay as they were.
///
/// Returns the new length. The frame is left untouched, and its current
/// length returned, when it is shorter than 14 bytes, is not an EtherCAT
/// sub-frame, declares less than 12 bytes, or would grow past 1500 bytes.
pub fn inject_marker(frame: &mut Vec<u8>) -> usize {
    let len = frame.len();
    if len < MIN_MARKABLE_LEN {
        return len;
    }

    let header = u16::from_le_bytes([frame[0], frame[1]]);
    let frame_len = header & LENGTH_MASK;
    let frame_type = ((header >> 12) & 0x0F) as u8;

    if frame_type != ECAT_FRAME_TYPE || (frame_len as usize) < DATAGRAM_HEADER_LEN {
        return len;
    }

    let new_len = len + MARKER_LEN;
    if new_len > MAX_FRAME_LEN {
        return len;
    }

    let len_flags = u16::from_le_bytes([frame[8], frame[9]]);
    let data_len = len_flags & LENGTH_MASK;

    frame.resize(new_len, 0);
    frame.copy_within(DATAGRAM_HEADER_LEN..len, DATAGRAM_HEADER_LEN + MARKER_LEN);
    frame[DATAGRAM_HEADER_LEN..DATAGRAM_HEADER_LEN + MARKER_LEN].copy_from_slice(&MARKER);

    let grown_frame_len = (frame_len + MARKER_LEN as u16) & LENGTH_MASK;
    let new_header = (header & !LENGTH_MASK) | grown_frame_len;
    frame[0..2].copy_from_slice(&new_header.to_le_bytes());

    let grown_data_len = (data_len + MARKER_LEN as u16) & LENGTH_MASK;
    let new_flags = (len_flags & !LENGTH_MASK) | grown_data_len;
    frame[8..10].copy_from_slice(&new_flags.to_le_bytes());

    new_len
}

/// An outgoing EtherCAT datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcatDatagram {
    pub command: EcatCommand,
    pub index: u8,
    pub address: u16,
    pub offset: u16,
    /// Payload placed after the attribution marker
    pub data: Vec<u8>,
    pub working_counter: u16,
}

impl EcatDatagram {
    pub fn new(command: EcatCommand) -> Self {
        Self {
            command,
            index: DEFAULT_INDEX,
            address: 0,
            offset: 0,
            data: Vec::new(),
            working_counter: 0,
        }
    }

    pub fn with_address(mut self, address: u16) -> Self {
        self.address = address;
        self
    }

    pub fn with_offset(mut self, offset: u16) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Payload of `len` zero bytes
    pub fn with_zeroed_data(mut self, len: usize) -> Self {
        self.data = vec![0; len];
        self
    }

    pub fn with_working_counter(mut self, wkc: u16) -> Self {
        self.working_counter = wkc;
        self
    }

    /// Data section length, marker included
    pub fn data_len(&self) -> usize {
        MARKER_LEN + self.data.len()
    }

    /// Value of the header length field
    pub fn frame_len(&self) -> usize {
        DATAGRAM_FIELDS_LEN + self.data_len() + WKC_LEN
    }

    /// Total bytes written by `encode_into`
    pub fn encoded_len(&self) -> usize {
        2 + self.frame_len()
    }

    /// Encode into `buf`, returning the number of bytes written
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let frame_len = self.frame_len();
        if frame_len > LENGTH_MASK as usize {
            return Err(Error::PacketConstruction(format!(
                "{}-byte data section does not fit the 11-bit length field",
                self.data_len()
            )));
        }

        let needed = 2 + frame_len;
        if buf.len() < needed {
            return Err(Error::PacketConstruction(format!(
                "buffer of {} bytes is too small for a {}-byte frame",
                buf.len(),
                needed
            )));
        }

        let mut cursor: &mut [u8] = &mut buf[..needed];
        cursor.put_slice(&pack_header(ECAT_FRAME_TYPE, frame_len as u16));
        cursor.put_u8(self.command.code());
        cursor.put_u8(self.index);
        cursor.put_u16_le(self.address);
        cursor.put_u16_le(self.offset);
        cursor.put_u16_le(self.data_len() as u16 & LENGTH_MASK);
        cursor.put_u16_le(0);
        cursor.put_slice(&MARKER);
        cursor.put_slice(&self.data);
        cursor.put_u16_le(self.working_counter);

        Ok(needed)
    }

    /// Encode into a freshly allocated, exactly sized buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }
}

/// Borrowed view over a received sub-frame
#[derive(Debug, Clone, Copy)]
pub struct DatagramView<'a> {
    bytes: &'a [u8],
    header: FrameHeader,
    data_len: usize,
}

impl<'a> DatagramView<'a> {
    /// Validate that the datagram header, data section and working counter
    /// declared by the frame all lie within `bytes`
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < DATAGRAM_HEADER_LEN + WKC_LEN {
            return Err(Error::PacketParsing(format!(
                "EtherCAT frame too short: {} bytes",
                bytes.len()
            )));
        }

        let header = decode_header(bytes)
            .ok_or_else(|| Error::PacketParsing("missing frame header".to_string()))?;
        if !header.is_ethercat() {
            return Err(Error::PacketParsing(format!(
                "unexpected frame type {}",
                header.frame_type
            )));
        }

        let data_len = (u16::from_le_bytes([bytes[8], bytes[9]]) & LENGTH_MASK) as usize;
        if DATAGRAM_HEADER_LEN + data_len + WKC_LEN > bytes.len() {
            return Err(Error::PacketParsing(format!(
                "data length {} overruns {}-byte frame",
                data_len,
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            header,
            data_len,
        })
    }

    pub fn header(&self) -> FrameHeader {
        self.header
    }

    pub fn command(&self) -> u8 {
        self.bytes[2]
    }

    pub fn index(&self) -> u8 {
        self.bytes[3]
    }

    pub fn address(&self) -> u16 {
        u16::from_le_bytes([self.bytes[4], self.bytes[5]])
    }

    pub fn offset(&self) -> u16 {
        u16::from_le_bytes([self.bytes[6], self.bytes[7]])
    }

    /// Data section as declared by the data length field
    pub fn data(&self) -> &'a [u8] {
        &self.bytes[DATAGRAM_HEADER_LEN..DATAGRAM_HEADER_LEN + self.data_len]
    }

    pub fn working_counter(&self) -> u16 {
        let at = DATAGRAM_HEADER_LEN + self.data_len;
        u16::from_le_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    /// Whether the data section starts with our attribution marker
    pub fn is_marked(&self) -> bool {
        self.data().starts_with(&MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brd_frame(payload: &[u8]) -> Vec<u8> {
        EcatDatagram::new(EcatCommand::Brd)
            .with_data(payload.to_vec())
            .to_bytes()
            .unwrap()
    }

    /// Frame as a master would send it: no marker in the data section
    fn unmarked_frame(command: u8, data: &[u8], wkc: u16) -> Vec<u8> {
        let frame_len = (DATAGRAM_FIELDS_LEN + data.len() + WKC_LEN) as u16;
        let mut frame = pack_header(ECAT_FRAME_TYPE, frame_len).to_vec();
        frame.extend_from_slice(&[command, 0x05, 0x00, 0x10, 0x30, 0x01]);
        frame.extend_from_slice(&(data.len() as u16).to_le_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(data);
        frame.extend_from_slice(&wkc.to_le_bytes());
        frame
    }

    #[test]
    fn test_brd_two_byte_payload() {
        let frame = EcatDatagram::new(EcatCommand::Brd)
            .with_data(vec![0x00, 0x00])
            .to_bytes()
            .unwrap();

        let header = decode_header(&frame).unwrap();
        assert_eq!(header.length, 18);
        assert_eq!(header.frame_type, ECAT_FRAME_TYPE);
        assert_eq!(header.command, Some(7));
        assert_eq!(frame.len(), 20);
    }

    #[test]
    fn test_field_layout() {
        let frame = EcatDatagram::new(EcatCommand::Fprd)
            .with_address(0x1000)
            .with_offset(0x0130)
            .with_data(vec![0x12, 0x34])
            .with_working_counter(0x0201)
            .to_bytes()
            .unwrap();

        assert_eq!(frame[2], 4);
        assert_eq!(frame[3], 0x01);
        assert_eq!(&frame[4..6], &[0x00, 0x10]);
        assert_eq!(&frame[6..8], &[0x30, 0x01]);
        assert_eq!(u16::from_le_bytes([frame[8], frame[9]]), 6);
        assert_eq!(&frame[10..12], &[0, 0]);
        assert_eq!(&frame[12..16], b"KRKN");
        assert_eq!(&frame[16..18], &[0x12, 0x34]);
        assert_eq!(&frame[18..20], &[0x01, 0x02]);
    }

    #[test]
    fn test_header_length_tracks_payload() {
        for len in [0usize, 1, 2, 64, 511, 1024, 1400] {
            let frame = brd_frame(&vec![0x5A; len]);
            let header = decode_header(&frame).unwrap();
            assert_eq!(header.frame_type, ECAT_FRAME_TYPE, "len {}", len);
            assert_eq!(header.length as usize, 10 + 4 + len + 2, "len {}", len);
            assert_eq!(frame.len(), 2 + header.length as usize);
        }
    }

    #[test]
    fn test_zeroed_data() {
        let frame = EcatDatagram::new(EcatCommand::Brd)
            .with_zeroed_data(3)
            .to_bytes()
            .unwrap();
        assert_eq!(&frame[12..16], &MARKER);
        assert_eq!(&frame[16..19], &[0, 0, 0]);
    }

    #[test]
    fn test_nop_without_payload() {
        let frame = EcatDatagram::new(EcatCommand::Nop).to_bytes().unwrap();
        assert_eq!(frame.len(), 18);
        assert_eq!(decode_header(&frame).unwrap().length, 16);
    }

    #[test]
    fn test_encode_into_small_buffer() {
        let datagram = EcatDatagram::new(EcatCommand::Brd).with_zeroed_data(1400);
        let mut small = [0u8; 64];
        assert!(matches!(
            datagram.encode_into(&mut small),
            Err(Error::PacketConstruction(_))
        ));

        let mut big = [0u8; MAX_FRAME_LEN];
        assert_eq!(datagram.encode_into(&mut big).unwrap(), 1418);
    }

    #[test]
    fn test_encode_rejects_oversized_length() {
        let datagram = EcatDatagram::new(EcatCommand::Brd).with_zeroed_data(2040);
        assert!(datagram.to_bytes().is_err());
    }

    #[test]
    fn test_decode_header_does_not_need_command() {
        let header = decode_header(&pack_header(1, 100)).unwrap();
        assert_eq!(header.length, 100);
        assert_eq!(header.command, None);
        assert!(decode_header(&[0x10]).is_none());
    }

    #[test]
    fn test_pack_header_masks_length() {
        assert_eq!(pack_header(1, 0x0FFF), [0xFF, 0x17]);
        assert_eq!(pack_header(0x1F, 0), [0x00, 0xF0]);
    }

    #[test]
    fn test_inject_marker() {
        let mut frame = unmarked_frame(7, &[0xDE, 0xAD], 3);
        let original = frame.clone();

        let new_len = inject_marker(&mut frame);
        assert_eq!(new_len, original.len() + 4);
        assert_eq!(frame.len(), new_len);

        let header = decode_header(&frame).unwrap();
        assert_eq!(header.frame_type, ECAT_FRAME_TYPE);
        assert_eq!(header.length, decode_header(&original).unwrap().length + 4);
        assert_eq!(u16::from_le_bytes([frame[8], frame[9]]), 6);
        assert_eq!(&frame[2..8], &original[2..8]);
        assert_eq!(&frame[12..16], &MARKER);
        assert_eq!(&frame[16..], &original[12..]);

        let view = DatagramView::parse(&frame).unwrap();
        assert!(view.is_marked());
        assert_eq!(view.working_counter(), 3);
    }

    #[test]
    fn test_inject_marker_preserves_flag_bits() {
        let mut frame = unmarked_frame(4, &[1, 2, 3, 4], 0);
        frame[1] |= 0x08; // reserved header bit
        frame[9] |= 0xC0; // round-trip and more-follows flags

        inject_marker(&mut frame);

        assert_eq!(frame[1] & 0xF8, 0x18);
        assert_eq!(frame[9] & 0xF8, 0xC0);
        assert_eq!(u16::from_le_bytes([frame[8], frame[9]]) & LENGTH_MASK, 8);
    }

    #[test]
    fn test_inject_marker_too_short() {
        let mut frame = unmarked_frame(7, &[], 0);
        frame.truncate(13);
        let original = frame.clone();
        assert_eq!(inject_marker(&mut frame), 13);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_inject_marker_wrong_type() {
        let mut frame = unmarked_frame(7, &[1, 2], 0);
        frame[1] = (frame[1] & 0x0F) | 0x20;
        let original = frame.clone();
        assert_eq!(inject_marker(&mut frame), original.len());
        assert_eq!(frame, original);
    }

    #[test]
    fn test_inject_marker_declared_length_below_floor() {
        let mut frame = unmarked_frame(7, &[1, 2, 3, 4], 0);
        frame[0..2].copy_from_slice(&pack_header(ECAT_FRAME_TYPE, 11));
        let original = frame.clone();
        assert_eq!(inject_marker(&mut frame), original.len());
        assert_eq!(frame, original);
    }

    #[test]
    fn test_inject_marker_ceiling() {
        let mut frame = unmarked_frame(7, &vec![0x11; MAX_FRAME_LEN - 14 - 3], 0);
        assert_eq!(frame.len(), MAX_FRAME_LEN - 3);
        let original = frame.clone();
        assert_eq!(inject_marker(&mut frame), original.len());
        assert_eq!(frame, original);

        let mut fits = unmarked_frame(7, &vec![0x11; MAX_FRAME_LEN - 14 - 4], 0);
        assert_eq!(inject_marker(&mut fits), MAX_FRAME_LEN);
    }

    #[test]
    fn test_datagram_view() {
        let frame = EcatDatagram::new(EcatCommand::Fprd)
            .with_address(0x1001)
            .with_offset(0x0010)
            .with_data(vec![9, 8])
            .with_working_counter(1)
            .to_bytes()
            .unwrap();

        let view = DatagramView::parse(&frame).unwrap();
        assert_eq!(view.command(), 4);
        assert_eq!(view.index(), 0x01);
        assert_eq!(view.address(), 0x1001);
        assert_eq!(view.offset(), 0x0010);
        assert_eq!(view.data(), b"KRKN\x09\x08");
        assert_eq!(view.working_counter(), 1);
        assert!(view.is_marked());
    }

    #[test]
    fn test_datagram_view_rejects_overrun() {
        let mut frame = unmarked_frame(7, &[1, 2], 0);
        frame[8] = 40;
        assert!(DatagramView::parse(&frame).is_err());
        assert!(DatagramView::parse(&frame[..10]).is_err());
    }

    #[test]
    fn test_command_helpers() {
        for code in [1u8, 4, 7, 10] {
            assert!(is_read_command(code));
            let cmd = EcatCommand::from_u8(code).unwrap();
            assert_eq!(cmd.write_variant().unwrap().code(), code + 1);
        }
        assert!(!is_read_command(8));
        assert!(!is_read_command(200));
        assert_eq!(command_name(7), "BRD");
        assert_eq!(command_name(99), "UNKNOWN");
        assert_eq!(EcatCommand::Bwr.write_variant(), None);
    }
}
