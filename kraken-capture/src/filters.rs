//! Acceptance filter for captured chunks
//!
//! Chunks arrive as full link frames. A chunk is kept when something follows
//! the 14-byte link header and the sub-frame header after it carries the
//! EtherCAT type nibble.

use kraken_packet::ethercat::{decode_header, ECAT_FRAME_TYPE};
use kraken_packet::ethernet::LINK_HEADER_LEN;

/// Chunks must be strictly longer than this to be considered
pub const MIN_CHUNK_LEN: usize = LINK_HEADER_LEN + 2;

/// Outcome of classifying one received chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// EtherCAT sub-frame behind the link header
    Accepted,
    /// Not longer than link header plus frame header
    TooShort,
    /// Sub-frame header carries another type nibble
    WrongType(u8),
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

/// Classify a received chunk
pub fn classify(chunk: &[u8]) -> Verdict {
    if chunk.len() <= MIN_CHUNK_LEN {
        return Verdict::TooShort;
    }

    match decode_header(&chunk[LINK_HEADER_LEN..]) {
        Some(header) if header.frame_type == ECAT_FRAME_TYPE => Verdict::Accepted,
        Some(header) => Verdict::WrongType(header.frame_type),
        None => Verdict::TooShort,
    }
}

/// Shorthand for `classify(chunk).is_accepted()`
pub fn is_ethercat(chunk: &[u8]) -> bool {
    classify(chunk).is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with_header(header: [u8; 2], len: usize) -> Vec<u8> {
        let mut chunk = vec![0u8; len];
        chunk[12] = 0x88;
        chunk[13] = 0xA4;
        chunk[14] = header[0];
        chunk[15] = header[1];
        chunk
    }

    #[test]
    fn test_accepts_ethercat() {
        let chunk = chunk_with_header([0x12, 0x10], 17);
        assert_eq!(classify(&chunk), Verdict::Accepted);
        assert!(is_ethercat(&chunk));
    }

    #[test]
    fn test_rejects_sixteen_bytes() {
        let chunk = chunk_with_header([0x12, 0x10], 16);
        assert_eq!(classify(&chunk), Verdict::TooShort);
        assert_eq!(classify(&[]), Verdict::TooShort);
    }

    #[test]
    fn test_rejects_other_type() {
        let chunk = chunk_with_header([0x12, 0x40], 64);
        assert_eq!(classify(&chunk), Verdict::WrongType(4));
        assert!(!is_ethercat(&chunk));
    }

    #[test]
    fn test_reserved_bit_does_not_matter() {
        let chunk = chunk_with_header([0x12, 0x18], 40);
        assert!(classify(&chunk).is_accepted());
    }
}
