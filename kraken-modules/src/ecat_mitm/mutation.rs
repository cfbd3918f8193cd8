//! Mutation strategies applied to captured frames before they are sent back

use kraken_packet::ethercat::{inject_marker, is_read_command, LENGTH_MASK, MAX_FRAME_LEN};
use kraken_packet::ethernet::split_header;

/// Frames the tampering strategies take from the front of the capture
const TAMPER_LIMIT: usize = 20;

/// First and one-past-last offsets of the XOR window
const CORRUPT_START: usize = 12;
const CORRUPT_END: usize = 20;
const CORRUPT_MASK: u8 = 0xAA;

/// Working counter forced by [`Mutation::WorkingCounter`]
const FORGED_WKC: [u8; 2] = [0xFF, 0x00];

/// A sub-frame ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatedFrame {
    pub bytes: Vec<u8>,
    /// Whether the attribution marker could be inserted
    pub marked: bool,
}

/// Ways of tampering with a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// Send the frame back unchanged
    Replay,
    /// Overwrite the working counter with 0x00FF
    WorkingCounter,
    /// Flip bits in the first data bytes
    CorruptPayload,
    /// Turn read commands into their write variants
    CommandSubstitution,
}

impl Mutation {
    /// All strategies in the order they run
    pub const ALL: [Mutation; 4] = [
        Mutation::Replay,
        Mutation::WorkingCounter,
        Mutation::CorruptPayload,
        Mutation::CommandSubstitution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Replay => "replay",
            Mutation::WorkingCounter => "working_counter",
            Mutation::CorruptPayload => "corrupt_payload",
            Mutation::CommandSubstitution => "command_substitution",
        }
    }

    /// Heading used in the run log
    pub fn title(&self) -> &'static str {
        match self {
            Mutation::Replay => "Simple replay",
            Mutation::WorkingCounter => "Modified WKC",
            Mutation::CorruptPayload => "Corrupted data",
            Mutation::CommandSubstitution => "Command substitution",
        }
    }

    /// How many captured frames the strategy uses; `None` means all of them
    pub fn limit(&self) -> Option<usize> {
        match self {
            Mutation::Replay => None,
            _ => Some(TAMPER_LIMIT),
        }
    }

    /// Log line when there is nothing to work on
    pub fn empty_message(&self) -> &'static str {
        match self {
            Mutation::Replay => "  Replay: no frames to replay",
            Mutation::WorkingCounter => "  Modified WKC: no frames",
            Mutation::CorruptPayload => "  Corrupted data: no frames",
            Mutation::CommandSubstitution => "  Cmd substitution: no frames",
        }
    }

    /// Log line reporting how many frames went out
    pub fn sent_message(&self, sent: u64) -> String {
        match self {
            Mutation::Replay => format!("  Replay: sent {} captured frames", sent),
            Mutation::WorkingCounter => {
                format!("  Modified WKC: sent {} frames with altered WKC", sent)
            }
            Mutation::CorruptPayload => {
                format!("  Corrupted data: sent {} frames with flipped bits", sent)
            }
            Mutation::CommandSubstitution => {
                format!("  Cmd substitution: sent {} frames with changed commands", sent)
            }
        }
    }

    /// Strip the link header from a captured chunk, tamper with the
    /// sub-frame and mark it.
    ///
    /// Returns `None` when nothing follows the link header or the sub-frame
    /// is already longer than a frame we may send.
    pub fn apply(&self, captured: &[u8]) -> Option<MutatedFrame> {
        let (_, sub_frame) = split_header(captured)?;
        if sub_frame.is_empty() || sub_frame.len() > MAX_FRAME_LEN {
            return None;
        }

        let mut bytes = sub_frame.to_vec();
        self.transform(&mut bytes);

        let before = bytes.len();
        let marked = inject_marker(&mut bytes) != before;
        Some(MutatedFrame { bytes, marked })
    }

    fn transform(&self, frame: &mut [u8]) {
        let len = frame.len();
        match self {
            Mutation::Replay => {}
            Mutation::WorkingCounter => {
                if len > 4 {
                    let declared = (u16::from_le_bytes([frame[0], frame[1]]) & LENGTH_MASK) as usize;
                    if declared > 2 && declared <= len - 2 {
                        frame[declared..declared + 2].copy_from_slice(&FORGED_WKC);
                    }
                }
            }
            Mutation::CorruptPayload => {
                if len > 14 {
                    let end = (len - 2).min(CORRUPT_END);
                    for byte in &mut frame[CORRUPT_START..end] {
                        *byte ^= CORRUPT_MASK;
                    }
                }
            }
            Mutation::CommandSubstitution => {
                if len > 2 && is_read_command(frame[2]) {
                    frame[2] += 1;
                }
            }
        }
    }
}
