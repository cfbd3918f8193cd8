//! Capture statistics

use crate::filters::Verdict;
use kraken_packet::ethercat::{command_name, DatagramView};
use kraken_packet::ethernet::LINK_HEADER_LEN;
use std::collections::BTreeMap;
use std::time::Duration;

/// Histogram key for accepted frames whose datagram does not parse
const MALFORMED: &str = "malformed";

/// Counters for one capture window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Non-empty chunks returned by the connection
    pub chunks_received: u64,
    /// Chunks stored in the buffer
    pub accepted: u64,
    /// Rejected: no sub-frame header behind the link header
    pub too_short: u64,
    /// Rejected: sub-frame type other than EtherCAT
    pub wrong_type: u64,
    /// Receives that returned an error
    pub recv_errors: u64,
    /// Receives that timed out empty
    pub idle_reads: u64,
    /// Bytes of the stored chunks
    pub bytes_accepted: u64,
    /// Wall time spent in the capture loop
    pub elapsed: Duration,
    /// Stored frames per datagram command
    pub commands: BTreeMap<String, u64>,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one received chunk
    pub fn record_chunk(&mut self, chunk: &[u8], verdict: Verdict) {
        self.chunks_received += 1;
        match verdict {
            Verdict::Accepted => {
                self.accepted += 1;
                self.bytes_accepted += chunk.len() as u64;
                *self.commands.entry(classify_command(chunk)).or_insert(0) += 1;
            }
            Verdict::TooShort => self.too_short += 1,
            Verdict::WrongType(_) => self.wrong_type += 1,
        }
    }

    pub fn record_idle(&mut self) {
        self.idle_reads += 1;
    }

    pub fn record_error(&mut self) {
        self.recv_errors += 1;
    }

    /// Chunks dropped by the acceptance filter
    pub fn rejected(&self) -> u64 {
        self.too_short + self.wrong_type
    }

    /// Accepted frames per second over the capture window
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.accepted as f64 / secs
        } else {
            0.0
        }
    }

    /// One-line description for reports
    pub fn summary(&self) -> String {
        let mut line = format!(
            "received {}, accepted {}, rejected {} (short {}, type {}), errors {} in {}ms",
            self.chunks_received,
            self.accepted,
            self.rejected(),
            self.too_short,
            self.wrong_type,
            self.recv_errors,
            self.elapsed.as_millis()
        );

        if !self.commands.is_empty() {
            let commands: Vec<String> = self
                .commands
                .iter()
                .map(|(name, count)| format!("{}={}", name, count))
                .collect();
            line.push_str("; commands ");
            line.push_str(&commands.join(","));
        }

        line
    }
}

fn classify_command(chunk: &[u8]) -> String {
    let sub_frame = chunk.get(LINK_HEADER_LEN..).unwrap_or_default();
    match DatagramView::parse(sub_frame) {
        Ok(view) => command_name(view.command()).to_string(),
        Err(_) => MALFORMED.to_string(),
    }
}
