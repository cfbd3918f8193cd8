//! Bounded, time-boxed capture buffer

use kraken_core::{Connection, Packet};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::filters;
use crate::stats::CaptureStats;

/// Most frames one capture window keeps
pub const CAPTURE_CAPACITY: usize = 100;

/// Size of the receive buffer handed to the connection
pub const RECV_BUFFER_LEN: usize = 1500;

/// Default timeout of a single receive
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(50);

/// Default length of the capture window
pub const DEFAULT_CAPTURE_DURATION: Duration = Duration::from_millis(2000);

/// Configuration for one capture window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// How long to listen
    pub duration: Duration,
    /// Upper bound for each receive; the last one is shortened to the deadline
    pub recv_timeout: Duration,
}

impl CaptureConfig {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }

    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_DURATION)
    }
}

/// Frames captured during one window, in arrival order
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    frames: Vec<Packet>,
    stats: CaptureStats,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(CAPTURE_CAPACITY),
            stats: CaptureStats::new(),
        }
    }

    /// Listen on `conn` until the window closes or the buffer is full.
    ///
    /// Previous contents are discarded first. Receive errors and empty reads
    /// are counted and the loop carries on. Returns the number of frames
    /// stored; zero is a normal outcome.
    pub fn capture(&mut self, conn: &mut dyn Connection, config: &CaptureConfig) -> usize {
        self.clear();

        let started = Instant::now();
        let deadline = started + config.duration;
        let mut buf = [0u8; RECV_BUFFER_LEN];

        debug!(
            duration_ms = config.duration.as_millis() as u64,
            capacity = CAPTURE_CAPACITY,
            "Starting capture"
        );

        loop {
            let now = Instant::now();
            if now >= deadline || self.frames.len() >= CAPTURE_CAPACITY {
                break;
            }

            let wait = config.recv_timeout.min(deadline - now);
            match conn.recv(&mut buf, wait) {
                Ok(0) => self.stats.record_idle(),
                Ok(n) => {
                    let chunk = &buf[..n.min(buf.len())];
                    let verdict = filters::classify(chunk);
                    trace!(len = chunk.len(), ?verdict, "Received chunk");
                    if verdict.is_accepted() {
                        self.frames.push(Packet::new(chunk.to_vec()));
                    }
                    self.stats.record_chunk(chunk, verdict);
                }
                Err(e) => {
                    debug!(error = %e, "Receive failed during capture");
                    self.stats.record_error();
                }
            }
        }

        self.stats.elapsed = started.elapsed();
        debug!(
            captured = self.frames.len(),
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "Capture finished"
        );

        self.frames.len()
    }

    /// Drop all frames and reset the statistics
    pub fn clear(&mut self) {
        self.frames.clear();
        self.stats = CaptureStats::new();
    }

    pub fn frames(&self) -> &[Packet] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Packet> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}
