//! Time-boxed EtherCAT capture for Kraken
//!
//! A [`CaptureBuffer`] listens on an established connection for a fixed
//! window and keeps up to [`CAPTURE_CAPACITY`] EtherCAT frames, link header
//! included, for later replay.
//!
//! ## Example
//!
//! ```
//! use kraken_capture::{CaptureBuffer, CaptureConfig};
//! use kraken_core::ScriptedConnection;
//! use std::time::Duration;
//!
//! let mut conn = ScriptedConnection::new();
//! let mut buffer = CaptureBuffer::new();
//! let captured = buffer.capture(&mut conn, &CaptureConfig::new(Duration::from_millis(10)));
//! assert_eq!(captured, 0);
//! ```

pub mod capture;
pub mod filters;
pub mod stats;

pub use capture::{CaptureBuffer, CaptureConfig, CAPTURE_CAPACITY};
pub use filters::{classify, Verdict};
pub use stats::CaptureStats;
