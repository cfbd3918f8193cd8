//! Command-line runner for Kraken
//!
//! Parses arguments, opens a raw Ethernet channel on the requested
//! interface (or an in-memory one for dry runs), runs a single module and
//! prints its report as text or JSON.

pub mod args;
pub mod commands;
pub mod output;
pub mod transport;

pub use args::{Cli, Commands, RunArgs};
pub use commands::execute;
pub use transport::EthernetConnection;

use thiserror::Error;

/// Errors surfaced by the `kraken` binary
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Kraken(#[from] kraken_core::Error),

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}
