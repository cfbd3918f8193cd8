//! Kraken Core Library
//!
//! Fundamental traits, data model and error handling shared by the Kraken
//! EtherCAT probe modules: the connection capability set a module runs on,
//! the per-invocation attack context, and the target/finding/result types
//! a run reports back.

pub mod attack;
pub mod connection;
pub mod error;
pub mod finding;
pub mod interface;
pub mod loopback;
pub mod module;
pub mod packet;
pub mod params;
pub mod target;
pub mod types;

// Re-export commonly used types
pub use attack::{AttackContext, ContextOutput, SendStats};
pub use connection::{Connection, ConnectionInfo, ConnectionType};
pub use error::{Error, Result};
pub use finding::{Evidence, Finding, RunResult, Severity};
pub use interface::Interface;
pub use loopback::ScriptedConnection;
pub use module::{Module, ModuleDescriptor, ModuleOutcome};
pub use packet::Packet;
pub use params::{ModuleParams, ParamValue};
pub use target::{EtherCatTarget, HostPort, Target};
pub use types::*;
