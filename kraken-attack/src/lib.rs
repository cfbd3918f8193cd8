//! Module execution and reporting for Kraken
//!
//! - `ModuleRegistry`: lookup of modules by id
//! - `ModuleExecutor`: runs one module against a connection with an
//!   overall deadline and collects its log and send counters
//! - `ReportBuilder`: turns module outcomes into findings that carry their
//!   own copy of the target
//!
//! # Example
//!
//! ```no_run
//! use kraken_attack::{run_module, ModuleRegistry};
//! use kraken_core::{ModuleParams, ScriptedConnection, Target};
//! use std::time::Duration;
//!
//! fn main() -> kraken_core::Result<()> {
//!     let registry = ModuleRegistry::with_modules(kraken_modules::all())?;
//!     let module = registry.require("ecat_inject")?;
//!
//!     let mut conn = ScriptedConnection::new();
//!     let target = Target::network("192.0.2.10", 0);
//!     let result = run_module(
//!         module,
//!         &mut conn,
//!         &target,
//!         Duration::from_secs(10),
//!         &ModuleParams::new(),
//!     )?;
//!
//!     for line in &result.logs {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod executor;
pub mod registry;
pub mod report;

pub use executor::{run_module, ModuleExecutor};
pub use registry::{ModuleInfo, ModuleRegistry};
pub use report::ReportBuilder;
