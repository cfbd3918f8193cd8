//! EtherCAT attack modules for Kraken
//!
//! ### ecat_dos
//! Frame flood, AL state change to INIT, burst-pause timing disruption and
//! large frames. See [`ecat_dos`].
//!
//! ### ecat_inject
//! Spoofed working counter, invalid length field, slave impersonation and
//! NOP flood. See [`ecat_inject`].
//!
//! ### ecat_mitm
//! Capture followed by replay, forged working counter, corrupted data and
//! command substitution. See [`ecat_mitm`].
//!
//! Frames these modules emit carry the `KRKN` attribution marker at the
//! front of their data section.

pub mod ecat_dos;
pub mod ecat_inject;
pub mod ecat_mitm;
pub mod testcase;

pub use ecat_dos::EcatDosModule;
pub use ecat_inject::EcatInjectModule;
pub use ecat_mitm::{EcatMitmModule, Mutation};
pub use testcase::{TestCase, TestOutcome};

use kraken_core::Module;
use std::sync::Arc;

/// Every module this crate provides
pub fn all() -> Vec<Arc<dyn Module>> {
    vec![
        Arc::new(EcatDosModule::new()),
        Arc::new(EcatInjectModule::new()),
        Arc::new(EcatMitmModule::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_modules() {
        let ids: Vec<&str> = all().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["ecat_dos", "ecat_inject", "ecat_mitm"]);

        let finding_ids: Vec<&str> = all().iter().map(|m| m.descriptor().finding_id).collect();
        assert_eq!(finding_ids, vec!["ecat-dos", "ecat-injection", "ecat-mitm"]);
    }
}
