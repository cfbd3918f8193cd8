//! Module trait and descriptors

use crate::{AttackContext, Evidence, Result, Severity};

/// Static metadata about a module
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Module identifier (e.g. "ecat_dos")
    pub id: &'static str,
    /// Identifier stamped on the finding (e.g. "ecat-dos")
    pub finding_id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Finding title
    pub title: &'static str,
    /// What the module does
    pub description: &'static str,
    /// Tags copied onto the finding
    pub tags: &'static [&'static str],
}

/// Result of a module run, before it is turned into a finding
#[derive(Debug, Clone)]
pub struct ModuleOutcome {
    pub success: bool,
    pub severity: Severity,
    pub description: String,
    pub evidence: Evidence,
}

/// Trait that every attack module implements
pub trait Module: Send + Sync {
    /// Module metadata
    fn descriptor(&self) -> &'static ModuleDescriptor;

    /// Drive the module's attack sequence.
    ///
    /// Per-frame transport failures are absorbed into the context's counters
    /// and log; an `Err` means the run could not produce a result at all.
    fn run(&self, ctx: &mut AttackContext<'_>) -> Result<ModuleOutcome>;

    /// Module identifier
    fn id(&self) -> &'static str {
        self.descriptor().id
    }
}
