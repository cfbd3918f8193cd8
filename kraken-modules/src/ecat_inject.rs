//! EtherCAT frame injection probes
//!
//! Checks whether crafted datagrams make it onto the segment: a spoofed
//! working counter, a lying length field, a response impersonating a slave
//! and a burst of NOPs.

use kraken_core::{AttackContext, Evidence, Module, ModuleDescriptor, ModuleOutcome, Result, Severity};
use tracing::info;

use crate::testcase::TestCase;

static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    id: "ecat_inject",
    finding_id: "ecat-injection",
    name: "EtherCAT Injection",
    title: "EtherCAT Frame Injection",
    description: "Spoofed WKC, invalid length, slave impersonation and NOP flood injection tests",
    tags: &["ethercat", "injection", "integrity"],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct EcatInjectModule;

impl EcatInjectModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for EcatInjectModule {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &DESCRIPTOR
    }

    fn run(&self, ctx: &mut AttackContext<'_>) -> Result<ModuleOutcome> {
        ctx.log("Starting EtherCAT frame injection tests");

        let suite = TestCase::INJECTION_SUITE;
        let mut evidence = Evidence::new();
        let mut passed = 0usize;

        for test in suite.iter() {
            if ctx.is_expired() {
                ctx.log(format!("Timeout reached, skipping remaining tests from {}", test.name()));
                break;
            }

            ctx.log(format!("Test: {}", test.name()));
            let outcome = test.run(ctx)?;
            if outcome.passed() {
                passed += 1;
                ctx.log("  PASS: Frame injected");
            } else {
                ctx.log("  FAIL: Could not inject");
            }
            evidence.insert(test.name(), if outcome.passed() { "pass" } else { "fail" });
        }

        ctx.log(format!("Results: {}/{} tests passed", passed, suite.len()));
        info!(module = DESCRIPTOR.id, passed, total = suite.len(), "Injection tests finished");

        let success = passed > 0;
        Ok(ModuleOutcome {
            success,
            severity: if success { Severity::Medium } else { Severity::Info },
            description: format!(
                "Injected {}/{} test frames. Master accepts injected EtherCAT frames on the network.",
                passed,
                suite.len()
            ),
            evidence: evidence.with("passed", passed).with("total", suite.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraken_core::{EtherCatTarget, ModuleParams, ScriptedConnection, Target};
    use std::time::Duration;

    fn run(conn: &mut ScriptedConnection, target: &Target) -> (ModuleOutcome, Vec<String>) {
        let params = ModuleParams::new();
        let mut ctx = AttackContext::new(conn, target, &params, DESCRIPTOR.id, Duration::ZERO);
        let outcome = EcatInjectModule::new().run(&mut ctx).unwrap();
        (outcome, ctx.finish().logs)
    }

    #[test]
    fn test_all_tests_pass() {
        let mut conn = ScriptedConnection::new();
        let (outcome, logs) = run(&mut conn, &Target::network("192.0.2.30", 0));

        assert!(outcome.success);
        assert_eq!(outcome.severity, Severity::Medium);
        assert_eq!(
            logs,
            vec![
                "Starting EtherCAT frame injection tests",
                "Test: spoofed_wkc",
                "  Sent BRD with spoofed WKC=99",
                "  PASS: Frame injected",
                "Test: invalid_length",
                "  Sent frame with mismatched length field",
                "  PASS: Frame injected",
                "Test: slave_impersonation",
                "  Sent FPRD response impersonating slave 0x1000",
                "  PASS: Frame injected",
                "Test: nop_flood",
                "  Sent 100 NOP frames",
                "  PASS: Frame injected",
                "Results: 4/4 tests passed",
            ]
        );
        assert_eq!(conn.sent_count(), 103);
        assert_eq!(conn.sent()[1].len(), 16);
        assert_eq!(
            outcome.description,
            "Injected 4/4 test frames. Master accepts injected EtherCAT frames on the network."
        );
    }

    #[test]
    fn test_nothing_injected() {
        let mut conn = ScriptedConnection::failing();
        let (outcome, logs) = run(&mut conn, &Target::network("192.0.2.30", 0));

        assert!(!outcome.success);
        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(logs.iter().filter(|l| *l == "  FAIL: Could not inject").count(), 4);
        assert_eq!(logs.last().unwrap(), "Results: 0/4 tests passed");
        assert_eq!(outcome.evidence.get("spoofed_wkc"), Some("fail"));
    }

    #[test]
    fn test_impersonates_observed_slave() {
        let mut conn = ScriptedConnection::new();
        let target = Target::EtherCat(
            EtherCatTarget::new("eth1", "02:00:00:00:00:0a").with_slaves(vec![0x03E9]),
        );
        let (_, logs) = run(&mut conn, &target);
        assert!(logs.contains(&"  Sent FPRD response impersonating slave 0x03E9".to_string()));
    }
}
