//! Module executor
//!
//! Runs one module against an established connection and turns what it did
//! into a [`RunResult`]:
//! - allocates a run id and a tracing span for the invocation
//! - hands the module an [`AttackContext`] carrying the overall deadline
//! - folds the context's send counters into the finding's evidence

use kraken_core::{
    AttackContext, Connection, Evidence, Module, ModuleParams, Result, RunResult, Target,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::report::ReportBuilder;

/// Executes a single module invocation
pub struct ModuleExecutor {
    /// Unique identifier for this invocation
    id: Uuid,
    module: Arc<dyn Module>,
}

impl ModuleExecutor {
    pub fn new(module: Arc<dyn Module>) -> Self {
        Self {
            id: Uuid::now_v7(),
            module,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run the module.
    ///
    /// A zero `timeout` means no overall deadline. The result holds the
    /// module's log lines and exactly one finding; the target is copied, so
    /// the caller's value stays untouched. An `Err` means the module could
    /// not run (bad parameters, a frame that failed to build).
    pub fn run(
        self,
        conn: &mut dyn Connection,
        target: &Target,
        timeout: Duration,
        params: &ModuleParams,
    ) -> Result<RunResult> {
        let descriptor = self.module.descriptor();
        let span = info_span!("module", module = descriptor.id, run_id = %self.id);
        let _enter = span.enter();

        info!(
            peer = %target,
            timeout_ms = timeout.as_millis() as u64,
            params = params.len(),
            "Starting module"
        );

        let mut ctx = AttackContext::new(conn, target, params, descriptor.id, timeout);
        let outcome = match self.module.run(&mut ctx) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Module failed");
                return Err(e);
            }
        };
        let output = ctx.finish();

        let extra = Evidence::new()
            .with("run_id", self.id)
            .with("frames_sent", output.stats.sent)
            .with("send_failures", output.stats.failed)
            .with("bytes_sent", output.stats.bytes_sent)
            .with("elapsed_ms", output.elapsed.as_millis());

        let mut report = ReportBuilder::new(target);
        report.extend_logs(output.logs);
        let finding = report.add_finding(descriptor, outcome, extra);

        info!(
            success = finding.success,
            severity = %finding.severity,
            sent = output.stats.sent,
            failed = output.stats.failed,
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Module finished"
        );

        Ok(report.build())
    }
}

/// Run `module` once; shorthand for `ModuleExecutor::new(module).run(..)`
pub fn run_module(
    module: Arc<dyn Module>,
    conn: &mut dyn Connection,
    target: &Target,
    timeout: Duration,
    params: &ModuleParams,
) -> Result<RunResult> {
    ModuleExecutor::new(module).run(conn, target, timeout, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraken_core::{Error, EtherCatTarget, ScriptedConnection, Severity};
    use kraken_modules::{EcatDosModule, EcatInjectModule, EcatMitmModule};

    fn ethercat_target() -> Target {
        Target::EtherCat(
            EtherCatTarget::new("eth0", "02:00:00:00:00:01").with_slaves(vec![0x1001, 0x1002]),
        )
    }

    #[test]
    fn test_single_finding_with_own_target() {
        let mut conn = ScriptedConnection::new();
        let target = ethercat_target();
        let params = ModuleParams::new();

        let result = run_module(
            Arc::new(EcatInjectModule::new()),
            &mut conn,
            &target,
            Duration::ZERO,
            &params,
        )
        .unwrap();

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.target, target);
        assert_eq!(result.findings[0].target, target);

        let finding = &result.findings[0];
        assert_eq!(finding.id, "ecat-injection");
        assert_eq!(finding.module_id, "ecat_inject");
        assert_eq!(finding.title, "EtherCAT Frame Injection");
        assert!(finding.success);
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.evidence.get("frames_sent"), Some("103"));
        assert_eq!(finding.evidence.get("send_failures"), Some("0"));
        assert!(finding.evidence.get("run_id").is_some());
        assert!(finding.evidence.get("elapsed_ms").is_some());
        assert_eq!(result.logs.first().unwrap(), "Starting EtherCAT frame injection tests");

        drop(target);
        assert_eq!(result.findings[0].target.first_slave(), Some(0x1001));
    }

    #[test]
    fn test_returned_targets_do_not_alias_input() {
        let mut conn = ScriptedConnection::new();
        let target = ethercat_target();
        let before = target.clone();

        let mut result = run_module(
            Arc::new(EcatDosModule::new()),
            &mut conn,
            &target,
            Duration::ZERO,
            &ModuleParams::new().set("flood_ms", 5u64),
        )
        .unwrap();
        assert_eq!(result.findings.len(), 1);

        for returned in [&mut result.target, &mut result.findings[0].target] {
            match returned {
                Target::EtherCat(t) => {
                    t.slaves.clear();
                    t.slaves.push(0x0BAD);
                    t.iface = "tampered".to_string();
                }
                other => panic!("unexpected target {:?}", other),
            }
        }

        assert_eq!(target, before);
        assert_eq!(target.first_slave(), Some(0x1001));
        assert_eq!(result.findings[0].target.first_slave(), Some(0x0BAD));
        assert_ne!(result.target, target);
    }

    #[test]
    fn test_run_ids_differ() {
        let a = ModuleExecutor::new(Arc::new(EcatDosModule::new()));
        let b = ModuleExecutor::new(Arc::new(EcatDosModule::new()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_invalid_params_fail_the_run() {
        let mut conn = ScriptedConnection::new();
        let target = Target::network("192.0.2.1", 0);
        let params = ModuleParams::from_pairs(["capture_ms=soon"]).unwrap();

        let result = run_module(
            Arc::new(EcatMitmModule::new()),
            &mut conn,
            &target,
            Duration::ZERO,
            &params,
        );
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_mitm_on_silent_segment() {
        let mut conn = ScriptedConnection::new();
        let target = ethercat_target();
        let params = ModuleParams::from_pairs(["capture_ms=50"]).unwrap();

        let result = run_module(
            Arc::new(EcatMitmModule::new()),
            &mut conn,
            &target,
            Duration::ZERO,
            &params,
        )
        .unwrap();

        assert_eq!(result.findings.len(), 1);
        assert!(!result.findings[0].success);
        assert_eq!(result.findings[0].severity, Severity::Info);
        assert_eq!(result.findings[0].evidence.get("frames_sent"), Some("0"));
        assert!(!result.any_success());
    }

    #[test]
    fn test_failed_sends_are_reported() {
        let mut conn = ScriptedConnection::failing();
        let target = ethercat_target();
        let params = ModuleParams::new();

        let result = run_module(
            Arc::new(EcatInjectModule::new()),
            &mut conn,
            &target,
            Duration::ZERO,
            &params,
        )
        .unwrap();

        let finding = &result.findings[0];
        assert!(!finding.success);
        assert_eq!(finding.evidence.get("send_failures"), Some("103"));
        assert_eq!(result.max_severity(), Severity::Info);
    }
}
