//! Report assembly
//!
//! The builder keeps its own copy of the target and stamps another copy on
//! every finding, so a finished [`RunResult`] shares nothing with the caller.

use chrono::Utc;
use kraken_core::{Evidence, Finding, ModuleDescriptor, ModuleOutcome, RunResult, Target};
use tracing::debug;

/// Accumulates log lines and findings for one module invocation
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    target: Target,
    findings: Vec<Finding>,
    logs: Vec<String>,
}

impl ReportBuilder {
    pub fn new(target: &Target) -> Self {
        Self {
            target: target.clone(),
            findings: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Append lines in order
    pub fn extend_logs<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.logs.extend(lines);
    }

    /// Turn a module outcome into a finding.
    ///
    /// `extra` is merged into the outcome's evidence; keys the module set
    /// itself win.
    pub fn add_finding(
        &mut self,
        descriptor: &ModuleDescriptor,
        outcome: ModuleOutcome,
        extra: Evidence,
    ) -> &Finding {
        let mut evidence = outcome.evidence;
        evidence.merge(extra);

        debug!(
            id = descriptor.finding_id,
            success = outcome.success,
            severity = %outcome.severity,
            "Adding finding"
        );

        self.findings.push(Finding {
            id: descriptor.finding_id.to_string(),
            module_id: descriptor.id.to_string(),
            success: outcome.success,
            title: descriptor.title.to_string(),
            severity: outcome.severity,
            description: outcome.description,
            evidence,
            tags: descriptor.tags.iter().map(|t| t.to_string()).collect(),
            timestamp: Utc::now().timestamp(),
            target: self.target.clone(),
        });

        let last = self.findings.len() - 1;
        &self.findings[last]
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn build(self) -> RunResult {
        RunResult {
            target: self.target,
            findings: self.findings,
            logs: self.logs,
        }
    }
}
