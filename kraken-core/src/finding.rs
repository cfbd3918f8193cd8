//! Findings and run results

use crate::Target;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value evidence attached to a finding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Evidence(BTreeMap<String, String>);

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Merge another evidence block; keys already present are kept
    pub fn merge(&mut self, other: Evidence) {
        for (key, value) in other.0 {
            self.0.entry(key).or_insert(value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One conclusion drawn by a module invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Stable finding identifier (e.g. "ecat-mitm")
    pub id: String,
    /// Identifier of the module that produced it (e.g. "ecat_mitm")
    pub module_id: String,
    /// Whether an attack frame was demonstrably transmitted
    pub success: bool,
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub evidence: Evidence,
    pub tags: Vec<String>,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub target: Target,
}

/// Everything a module invocation hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub target: Target,
    pub findings: Vec<Finding>,
    /// Human-readable log lines in emission order
    pub logs: Vec<String>,
}

impl RunResult {
    /// Highest severity among all findings
    pub fn max_severity(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Info)
    }

    pub fn any_success(&self) -> bool {
        self.findings.iter().any(|f| f.success)
    }
}
