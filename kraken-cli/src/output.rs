//! Report rendering

use kraken_core::RunResult;
use std::fmt::Write;

/// Plain-text report: target, run log, then one block per finding
pub fn render_text(result: &RunResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Target: {}", result.target);
    let _ = writeln!(out);
    for line in &result.logs {
        let _ = writeln!(out, "{}", line);
    }

    for finding in &result.findings {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "[{}] {} ({}): {}",
            finding.severity.as_str().to_uppercase(),
            finding.title,
            finding.id,
            if finding.success { "vulnerable" } else { "not demonstrated" }
        );
        let _ = writeln!(out, "  {}", finding.description);
        for (key, value) in finding.evidence.iter() {
            let _ = writeln!(out, "    {:<24} {}", key, value);
        }
    }

    out
}

/// JSON report with the same shape as [`RunResult`]
pub fn render_json(result: &RunResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraken_core::{Evidence, Finding, Severity, Target};

    fn sample() -> RunResult {
        let target = Target::network("192.0.2.5", 0);
        RunResult {
            target: target.clone(),
            findings: vec![Finding {
                id: "ecat-dos".to_string(),
                module_id: "ecat_dos".to_string(),
                success: true,
                title: "EtherCAT DoS Testing".to_string(),
                severity: Severity::Medium,
                description: "Sent 42 frames.".to_string(),
                evidence: Evidence::new().with("total_sent", 42),
                tags: vec!["ethercat".to_string()],
                timestamp: 1_700_000_000,
                target,
            }],
            logs: vec!["Starting EtherCAT DoS tests".to_string(), "Total frames sent: 42".to_string()],
        }
    }

    #[test]
    fn test_text_report() {
        let text = render_text(&sample());
        assert!(text.starts_with("Target: 192.0.2.5:0\n"));
        assert!(text.contains("Total frames sent: 42\n"));
        assert!(text.contains("[MEDIUM] EtherCAT DoS Testing (ecat-dos): vulnerable\n"));
        assert!(text.contains("total_sent"));
    }

    #[test]
    fn test_json_report() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["target"]["kind"], "network");
        assert_eq!(value["findings"][0]["severity"], "medium");
        assert_eq!(value["findings"][0]["evidence"]["total_sent"], "42");
        assert_eq!(value["logs"][1], "Total frames sent: 42");
    }
}
