//! Compliance report construction.
//!
//! A report is a pure function of one `ScanResult` and the configured
//! thresholds; it performs no I/O and reuses the scan timestamp.

use crate::models::{ComplianceReport, ReportOverview, ScanResult, ScanSummary, SeverityCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const REVIEW_USAGE: &str = "Consider reviewing component usage patterns to improve compliance";
pub const ADDRESS_ISSUES: &str =
    "Address validation issues to improve accessibility and design system compliance";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// When to emit recommendations.
pub struct Thresholds {
    /// Recommend reviewing usage patterns below this score.
    pub review_below_score: f64,
    /// Recommend addressing issues when more than this many were found.
    pub issues_above: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            review_below_score: 80.0,
            issues_above: 0,
        }
    }
}

/// Compliant share of all usages in percent; 100 when there are none.
pub fn compliance_score(summary: &ScanSummary) -> f64 {
    if summary.total_components == 0 {
        100.0
    } else {
        summary.compliant_components as f64 / summary.total_components as f64 * 100.0
    }
}

fn project_name(project_path: &str) -> String {
    Path::new(project_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn recommendations(score: f64, issues_found: usize, thresholds: &Thresholds) -> Vec<String> {
    let mut out = Vec::new();
    if score < thresholds.review_below_score {
        out.push(REVIEW_USAGE.to_string());
    }
    if issues_found > thresholds.issues_above {
        out.push(ADDRESS_ISSUES.to_string());
    }
    out
}

/// Fold a scan into a compliance report.
pub fn build_report(scan: &ScanResult, thresholds: &Thresholds) -> ComplianceReport {
    let score = compliance_score(&scan.summary);
    let issues: Vec<_> = scan
        .components
        .iter()
        .flat_map(|c| c.issues.iter().cloned())
        .collect();
    let mut severity_counts = SeverityCounts::default();
    let mut rule_counts: BTreeMap<String, usize> = BTreeMap::new();
    for issue in &issues {
        severity_counts.add(issue.severity);
        *rule_counts.entry(issue.rule.clone()).or_default() += 1;
    }
    ComplianceReport {
        overview: ReportOverview {
            project_name: project_name(&scan.project_path),
            scan_date: scan.timestamp.clone(),
            total_files: scan.scanned_files.len(),
            total_components: scan.summary.total_components,
            compliance_score: score,
        },
        components: scan.components.clone(),
        recommendations: recommendations(score, scan.summary.issues_found, thresholds),
        issues,
        severity_counts,
        rule_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComponentUsage, Severity, ValidationIssue};

    fn scan_of(total: usize, failing: usize) -> ScanResult {
        let components = (0..total)
            .map(|i| {
                let u = ComponentUsage::new("va-button", "va-button", "src/a.vue", i + 1, 1);
                if i < failing {
                    u.with_issues(vec![ValidationIssue::accessibility(
                        "missing-accessible-name",
                        Severity::Error,
                        "no name",
                    )])
                } else {
                    u
                }
            })
            .collect();
        ScanResult::new(
            "/work/benefits-app",
            vec!["src/a.vue".to_string()],
            components,
            Vec::new(),
            "2024-05-01T10:00:00+00:00",
        )
    }

    #[test]
    fn test_ninety_percent_recommends_addressing_issues_only() {
        let report = build_report(&scan_of(10, 1), &Thresholds::default());
        assert_eq!(report.overview.compliance_score, 90.0);
        assert_eq!(report.recommendations, vec![ADDRESS_ISSUES.to_string()]);
        assert_eq!(report.overview.project_name, "benefits-app");
        assert_eq!(report.overview.scan_date, "2024-05-01T10:00:00+00:00");
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.severity_counts.error, 1);
        assert_eq!(report.rule_counts["missing-accessible-name"], 1);
    }

    #[test]
    fn test_empty_scan_scores_full() {
        let report = build_report(&scan_of(0, 0), &Thresholds::default());
        assert_eq!(report.overview.compliance_score, 100.0);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.overview.total_files, 1);
    }

    #[test]
    fn test_low_score_recommends_both() {
        let report = build_report(&scan_of(4, 3), &Thresholds::default());
        assert_eq!(report.overview.compliance_score, 25.0);
        assert_eq!(
            report.recommendations,
            vec![REVIEW_USAGE.to_string(), ADDRESS_ISSUES.to_string()]
        );
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let lenient = Thresholds {
            review_below_score: 10.0,
            issues_above: 5,
        };
        assert!(build_report(&scan_of(4, 3), &lenient).recommendations.is_empty());
    }

    #[test]
    fn test_report_is_pure() {
        let scan = scan_of(3, 1);
        assert_eq!(
            build_report(&scan, &Thresholds::default()),
            build_report(&scan, &Thresholds::default())
        );
    }
}
