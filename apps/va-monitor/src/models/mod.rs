//! Shared data models: component usages, validation issues, scan results and
//! compliance reports, plus the catalog schema in `catalog`.
//!
//! Every record serializes with camelCase keys (`componentName`,
//! `isCompliant`, `scannedFiles`, ...) so JSON consumers see a stable shape.

pub mod catalog;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Rule family an issue belongs to.
pub enum IssueType {
    Accessibility,
    DesignSystem,
    Performance,
    BestPractice,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Accessibility => "accessibility",
            IssueType::DesignSystem => "design-system",
            IssueType::Performance => "performance",
            IssueType::BestPractice => "best-practice",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity. Variant order gives `Error > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
/// A statically known prop value. Numbers keep their source text.
pub enum Literal {
    String(String),
    Number(String),
    Bool(bool),
}

impl Literal {
    /// Text used when comparing against enumerated value sets.
    pub fn text(&self) -> String {
        match self {
            Literal::String(s) | Literal::Number(s) => s.clone(),
            Literal::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
/// Normalized prop value descriptor.
///
/// Rules must treat `Unresolved` as "present but unknown": it satisfies a
/// presence requirement but can never pass or fail a value check.
pub enum PropValue {
    Literal(Literal),
    Reference(String),
    Unresolved,
}

impl PropValue {
    pub fn string(s: impl Into<String>) -> Self {
        PropValue::Literal(Literal::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        PropValue::Literal(Literal::Bool(b))
    }

    /// True for a literal that switches a prop on: anything except `false`
    /// and the string `"false"`.
    pub fn is_set_literal(&self) -> bool {
        match self {
            PropValue::Literal(Literal::Bool(b)) => *b,
            PropValue::Literal(Literal::String(s)) => s != "false",
            PropValue::Literal(Literal::Number(_)) => true,
            _ => false,
        }
    }

    /// False only for literals that explicitly switch a prop off.
    pub fn is_enabled(&self) -> bool {
        match self {
            PropValue::Literal(_) => self.is_set_literal(),
            _ => true,
        }
    }
}

/// Normalize a prop name for comparison: case and `-`/`_` separators are
/// ignored, so `messageAriaDescribedby` matches `message-aria-describedby`.
pub fn prop_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One rule violation.
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub severity: Severity,
    pub message: String,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ValidationIssue {
    pub fn new(
        kind: IssueType,
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            rule: rule.into(),
            prop: None,
            line: None,
            column: None,
        }
    }

    pub fn design(rule: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(IssueType::DesignSystem, rule, severity, message)
    }

    pub fn accessibility(
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::new(IssueType::Accessibility, rule, severity, message)
    }

    pub fn with_prop(mut self, prop: impl Into<String>) -> Self {
        self.prop = Some(prop.into());
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One observed invocation of a catalog component.
pub struct ComponentUsage {
    /// Canonical kebab-case catalog name (`va-button`).
    pub component_name: String,
    /// Identifier exactly as written (`VaButton`, `va-button`).
    pub tag: String,
    pub file_path: String,
    pub line_number: usize,
    pub column: usize,
    pub props: BTreeMap<String, PropValue>,
    /// The site carries a spread, so any prop may be supplied dynamically.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spread: bool,
    /// Index of the nearest enclosing catalog usage in the same file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub is_compliant: bool,
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,
}

impl ComponentUsage {
    pub fn new(
        component_name: impl Into<String>,
        tag: impl Into<String>,
        file_path: impl Into<String>,
        line_number: usize,
        column: usize,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            tag: tag.into(),
            file_path: file_path.into(),
            line_number,
            column,
            props: BTreeMap::new(),
            spread: false,
            parent: None,
            is_compliant: true,
            issues: Vec::new(),
        }
    }

    /// Look a prop up by name, ignoring case and separators.
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        let key = prop_key(name);
        self.props
            .iter()
            .find(|(k, _)| prop_key(k) == key)
            .map(|(_, v)| v)
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.prop(name).is_some()
    }

    /// First of `names` that is present, with its value.
    pub fn first_prop<'a, S: AsRef<str>>(
        &'a self,
        names: &'a [S],
    ) -> Option<(&'a str, &'a PropValue)> {
        names
            .iter()
            .find_map(|n| self.prop(n.as_ref()).map(|v| (n.as_ref(), v)))
    }

    /// Attach evaluated issues, keeping `is_compliant == issues.is_empty()`.
    pub fn with_issues(mut self, issues: Vec<ValidationIssue>) -> Self {
        self.is_compliant = issues.is_empty();
        self.issues = issues;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Aggregate counts over one scan.
pub struct ScanSummary {
    pub total_components: usize,
    pub compliant_components: usize,
    pub issues_found: usize,
    pub coverage_percentage: f64,
}

impl ScanSummary {
    pub fn from_components(components: &[ComponentUsage], files: usize) -> Self {
        let total = components.len();
        Self {
            total_components: total,
            compliant_components: components.iter().filter(|c| c.is_compliant).count(),
            issues_found: components.iter().map(|c| c.issues.len()).sum(),
            coverage_percentage: if files > 0 {
                total as f64 / files as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A file that was skipped, with the reason.
pub struct ScanWarning {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Output of scanning one project tree.
pub struct ScanResult {
    pub project_path: String,
    pub scanned_files: Vec<String>,
    pub components: Vec<ComponentUsage>,
    pub summary: ScanSummary,
    #[serde(default)]
    pub warnings: Vec<ScanWarning>,
    pub timestamp: String,
}

impl ScanResult {
    /// Build a result, deriving the summary from `components`.
    pub fn new(
        project_path: impl Into<String>,
        scanned_files: Vec<String>,
        components: Vec<ComponentUsage>,
        warnings: Vec<ScanWarning>,
        timestamp: impl Into<String>,
    ) -> Self {
        let summary = ScanSummary::from_components(&components, scanned_files.len());
        Self {
            project_path: project_path.into(),
            scanned_files,
            components,
            summary,
            warnings,
            timestamp: timestamp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOverview {
    pub project_name: String,
    pub scan_date: String,
    pub total_files: usize,
    pub total_components: usize,
    pub compliance_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Self-describing compliance view over exactly one `ScanResult`.
pub struct ComplianceReport {
    pub overview: ReportOverview,
    pub components: Vec<ComponentUsage>,
    pub issues: Vec<ValidationIssue>,
    pub severity_counts: SeverityCounts,
    pub rule_counts: BTreeMap<String, usize>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_lookup_ignores_case_and_separators() {
        let mut u = ComponentUsage::new("va-text-input", "VaTextInput", "a.tsx", 1, 1);
        u.props
            .insert("messageAriaDescribedby".into(), PropValue::string("hint"));
        assert!(u.has_prop("message-aria-describedby"));
        assert!(u.has_prop("MESSAGE_ARIA_DESCRIBEDBY"));
        assert!(!u.has_prop("label"));
    }

    #[test]
    fn test_with_issues_keeps_compliance_invariant() {
        let u = ComponentUsage::new("va-button", "va-button", "a.vue", 3, 5);
        assert!(u.is_compliant);
        let u = u.with_issues(vec![ValidationIssue::design(
            "unknown-component",
            Severity::Info,
            "x",
        )]);
        assert!(!u.is_compliant);
        let u = u.with_issues(Vec::new());
        assert!(u.is_compliant);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_summary_coverage_zero_files() {
        let s = ScanSummary::from_components(&[], 0);
        assert_eq!(s.coverage_percentage, 0.0);
        assert_eq!(s.total_components, 0);
    }

    #[test]
    fn test_usage_json_shape() {
        let mut u = ComponentUsage::new("va-alert", "va-alert", "a.vue", 2, 3);
        u.props.insert("status".into(), PropValue::string("info"));
        let v = serde_json::to_value(&u).unwrap();
        assert_eq!(v["componentName"], "va-alert");
        assert_eq!(v["lineNumber"], 2);
        assert_eq!(v["isCompliant"], true);
        assert_eq!(v["props"]["status"]["kind"], "literal");
        assert_eq!(v["props"]["status"]["value"]["value"], "info");
        assert!(v.get("parent").is_none());
        assert!(v.get("spread").is_none());
    }
}
