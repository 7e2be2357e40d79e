//! Output rendering for scan, validate, report and catalog commands.
//!
//! Supports `human` (default) and `json` outputs. JSON goes to stdout with
//! the camelCase shape of the models; human output is colored unless
//! `NO_COLOR` is set.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::{ComplianceReport, ComponentUsage, ScanResult, Severity, ValidationIssue};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// `error:` prefix for stderr messages.
pub fn error_prefix() -> String {
    if use_colors("human") {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors("human") {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

fn badge(severity: Severity, color: bool) -> String {
    let (icon, label) = match severity {
        Severity::Error => ("✖", "⟦error⟧"),
        Severity::Warning => ("▲", "⟦warn⟧"),
        Severity::Info => ("◆", "⟦info⟧"),
    };
    if !color {
        return format!("{} {}", icon, label);
    }
    match severity {
        Severity::Error => format!("{} {}", icon.red(), label.red().bold()),
        Severity::Warning => format!("{} {}", icon.yellow(), label.yellow().bold()),
        Severity::Info => format!("{} {}", icon.blue(), label.blue().bold()),
    }
}

fn bold(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn print_issue(file: &str, issue: &ValidationIssue, color: bool) {
    let at = match (issue.line, issue.column) {
        (Some(l), Some(c)) => format!("{}:{}:{}", file, l, c),
        _ => file.to_string(),
    };
    println!(
        "{} {} ❲{}❳ {}",
        badge(issue.severity, color),
        bold(&at, color),
        issue.rule,
        issue.message
    );
}

fn print_json(value: &JsonVal) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a scan result in the requested format.
pub fn print_scan(res: &ScanResult, output: &str) -> Result<()> {
    if output == "json" {
        return print_json(&compose_scan_json(res)?);
    }
    let color = use_colors(output);
    for c in &res.components {
        for issue in &c.issues {
            print_issue(&c.file_path, issue, color);
        }
    }
    for w in &res.warnings {
        let label = if color {
            "skipped:".bright_black().to_string()
        } else {
            "skipped:".to_string()
        };
        println!("{} {} ({})", label, w.file, w.message);
    }
    let s = &res.summary;
    let summary = format!(
        "— Summary — files={} components={} compliant={} issues={} skipped={}",
        res.scanned_files.len(),
        s.total_components,
        s.compliant_components,
        s.issues_found,
        res.warnings.len()
    );
    println!("{}", bold(&summary, color));
    Ok(())
}

/// Print one validated usage.
pub fn print_usage(usage: &ComponentUsage, output: &str) -> Result<()> {
    if output == "json" {
        return print_json(&serde_json::to_value(usage)?);
    }
    let color = use_colors(output);
    let status = match (usage.is_compliant, color) {
        (true, true) => "compliant".green().bold().to_string(),
        (true, false) => "compliant".to_string(),
        (false, true) => "not compliant".red().bold().to_string(),
        (false, false) => "not compliant".to_string(),
    };
    let at = format!(
        "{}:{}:{}",
        usage.file_path, usage.line_number, usage.column
    );
    println!("{} {} {}", bold(&usage.tag, color), at, status);
    for issue in &usage.issues {
        print_issue(&usage.file_path, issue, color);
    }
    Ok(())
}

/// Print a compliance report.
pub fn print_report(report: &ComplianceReport, output: &str) -> Result<()> {
    if output == "json" {
        return print_json(&serde_json::to_value(report)?);
    }
    let color = use_colors(output);
    let o = &report.overview;
    println!("{}", bold(&format!("Compliance report: {}", o.project_name), color));
    println!("scanned {}", o.scan_date);
    println!(
        "files={} components={} score={:.1}%",
        o.total_files, o.total_components, o.compliance_score
    );
    let sc = &report.severity_counts;
    println!(
        "errors={} warnings={} infos={}",
        sc.error, sc.warning, sc.info
    );
    if !report.rule_counts.is_empty() {
        println!("{}", bold("By rule:", color));
        for (rule, n) in &report.rule_counts {
            println!("  {:<28} {}", rule, n);
        }
    }
    if !report.recommendations.is_empty() {
        println!("{}", bold("Recommendations:", color));
        for r in &report.recommendations {
            println!("  • {}", r);
        }
    }
    Ok(())
}

/// Print the resolved component catalog.
pub fn print_catalog(catalog: &Catalog, output: &str) -> Result<()> {
    if output == "json" {
        return print_json(&compose_catalog_json(catalog)?);
    }
    let color = use_colors(output);
    println!(
        "{} {} ({} components)",
        bold(&catalog.name, color),
        catalog.version,
        catalog.len()
    );
    for c in catalog.components() {
        let mut line = c.name.clone();
        if !c.required.is_empty() {
            line.push_str(&format!(" required=[{}]", c.required.join(", ")));
        }
        if c.deprecated {
            let note = match &c.replacement {
                Some(r) => format!(" deprecated, use {}", r),
                None => " deprecated".to_string(),
            };
            if color {
                line.push_str(&note.yellow().to_string());
            } else {
                line.push_str(&note);
            }
        }
        println!("  {}", line);
    }
    Ok(())
}

/// Compose scan JSON object (pure) for testing/snapshot purposes.
pub fn compose_scan_json(res: &ScanResult) -> Result<JsonVal> {
    Ok(serde_json::to_value(res)?)
}

/// Compose catalog JSON object (pure) for testing/snapshot purposes.
pub fn compose_catalog_json(catalog: &Catalog) -> Result<JsonVal> {
    let components = catalog
        .components()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(json!({
        "name": catalog.name,
        "prefix": catalog.prefix,
        "version": catalog.version,
        "ruleSets": catalog.accessibility.rule_sets,
        "components": components,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanWarning;

    #[test]
    fn test_compose_scan_json_shape() {
        let usage = ComponentUsage::new("va-link", "va-link", "src/a.vue", 4, 2).with_issues(vec![
            ValidationIssue::design("missing-required-prop", Severity::Error, "needs href")
                .with_prop("href")
                .at(4, 2),
        ]);
        let res = ScanResult::new(
            "/work/app",
            vec!["src/a.vue".into()],
            vec![usage],
            vec![ScanWarning {
                file: "src/b.js".into(),
                message: "binary".into(),
            }],
            "2024-05-01T10:00:00+00:00",
        );
        let out = compose_scan_json(&res).unwrap();
        assert_eq!(out["projectPath"], "/work/app");
        assert_eq!(out["summary"]["totalComponents"], 1);
        assert_eq!(out["summary"]["coveragePercentage"], 100.0);
        assert_eq!(out["components"][0]["issues"][0]["type"], "design-system");
        assert_eq!(out["components"][0]["issues"][0]["prop"], "href");
        assert_eq!(out["warnings"][0]["file"], "src/b.js");
    }

    #[test]
    fn test_compose_catalog_json() {
        let catalog = crate::catalog::load(None, "v2").unwrap();
        let out = compose_catalog_json(&catalog).unwrap();
        assert_eq!(out["version"], "v2");
        assert_eq!(out["prefix"], "va-");
        assert!(out["ruleSets"]["wcag2a"].is_array());
        let names: Vec<_> = out["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"va-tag-status".to_string()));
    }

    #[test]
    fn test_badge_without_color() {
        assert_eq!(badge(Severity::Error, false), "✖ ⟦error⟧");
        assert_eq!(badge(Severity::Info, false), "◆ ⟦info⟧");
    }
}
