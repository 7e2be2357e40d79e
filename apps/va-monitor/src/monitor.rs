//! Project scanning: list, read, extract and evaluate every file.
//!
//! Per-file work is independent and runs on rayon when `parallel` is set.
//! Outcomes are collected in listing order so sequential and parallel scans
//! produce identical results. A file that cannot be read or extracted is
//! recorded as a `ScanWarning` and skipped; only caller-input, pattern and
//! cancellation errors abort a scan.

use crate::catalog::{self, Catalog};
use crate::config::Effective;
use crate::error::{Error, Result};
use crate::extract::{try_extract, ExtractOptions};
use crate::models::{ComponentUsage, ScanResult, ScanWarning};
use crate::rules::{A11yEngine, DesignEngine};
use crate::source::{display_path, relative_to, FileSource};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a scan needs besides the file source.
pub struct ScanContext {
    pub catalog: Catalog,
    pub extract: ExtractOptions,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub accessibility_rules: Vec<String>,
    pub include_accessibility: bool,
    pub label_proximity_lines: usize,
    pub parallel: bool,
    pub cancel: Arc<AtomicBool>,
}

impl ScanContext {
    /// Context with default patterns, rules and bounds for `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        let extract = ExtractOptions::default().with_prefix(catalog.prefix.clone());
        Self {
            catalog,
            extract,
            include: crate::config::DEFAULT_INCLUDE.map(String::from).to_vec(),
            exclude: crate::config::DEFAULT_EXCLUDE.map(String::from).to_vec(),
            accessibility_rules: crate::config::DEFAULT_RULES.map(String::from).to_vec(),
            include_accessibility: true,
            label_proximity_lines: crate::rules::a11y::DEFAULT_LABEL_PROXIMITY,
            parallel: true,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load the configured catalog version and apply every effective setting.
    pub fn from_effective(eff: &Effective) -> Result<Self> {
        let catalog = catalog::load(eff.catalog.as_deref(), &eff.design_system_version)?;
        let extract = ExtractOptions {
            prefix: catalog.prefix.clone(),
            ..eff.limits.clone()
        };
        Ok(Self::new(catalog)
            .with_extract(extract)
            .with_patterns(eff.include.clone(), eff.exclude.clone())
            .with_accessibility_rules(eff.accessibility_rules.clone())
            .with_accessibility(eff.include_accessibility)
            .with_label_proximity(eff.label_proximity_lines)
            .with_parallel(eff.parallel))
    }

    pub fn with_extract(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_patterns(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include = include;
        self.exclude = exclude;
        self
    }

    pub fn with_accessibility_rules(mut self, rules: Vec<String>) -> Self {
        self.accessibility_rules = rules;
        self
    }

    pub fn with_accessibility(mut self, on: bool) -> Self {
        self.include_accessibility = on;
        self
    }

    pub fn with_label_proximity(mut self, lines: usize) -> Self {
        self.label_proximity_lines = lines;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Share a flag that aborts the scan at the next file once set.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    fn a11y_engine(&self) -> A11yEngine<'_> {
        A11yEngine::new(&self.catalog, &self.accessibility_rules)
            .with_proximity(self.label_proximity_lines)
    }
}

enum FileOutcome {
    Scanned(String, Vec<ComponentUsage>),
    Skipped(ScanWarning),
}

/// Evaluate each usage of one file; `a11y` is `None` when accessibility is off.
fn evaluate_usages(
    usages: Vec<ComponentUsage>,
    design: &DesignEngine<'_>,
    a11y: Option<&A11yEngine<'_>>,
) -> Vec<ComponentUsage> {
    let mut a11y_issues = a11y.map(|engine| engine.evaluate_file(&usages).into_iter());
    usages
        .into_iter()
        .map(|u| {
            let mut issues = design.evaluate(&u);
            if let Some(found) = a11y_issues.as_mut().and_then(Iterator::next) {
                issues.extend(found);
            }
            u.with_issues(issues)
        })
        .collect()
}

fn scan_file(
    source: &dyn FileSource,
    path: &Path,
    root: &Path,
    ctx: &ScanContext,
    design: &DesignEngine<'_>,
    a11y: Option<&A11yEngine<'_>>,
) -> Result<FileOutcome> {
    if ctx.cancel.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    let file = display_path(&relative_to(path, root));
    let text = match source.read(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(file = %file, error = %e, "file skipped");
            return Ok(FileOutcome::Skipped(ScanWarning {
                file,
                message: e.to_string(),
            }));
        }
    };
    match try_extract(&text, &file, &ctx.extract) {
        Ok(usages) => {
            debug!(file = %file, usages = usages.len(), "file scanned");
            let usages = evaluate_usages(usages, design, a11y);
            Ok(FileOutcome::Scanned(file, usages))
        }
        Err(e) => {
            warn!(file = %file, error = %e, "file skipped");
            Ok(FileOutcome::Skipped(ScanWarning {
                file,
                message: e.to_string(),
            }))
        }
    }
}

/// Scan every matching file under `root`.
pub fn run_scan(source: &dyn FileSource, root: &Path, ctx: &ScanContext) -> Result<ScanResult> {
    let started = Instant::now();
    let files = source.list(root, &ctx.include, &ctx.exclude)?;
    debug!(root = %root.display(), files = files.len(), "files listed");

    let design = DesignEngine::new(&ctx.catalog);
    let a11y_engine = ctx.a11y_engine();
    let a11y = ctx.include_accessibility.then_some(&a11y_engine);

    let outcomes: Vec<FileOutcome> = if ctx.parallel {
        files
            .par_iter()
            .map(|p| scan_file(source, p, root, ctx, &design, a11y))
            .collect::<Result<_>>()?
    } else {
        files
            .iter()
            .map(|p| scan_file(source, p, root, ctx, &design, a11y))
            .collect::<Result<_>>()?
    };

    let mut scanned_files = Vec::new();
    let mut components = Vec::new();
    let mut warnings = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Scanned(file, usages) => {
                scanned_files.push(file);
                components.extend(usages);
            }
            FileOutcome::Skipped(w) => warnings.push(w),
        }
    }

    let result = ScanResult::new(
        project_dir(root).to_string_lossy(),
        scanned_files,
        components,
        warnings,
        chrono::Utc::now().to_rfc3339(),
    );
    info!(
        files = result.scanned_files.len(),
        components = result.summary.total_components,
        issues = result.summary.issues_found,
        skipped = result.warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan complete"
    );
    Ok(result)
}

/// Extract one file and evaluate the first usage of `name`.
///
/// Accessibility rules always run here, whatever the context says.
pub fn validate_component(
    source: &dyn FileSource,
    file: &Path,
    name: &str,
    ctx: &ScanContext,
) -> Result<ComponentUsage> {
    let file_label = file.to_string_lossy().to_string();
    let not_found = || Error::ComponentNotFound {
        file: file_label.clone(),
        name: name.to_string(),
    };
    let wanted = ctx.catalog.canonical_name(name).ok_or_else(not_found)?;
    let text = source.read(file)?;
    let usages = try_extract(&text, &file_label, &ctx.extract).map_err(|e| Error::Extract {
        file: file_label.clone(),
        source: e,
    })?;
    let index = usages
        .iter()
        .position(|u| u.component_name == wanted)
        .ok_or_else(not_found)?;

    let design = DesignEngine::new(&ctx.catalog);
    let a11y = ctx.a11y_engine();
    let usage = &usages[index];
    let mut issues = design.evaluate(usage);
    issues.extend(a11y.evaluate(usage, &usages));
    debug!(file = %file_label, component = %wanted, issues = issues.len(), "component validated");
    Ok(usage.clone().with_issues(issues))
}

/// Canonicalized project directory for display; falls back to `root`.
pub fn project_dir(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
