//! Configuration discovery and effective settings resolution.
//!
//! va-monitor reads `va-monitor.toml|yaml|yml` from the project directory (or
//! closest ancestor, stopping at a `.git` boundary) and merges it with CLI
//! flags to produce an `Effective` config.
//! Defaults:
//! - `includePatterns`: `**/*.{js,jsx,ts,tsx,vue}`
//! - `excludePatterns`: `**/node_modules/**`, `**/dist/**`, `**/*.test.*`
//! - `accessibilityRules`: `wcag2a`, `wcag2aa`
//! - `designSystemVersion`: `latest`
//! - `output`: `human`
//! - `parallel`: true
//! - `labelProximityLines`: 3
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::report::Thresholds;
use crate::rules::a11y::DEFAULT_LABEL_PROXIMITY;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILES: [&str; 3] = ["va-monitor.toml", "va-monitor.yaml", "va-monitor.yml"];
pub const OUTPUT_FORMATS: [&str; 2] = ["human", "json"];

pub const DEFAULT_INCLUDE: [&str; 1] = ["**/*.{js,jsx,ts,tsx,vue}"];
pub const DEFAULT_EXCLUDE: [&str; 3] = ["**/node_modules/**", "**/dist/**", "**/*.test.*"];
pub const DEFAULT_RULES: [&str; 2] = ["wcag2a", "wcag2aa"];

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Per-file extraction bounds under `[limits]`.
pub struct LimitsCfg {
    pub max_file_bytes: Option<usize>,
    pub max_sites: Option<usize>,
    pub max_file_millis: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsCfg {
    pub review_below_score: Option<f64>,
    pub issues_above: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Root configuration loaded from `va-monitor.toml|yaml`.
pub struct MonitorConfig {
    pub verbose: Option<bool>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub accessibility_rules: Option<Vec<String>>,
    pub design_system_version: Option<String>,
    /// Catalog file, relative to the config file's directory.
    pub catalog: Option<String>,
    pub output: Option<String>,
    pub parallel: Option<bool>,
    pub label_proximity_lines: Option<usize>,
    pub limits: Option<LimitsCfg>,
    pub thresholds: Option<ThresholdsCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values given on the command line; `None` defers to config and defaults.
pub struct Overrides {
    pub project: Option<PathBuf>,
    pub output: Option<String>,
    pub design_system_version: Option<String>,
    /// `Some(false)` for `--no-accessibility`.
    pub accessibility: Option<bool>,
    pub parallel: Option<bool>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub project: PathBuf,
    /// Config file that contributed values, if any.
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub accessibility_rules: Vec<String>,
    pub include_accessibility: bool,
    pub design_system_version: String,
    pub catalog: Option<PathBuf>,
    pub output: String,
    pub parallel: bool,
    pub label_proximity_lines: usize,
    pub limits: ExtractOptions,
    pub thresholds: Thresholds,
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn config_file_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Walk upward from `start` to the directory holding the config file.
///
/// `start` is canonicalized first so that relative paths such as `.` reach
/// their ancestors. Stops at the first directory with a `va-monitor.*` file
/// or a `.git` entry; falls back to `start`.
pub fn detect_config_root(start: &Path) -> PathBuf {
    let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
    let mut cur = start.as_path();
    loop {
        if config_file_in(cur).is_some() || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start,
        }
    }
}

/// Directory config discovery starts from when the input is one file.
pub fn file_project(file: &Path) -> PathBuf {
    file.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf()
}

/// Load `MonitorConfig` from `va-monitor.toml` or `va-monitor.yaml|yml` in
/// `root`. A present but malformed file is an error.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, MonitorConfig)>> {
    let Some(path) = config_file_in(root) else {
        return Ok(None);
    };
    let s = fs::read_to_string(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    let parsed = if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str::<MonitorConfig>(&s).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<MonitorConfig>(&s).map_err(|e| e.to_string())
    };
    match parsed {
        Ok(cfg) => Ok(Some((path, cfg))),
        Err(message) => Err(Error::InvalidConfig { path, message }),
    }
}

/// Reject output formats other than `human` and `json`.
pub fn check_output(format: &str) -> Result<()> {
    if OUTPUT_FORMATS.contains(&format) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(format.to_string()))
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective> {
    let project = cli.project.clone().unwrap_or_else(|| PathBuf::from("."));
    let root = detect_config_root(&project);
    let (config_path, cfg) = match load_config(&root)? {
        Some((p, c)) => (Some(p), c),
        None => (None, MonitorConfig::default()),
    };

    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    check_output(&output)?;

    let include = cfg
        .include_patterns
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| strings(&DEFAULT_INCLUDE));
    let exclude = cfg
        .exclude_patterns
        .unwrap_or_else(|| strings(&DEFAULT_EXCLUDE));
    let accessibility_rules = cfg
        .accessibility_rules
        .unwrap_or_else(|| strings(&DEFAULT_RULES));
    let design_system_version = cli
        .design_system_version
        .clone()
        .or(cfg.design_system_version)
        .unwrap_or_else(|| "latest".to_string());

    // Catalog paths are relative to the file that names them.
    let catalog = cfg.catalog.map(|c| {
        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(root.as_path());
        base.join(c)
    });

    let mut limits = ExtractOptions::default();
    if let Some(l) = cfg.limits {
        limits.max_bytes = l.max_file_bytes.unwrap_or(limits.max_bytes);
        limits.max_sites = l.max_sites.unwrap_or(limits.max_sites);
        limits.max_millis = l.max_file_millis.unwrap_or(limits.max_millis);
    }

    let mut thresholds = Thresholds::default();
    if let Some(t) = cfg.thresholds {
        thresholds.review_below_score = t.review_below_score.unwrap_or(thresholds.review_below_score);
        thresholds.issues_above = t.issues_above.unwrap_or(thresholds.issues_above);
    }

    Ok(Effective {
        project,
        config_path,
        verbose: cli.verbose.or(cfg.verbose).unwrap_or(false),
        include,
        exclude,
        accessibility_rules,
        include_accessibility: cli.accessibility.unwrap_or(true),
        design_system_version,
        catalog,
        output,
        parallel: cli.parallel.or(cfg.parallel).unwrap_or(true),
        label_proximity_lines: cfg.label_proximity_lines.unwrap_or(DEFAULT_LABEL_PROXIMITY),
        limits,
        thresholds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> Overrides {
        Overrides {
            project: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let eff = resolve_effective(&at(dir.path())).unwrap();
        assert!(eff.config_path.is_none());
        assert_eq!(eff.include, vec!["**/*.{js,jsx,ts,tsx,vue}"]);
        assert_eq!(eff.exclude.len(), 3);
        assert_eq!(eff.accessibility_rules, vec!["wcag2a", "wcag2aa"]);
        assert_eq!(eff.design_system_version, "latest");
        assert_eq!(eff.output, "human");
        assert!(eff.parallel);
        assert!(eff.include_accessibility);
        assert_eq!(eff.label_proximity_lines, 3);
        assert_eq!(eff.limits.max_bytes, 2 * 1024 * 1024);
        assert_eq!(eff.thresholds, Thresholds::default());
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("va-monitor.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
includePatterns = ["src/**/*.vue"]
accessibilityRules = ["wcag2a"]
designSystemVersion = "v1"
catalog = "tools/catalog.toml"
output = "json"
parallel = false
labelProximityLines = 5
[limits]
maxSites = 50
[thresholds]
reviewBelowScore = 95.0
    "#
        )
        .unwrap();

        let eff = resolve_effective(&at(root)).unwrap();
        let canon = fs::canonicalize(root).unwrap();
        assert_eq!(eff.config_path, Some(canon.join("va-monitor.toml")));
        assert_eq!(eff.include, vec!["src/**/*.vue"]);
        assert_eq!(eff.accessibility_rules, vec!["wcag2a"]);
        assert_eq!(eff.design_system_version, "v1");
        assert_eq!(eff.catalog, Some(canon.join("tools/catalog.toml")));
        assert_eq!(eff.output, "json");
        assert!(!eff.parallel);
        assert_eq!(eff.label_proximity_lines, 5);
        assert_eq!(eff.limits.max_sites, 50);
        assert_eq!(eff.limits.max_millis, 2000);
        assert_eq!(eff.thresholds.review_below_score, 95.0);
        assert_eq!(eff.thresholds.issues_above, 0);
    }

    #[test]
    fn test_load_yaml_from_ancestor() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let nested = root.join("packages/web");
        fs::create_dir_all(&nested).unwrap();
        let mut f = fs::File::create(root.join("va-monitor.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
excludePatterns:
  - "**/legacy/**"
verbose: true
            "#
        )
        .unwrap();

        let eff = resolve_effective(&at(&nested)).unwrap();
        assert_eq!(eff.project, nested);
        assert_eq!(eff.exclude, vec!["**/legacy/**"]);
        assert!(eff.verbose);
    }

    #[test]
    fn test_relative_start_reaches_ancestors() {
        let cwd = fs::canonicalize(".").unwrap();
        let found = detect_config_root(Path::new("."));
        assert!(found.is_absolute());
        assert!(cwd.starts_with(&found));
    }

    #[test]
    fn test_file_project() {
        assert_eq!(file_project(Path::new("src/Form.vue")), Path::new("src"));
        assert_eq!(file_project(Path::new("Form.vue")), Path::new("."));
    }

    #[test]
    fn test_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("va-monitor.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
designSystemVersion = "v1"
parallel = true
            "#
        )
        .unwrap();

        let cli = Overrides {
            output: Some("human".into()),
            design_system_version: Some("v2".into()),
            accessibility: Some(false),
            parallel: Some(false),
            ..at(root)
        };
        let eff = resolve_effective(&cli).unwrap();
        assert_eq!(eff.output, "human");
        assert_eq!(eff.design_system_version, "v2");
        assert!(!eff.include_accessibility);
        assert!(!eff.parallel);
    }

    #[test]
    fn test_unsupported_output_rejected() {
        let dir = tempdir().unwrap();
        let cli = Overrides {
            output: Some("markdown".into()),
            ..at(dir.path())
        };
        assert!(matches!(
            resolve_effective(&cli),
            Err(Error::UnsupportedFormat(f)) if f == "markdown"
        ));
    }

    #[test]
    fn test_malformed_config_is_invalid() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("va-monitor.toml")).unwrap();
        writeln!(f, "parallel = \"sometimes\"").unwrap();
        assert!(matches!(
            resolve_effective(&at(root)),
            Err(Error::InvalidConfig { .. })
        ));

        fs::write(root.join("va-monitor.toml"), "paralel = true\n").unwrap();
        assert!(matches!(
            load_config(root),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
