//! Usage extractor: finds catalog component invocations in one source file.
//!
//! Recognition is lexical. Script files (`.js .jsx .tsx ...`) are scanned in
//! code mode with JSX tags accepted only where an expression may start;
//! `.ts` files accept call-like sites only, since `<` there is a type
//! assertion or generic. Template files (`.vue .html .htm .svelte`) are
//! scanned as markup, with `<script>` bodies handed back to code mode.
//!
//! Every scan is bounded by `ExtractOptions`; `extract` degrades to an empty
//! list when a bound is exceeded, `try_extract` reports which one.

mod expr;
mod lex;
mod scan;

use crate::models::ComponentUsage;
use scan::Scanner;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("file looks binary (contains NUL bytes)")]
    Binary,

    #[error("more than {limit} invocation sites")]
    TooManySites { limit: usize },

    #[error("extraction exceeded {limit_ms} ms")]
    Timeout { limit_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Source syntax of a file, chosen from its extension.
pub enum Dialect {
    /// JavaScript/TypeScript; `jsx` enables tag recognition.
    Script { jsx: bool },
    /// Markup: Vue single-file components, HTML, Svelte.
    Template,
}

impl Dialect {
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "vue" | "html" | "htm" | "svelte" => Dialect::Template,
            "ts" | "mts" | "cts" => Dialect::Script { jsx: false },
            _ => Dialect::Script { jsx: true },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Per-file extraction bounds and the catalog naming prefix.
pub struct ExtractOptions {
    pub prefix: String,
    pub max_bytes: usize,
    pub max_sites: usize,
    /// Wall-clock budget per file; 0 disables the check.
    pub max_millis: u64,
    /// Maximum nesting of attribute expressions scanned for inner sites.
    pub max_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            prefix: "va-".to_string(),
            max_bytes: 2 * 1024 * 1024,
            max_sites: 10_000,
            max_millis: 2_000,
            max_depth: 8,
        }
    }
}

impl ExtractOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// 1-based line/column lookup over byte offsets.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, c)| *c == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// Column counts chars, not bytes.
    fn locate(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        let col = text[self.starts[line]..offset].chars().count() + 1;
        (line + 1, col)
    }
}

/// Extract usages with default bounds; never fails.
pub fn extract(text: &str, path: &str) -> Vec<ComponentUsage> {
    extract_with(text, path, &ExtractOptions::default())
}

/// Like `extract` with explicit options; bound violations yield no usages.
pub fn extract_with(text: &str, path: &str, opts: &ExtractOptions) -> Vec<ComponentUsage> {
    match try_extract(text, path, opts) {
        Ok(usages) => usages,
        Err(e) => {
            debug!(file = path, error = %e, "extraction degraded to empty result");
            Vec::new()
        }
    }
}

/// Extract usages in (line, column) order, reporting bound violations.
pub fn try_extract(
    text: &str,
    path: &str,
    opts: &ExtractOptions,
) -> Result<Vec<ComponentUsage>, ExtractError> {
    if text.len() > opts.max_bytes {
        return Err(ExtractError::TooLarge {
            size: text.len(),
            limit: opts.max_bytes,
        });
    }
    if text.as_bytes().contains(&0) {
        return Err(ExtractError::Binary);
    }

    let mut scanner = Scanner::new(
        text,
        &opts.prefix,
        opts.max_sites,
        opts.max_millis,
        opts.max_depth,
    );
    if !scanner.mentions_prefix() {
        return Ok(Vec::new());
    }
    match Dialect::from_path(path) {
        Dialect::Script { jsx } => scanner.scan_script(0, text.len(), jsx, 0)?,
        Dialect::Template => scanner.scan_markup(0, text.len(), 0)?,
    }
    let mut sites = scanner.into_sites();
    sites.sort_by_key(|s| s.start);

    // The nearest site whose extent contains this one is its parent.
    let lines = LineIndex::new(text);
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut usages = Vec::with_capacity(sites.len());
    for (n, site) in sites.into_iter().enumerate() {
        while matches!(open.last(), Some(&(end, _)) if end <= site.start) {
            open.pop();
        }
        let (line, col) = lines.locate(text, site.start);
        let mut usage = ComponentUsage::new(site.name, site.tag, path, line, col);
        usage.parent = open.last().map(|&(_, p)| p);
        usage.props = site.props;
        usage.spread = site.spread;
        if site.end > site.start {
            open.push((site.end, n));
        }
        usages.push(usage);
    }
    debug!(file = path, usages = usages.len(), "extracted");
    Ok(usages)
}
