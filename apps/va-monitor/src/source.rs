//! File source providers.
//!
//! `FsSource` lists files with `glob` relative to a project root; brace
//! alternatives (`**/*.{js,vue}`) are expanded first since `glob` has no
//! brace syntax. `MemorySource` serves an in-memory tree for tests and
//! embedders. Listings are sorted and deduplicated, and excludes always win.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// `*` stays within one path segment, `**` crosses segments.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Lists candidate files under a root and reads their text.
pub trait FileSource: Send + Sync {
    fn list(&self, root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>>;
    fn read(&self, path: &Path) -> Result<String>;
}

/// Expand `{a,b}` alternatives; nested braces expand recursively.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let mut depth = 0usize;
    let mut close = None;
    let mut commas = Vec::new();
    for (i, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(open + i),
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };
    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    let mut bounds = vec![open];
    bounds.extend(commas);
    bounds.push(close);
    bounds
        .windows(2)
        .flat_map(|w| expand_braces(&format!("{}{}{}", head, &pattern[w[0] + 1..w[1]], tail)))
        .collect()
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .flat_map(|p| expand_braces(p))
        .map(|p| Pattern::new(&p).map_err(|source| Error::Pattern { pattern: p, source }))
        .collect()
}

fn matches_any(patterns: &[Pattern], rel: &Path) -> bool {
    patterns.iter().any(|p| p.matches_path_with(rel, MATCH_OPTIONS))
}

/// Path of `path` relative to `root`, falling back to `path` itself.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf())
}

/// Display form of a relative path with `/` separators on every platform.
pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, Copy, Default)]
/// Reads from the local filesystem.
pub struct FsSource;

impl FileSource for FsSource {
    fn list(&self, root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::InvalidProjectPath(root.to_path_buf()));
        }
        let excludes = compile(exclude)?;
        let base = Pattern::escape(&root.to_string_lossy());
        let mut found = BTreeSet::new();
        for pat in include.iter().flat_map(|p| expand_braces(p)) {
            let abs = Path::new(&base).join(&pat).to_string_lossy().to_string();
            let entries = glob::glob_with(&abs, MATCH_OPTIONS)
                .map_err(|source| Error::Pattern { pattern: pat.clone(), source })?;
            for entry in entries {
                match entry {
                    Ok(p) if p.is_file() => {
                        if !matches_any(&excludes, &relative_to(&p, root)) {
                            found.insert(p);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(path = %e.path().display(), error = %e.error(), "unreadable path skipped"),
                }
            }
        }
        Ok(found.into_iter().collect())
    }

    fn read(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Non-UTF-8 bytes are replaced; NUL bytes survive for binary detection.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory file tree keyed by path.
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl FileSource for MemorySource {
    fn list(&self, root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
        let includes = compile(include)?;
        let excludes = compile(exclude)?;
        Ok(self
            .files
            .keys()
            .filter(|p| {
                p.strip_prefix(root).is_ok_and(|rel| {
                    matches_any(&includes, rel) && !matches_any(&excludes, rel)
                })
            })
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| Error::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file in memory source"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("**/*.js"), vec!["**/*.js"]);
        assert_eq!(
            expand_braces("**/*.{js,vue}"),
            vec!["**/*.js", "**/*.vue"]
        );
        assert_eq!(
            expand_braces("{src,lib}/*.{ts,tsx}"),
            vec!["src/*.ts", "src/*.tsx", "lib/*.ts", "lib/*.tsx"]
        );
        assert_eq!(expand_braces("a{b,{c,d}}"), vec!["ab", "ac", "ad"]);
        assert_eq!(expand_braces("broken{a,b"), vec!["broken{a,b"]);
    }

    #[test]
    fn test_fs_listing_sorted_with_excludes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/b.jsx"), "").unwrap();
        fs::write(root.join("src/a.vue"), "").unwrap();
        fs::write(root.join("src/nested/c.tsx"), "").unwrap();
        fs::write(root.join("src/a.test.jsx"), "").unwrap();
        fs::write(root.join("node_modules/pkg/x.js"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();

        let files = FsSource
            .list(
                root,
                &strings(&["**/*.{js,jsx,tsx,vue}", "src/*.jsx"]),
                &strings(&["**/node_modules/**", "**/*.test.*"]),
            )
            .unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| display_path(&relative_to(p, root)))
            .collect();
        assert_eq!(rel, vec!["src/a.vue", "src/b.jsx", "src/nested/c.tsx"]);
    }

    #[test]
    fn test_fs_listing_requires_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("App.vue");
        fs::write(&file, "").unwrap();
        for root in [file, dir.path().join("missing")] {
            assert!(matches!(
                FsSource.list(&root, &strings(&["**/*.vue"]), &[]),
                Err(Error::InvalidProjectPath(_))
            ));
        }
    }

    #[test]
    fn test_fs_read_keeps_nul_bytes() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("bin.js");
        fs::write(&p, b"va-\0\xff").unwrap();
        let text = FsSource.read(&p).unwrap();
        assert!(text.contains('\0'));
        assert!(matches!(
            FsSource.read(&dir.path().join("missing.js")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let src = MemorySource::new();
        assert!(matches!(
            src.list(Path::new("/p"), &strings(&["src/[.js"]), &[]),
            Err(Error::Pattern { .. })
        ));
    }

    #[test]
    fn test_memory_source() {
        let src = MemorySource::new()
            .with_file("/p/src/App.jsx", "<VaButton text='x' />")
            .with_file("/p/dist/App.js", "")
            .with_file("/other/x.jsx", "");
        let files = src
            .list(
                Path::new("/p"),
                &strings(&["**/*.{js,jsx}"]),
                &strings(&["**/dist/**"]),
            )
            .unwrap();
        assert_eq!(files, vec![PathBuf::from("/p/src/App.jsx")]);
        assert!(src.read(Path::new("/p/src/App.jsx")).unwrap().contains("VaButton"));
    }
}
