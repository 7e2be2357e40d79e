//! Catalog loading and version resolution.
//!
//! The builtin VA design-system catalog is embedded at compile time; a
//! project may point `catalog` at its own TOML/YAML file instead. A catalog
//! is resolved once per scan into a flat, read-only `Catalog` for one
//! design-system version.

use crate::error::{Error, Result};
use crate::models::catalog::{AccessibilitySpec, CatalogFile, ComponentSpec};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Builtin VA design-system catalog.
pub const BUILTIN_CATALOG: &str = include_str!("../catalog/va-design-system.toml");

/// Parse the builtin catalog.
pub fn builtin() -> Result<CatalogFile> {
    parse_toml(BUILTIN_CATALOG, "builtin catalog")
}

fn parse_toml(text: &str, origin: &str) -> Result<CatalogFile> {
    toml::from_str(text).map_err(|e| Error::Catalog(format!("{}: {}", origin, e)))
}

/// Load a catalog file; `.yaml`/`.yml` are parsed as YAML, anything else as TOML.
pub fn load_file(path: &Path) -> Result<CatalogFile> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.to_string_lossy();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .map_err(|e| Error::Catalog(format!("{}: {}", origin, e))),
        _ => parse_toml(&text, &origin),
    }
}

/// Load the catalog at `path`, or the builtin one, and resolve `version`.
pub fn load(path: Option<&Path>, version: &str) -> Result<Catalog> {
    let file = match path {
        Some(p) => load_file(p)?,
        None => builtin()?,
    };
    file.resolve(version)
}

/// Catalog flattened for one design-system version.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub name: String,
    pub prefix: String,
    pub version: String,
    components: BTreeMap<String, ComponentSpec>,
    pub accessibility: AccessibilitySpec,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Components in name order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Canonical catalog name for an identifier as written, if it follows
    /// this catalog's naming convention.
    pub fn canonical_name(&self, raw: &str) -> Option<String> {
        canonical_name(raw, &self.prefix)
    }
}

impl CatalogFile {
    /// Names of the versions declared in this file.
    pub fn version_names(&self) -> Vec<String> {
        self.versions.keys().cloned().collect()
    }

    /// Flatten `requested` (following `extends`) into a `Catalog`.
    ///
    /// `latest` maps to `default_version` unless a version is literally
    /// named `latest`.
    pub fn resolve(&self, requested: &str) -> Result<Catalog> {
        let key = if requested == "latest" && !self.versions.contains_key("latest") {
            self.default_version.as_str()
        } else {
            requested
        };
        if !self.versions.contains_key(key) {
            return Err(Error::UnknownVersion {
                requested: requested.to_string(),
                available: self.version_names().join(", "),
            });
        }

        // Walk the extends chain from the requested version to its root.
        let mut chain: Vec<&str> = Vec::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut cur = Some(key);
        while let Some(name) = cur {
            if !seen.insert(name) {
                return Err(Error::Catalog(format!(
                    "version '{}' extends itself through '{}'",
                    key, name
                )));
            }
            let spec = self.versions.get(name).ok_or_else(|| {
                Error::Catalog(format!(
                    "version '{}' extends unknown version '{}'",
                    chain.last().copied().unwrap_or(key),
                    name
                ))
            })?;
            chain.push(name);
            cur = spec.extends.as_deref();
        }

        let mut components = BTreeMap::new();
        for name in chain.iter().rev() {
            if let Some(spec) = self.versions.get(*name) {
                for c in &spec.components {
                    if canonical_name(&c.name, &self.prefix).as_deref() != Some(c.name.as_str()) {
                        return Err(Error::Catalog(format!(
                            "component '{}' in version '{}' does not follow the '{}' naming convention",
                            c.name, name, self.prefix
                        )));
                    }
                    components.insert(c.name.clone(), c.clone());
                }
            }
        }

        Ok(Catalog {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| "design system".to_string()),
            prefix: self.prefix.clone(),
            version: key.to_string(),
            components,
            accessibility: self.accessibility.clone(),
        })
    }
}

/// Pascal-case form of a kebab prefix: `va-` -> `Va`.
pub fn pascal_prefix(prefix: &str) -> String {
    prefix
        .split('-')
        .filter(|s| !s.is_empty())
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Map an identifier to its canonical kebab catalog name.
///
/// `va-text-input` stays as is and `VaTextInput` becomes `va-text-input`.
/// Returns `None` when `raw` does not carry the prefix in either form
/// (`Variable`, `va-Button`, `vaButton`).
pub fn canonical_name(raw: &str, prefix: &str) -> Option<String> {
    if let Some(rest) = raw.strip_prefix(prefix) {
        let first = rest.chars().next()?;
        let kebab = first.is_ascii_lowercase()
            && rest
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        return kebab.then(|| raw.to_string());
    }
    let pascal = pascal_prefix(prefix);
    let rest = raw.strip_prefix(pascal.as_str())?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() || !rest.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let mut out = prefix.to_string();
    for (i, c) in rest.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_canonical_name_forms() {
        assert_eq!(canonical_name("va-button", "va-").as_deref(), Some("va-button"));
        assert_eq!(
            canonical_name("VaTextInput", "va-").as_deref(),
            Some("va-text-input")
        );
        assert_eq!(canonical_name("Variable", "va-"), None);
        assert_eq!(canonical_name("va-Button", "va-"), None);
        assert_eq!(canonical_name("VaButton.Group", "va-"), None);
        assert_eq!(canonical_name("va-", "va-"), None);
    }

    #[test]
    fn test_pascal_prefix() {
        assert_eq!(pascal_prefix("va-"), "Va");
        assert_eq!(pascal_prefix("usa-gov-"), "UsaGov");
    }

    #[test]
    fn test_builtin_resolves_latest_and_inherits() {
        let file = builtin().unwrap();
        let latest = file.resolve("latest").unwrap();
        assert_eq!(latest.version, file.default_version);
        // v2 keeps v1 components it does not override
        assert!(latest.contains("va-text-input"));
        // v2 only
        assert!(latest.contains("va-link-action"));
        let v1 = file.resolve("v1").unwrap();
        assert!(!v1.contains("va-link-action"));
        assert!(latest.len() > v1.len());
    }

    #[test]
    fn test_unknown_version_lists_available() {
        let file = builtin().unwrap();
        match file.resolve("v9") {
            Err(Error::UnknownVersion { requested, available }) => {
                assert_eq!(requested, "v9");
                assert!(available.contains("v1"));
            }
            other => panic!("unexpected: {:?}", other.map(|c| c.version)),
        }
    }

    #[test]
    fn test_extends_cycle_is_rejected() {
        let text = r#"
prefix = "va-"
default_version = "a"
[versions.a]
extends = "b"
[versions.b]
extends = "a"
"#;
        let file: CatalogFile = toml::from_str(text).unwrap();
        assert!(matches!(file.resolve("a"), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_component_names_must_follow_prefix() {
        let text = r#"
prefix = "va-"
default_version = "v1"
[[versions.v1.components]]
name = "Button"
"#;
        let file: CatalogFile = toml::from_str(text).unwrap();
        assert!(matches!(file.resolve("v1"), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_load_yaml_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        fs::write(
            &path,
            r#"
name: Acme
prefix: acme-
default_version: "1"
versions:
  "1":
    components:
      - name: acme-card
        required: [title]
"#,
        )
        .unwrap();
        let cat = load(Some(&path), "latest").unwrap();
        assert_eq!(cat.name, "Acme");
        assert_eq!(cat.get("acme-card").unwrap().required, vec!["title"]);
        assert_eq!(cat.canonical_name("AcmeCard").as_deref(), Some("acme-card"));
    }
}
