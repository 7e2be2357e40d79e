//! Catalog schema: design-system components per version plus the
//! accessibility vocabulary, loaded from TOML or YAML.
//!
//! Key components:
//! - `prefix`: naming convention that marks catalog components (`va-`).
//! - `versions.<name>`: component specs; `extends` inherits another version
//!   and overrides components by name.
//! - `accessibility`: rule sets (`wcag2a`, ...) and prop vocabularies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_prefix() -> String {
    "va-".to_string()
}

fn default_version() -> String {
    "latest".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Root document of a catalog file.
pub struct CatalogFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Version used when `latest` is requested and no version is named so.
    #[serde(default = "default_version")]
    pub default_version: String,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionSpec>,
    #[serde(default)]
    pub accessibility: AccessibilitySpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersionSpec {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
/// Metadata for one catalog component.
pub struct ComponentSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub deprecated_props: Vec<DeprecatedProp>,
    /// Prop -> allowed literal values.
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<String>>,
    /// Mutually exclusive prop pairs.
    #[serde(default)]
    pub exclusive: Vec<(String, String)>,
    #[serde(default)]
    pub a11y: ComponentA11y,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DeprecatedProp {
    pub prop: String,
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
/// Accessibility traits of a component.
pub struct ComponentA11y {
    /// Needs an accessible name.
    #[serde(default)]
    pub interactive: bool,
    /// Props that supply the accessible name.
    #[serde(default)]
    pub name_props: Vec<String>,
    /// Renders an image that needs a text alternative.
    #[serde(default)]
    pub image: bool,
    #[serde(default)]
    pub alt_props: Vec<String>,
    /// Props marking the image decorative (`aria-hidden`).
    #[serde(default)]
    pub decorative_props: Vec<String>,
    /// Props conveying state by color (`status`).
    #[serde(default)]
    pub state_props: Vec<String>,
    /// Text or icon props that convey the same state without color.
    #[serde(default)]
    pub text_props: Vec<String>,
    /// Labels the controls it encloses or that closely follow it.
    #[serde(default)]
    pub provides_label: bool,
    #[serde(default)]
    pub label_props: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
/// Catalog-wide accessibility vocabulary.
pub struct AccessibilitySpec {
    /// Rule-set id (`wcag2a`) -> rule family ids.
    #[serde(default)]
    pub rule_sets: BTreeMap<String, Vec<String>>,
    /// Name-bearing props recognized on every interactive component.
    #[serde(default)]
    pub name_props: Vec<String>,
    /// Interaction props only reachable with a pointer.
    #[serde(default)]
    pub pointer_events: Vec<String>,
    /// Interaction props reachable from the keyboard.
    #[serde(default)]
    pub keyboard_events: Vec<String>,
}
