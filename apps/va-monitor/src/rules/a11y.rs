//! Accessibility rules derived from WCAG 2.x success criteria.
//!
//! Which families run is decided once per engine from the configured
//! `accessibilityRules` entries: a rule-set id from the catalog (`wcag2a`)
//! expands to its families, a family id enables itself, anything else is
//! logged and ignored. Disabled families are never evaluated.
//!
//! Usages whose props are spread are not judged on absent props, since the
//! spread may supply them.

use super::{one_of, present};
use crate::catalog::Catalog;
use crate::models::catalog::ComponentSpec;
use crate::models::{ComponentUsage, Literal, PropValue, Severity, ValidationIssue};
use std::collections::BTreeSet;
use tracing::{trace, warn};

/// Default line distance within which a label provider labels a control.
pub const DEFAULT_LABEL_PROXIMITY: usize = 3;

fn provides_label(catalog: &Catalog, usage: &ComponentUsage) -> bool {
    catalog
        .get(&usage.component_name)
        .filter(|s| s.a11y.provides_label)
        .is_some_and(|s| {
            s.a11y.label_props.is_empty() || usage.first_prop(&s.a11y.label_props).is_some()
        })
}

/// Label providers of one file, indexed once and shared by all its usages.
pub struct LabelIndex {
    /// Whether the usage at each index provides a label.
    provides: Vec<bool>,
    /// Start positions of the providers, ascending.
    starts: Vec<(usize, usize)>,
}

impl LabelIndex {
    pub fn new(catalog: &Catalog, usages: &[ComponentUsage]) -> Self {
        let provides: Vec<bool> = usages.iter().map(|u| provides_label(catalog, u)).collect();
        let mut starts: Vec<(usize, usize)> = usages
            .iter()
            .zip(&provides)
            .filter(|(_, p)| **p)
            .map(|(u, _)| (u.line_number, u.column))
            .collect();
        starts.sort_unstable();
        Self { provides, starts }
    }

    /// The nearest enclosing usage is a provider, or the closest provider
    /// starting before `usage` is at most `proximity` lines above it.
    pub fn labels(&self, usage: &ComponentUsage, proximity: usize) -> bool {
        if usage
            .parent
            .is_some_and(|p| self.provides.get(p).copied().unwrap_or(false))
        {
            return true;
        }
        let before = self
            .starts
            .partition_point(|s| *s < (usage.line_number, usage.column));
        before > 0 && usage.line_number - self.starts[before - 1].0 <= proximity
    }
}

/// What an accessibility rule sees: the usage, its catalog entry and the
/// label providers of the same file.
pub struct A11yCtx<'a> {
    pub catalog: &'a Catalog,
    pub usage: &'a ComponentUsage,
    pub spec: &'a ComponentSpec,
    pub labels: &'a LabelIndex,
    pub proximity: usize,
}

impl A11yCtx<'_> {
    /// Name-bearing props of this component plus the catalog-wide ones.
    pub fn name_props(&self) -> Vec<&str> {
        self.spec
            .a11y
            .name_props
            .iter()
            .chain(self.catalog.accessibility.name_props.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn labelled_by_context(&self) -> bool {
        self.labels.labels(self.usage, self.proximity)
    }
}

/// A rule hit: message and, when one prop is at fault, its name.
pub struct Finding {
    pub message: String,
    pub prop: Option<String>,
}

impl Finding {
    fn new(message: String) -> Self {
        Self {
            message,
            prop: None,
        }
    }
}

pub type A11yCheck = fn(&A11yCtx<'_>) -> Vec<Finding>;

#[derive(Clone, Copy)]
pub struct A11yRule {
    pub id: &'static str,
    /// WCAG success criterion, e.g. `4.1.2`.
    pub criterion: &'static str,
    pub severity: Severity,
    pub check: A11yCheck,
}

pub const MISSING_ACCESSIBLE_NAME: &str = "missing-accessible-name";
pub const MISSING_ALT_TEXT: &str = "missing-alt-text";
pub const COLOR_ONLY_STATE: &str = "color-only-state";
pub const KEYBOARD_INACCESSIBLE: &str = "keyboard-inaccessible";
pub const EMPTY_ACCESSIBLE_NAME: &str = "empty-accessible-name";

pub const A11Y_RULES: &[A11yRule] = &[
    A11yRule {
        id: MISSING_ACCESSIBLE_NAME,
        criterion: "4.1.2",
        severity: Severity::Error,
        check: missing_accessible_name,
    },
    A11yRule {
        id: MISSING_ALT_TEXT,
        criterion: "1.1.1",
        severity: Severity::Error,
        check: missing_alt_text,
    },
    A11yRule {
        id: COLOR_ONLY_STATE,
        criterion: "1.4.1",
        severity: Severity::Warning,
        check: color_only_state,
    },
    A11yRule {
        id: KEYBOARD_INACCESSIBLE,
        criterion: "2.1.1",
        severity: Severity::Warning,
        check: keyboard_inaccessible,
    },
    A11yRule {
        id: EMPTY_ACCESSIBLE_NAME,
        criterion: "2.4.6",
        severity: Severity::Error,
        check: empty_accessible_name,
    },
];

fn missing_accessible_name(ctx: &A11yCtx<'_>) -> Vec<Finding> {
    let u = ctx.usage;
    if !ctx.spec.a11y.interactive || u.spread {
        return Vec::new();
    }
    let names = ctx.name_props();
    if u.first_prop(&names).is_some() || ctx.labelled_by_context() {
        return Vec::new();
    }
    vec![Finding::new(format!(
        "'{}' has no accessible name; set {}",
        u.component_name,
        one_of(&names)
    ))]
}

fn missing_alt_text(ctx: &A11yCtx<'_>) -> Vec<Finding> {
    let (u, a11y) = (ctx.usage, &ctx.spec.a11y);
    if !a11y.image || u.spread || u.first_prop(&a11y.alt_props).is_some() {
        return Vec::new();
    }
    let decorative = a11y
        .decorative_props
        .iter()
        .any(|p| u.prop(p).is_some_and(PropValue::is_enabled));
    if decorative {
        return Vec::new();
    }
    let mut hint = one_of(&a11y.alt_props);
    if !a11y.decorative_props.is_empty() {
        hint.push_str(&format!(
            ", or mark it decorative with {}",
            one_of(&a11y.decorative_props)
        ));
    }
    vec![Finding::new(format!(
        "'{}' has no text alternative; set {}",
        u.component_name, hint
    ))]
}

fn color_only_state(ctx: &A11yCtx<'_>) -> Vec<Finding> {
    let (u, a11y) = (ctx.usage, &ctx.spec.a11y);
    let states = present(u, &a11y.state_props);
    if states.is_empty() || u.spread || !present(u, &a11y.text_props).is_empty() {
        return Vec::new();
    }
    vec![Finding {
        message: format!(
            "'{}' conveys '{}' without text; add {} so the state is not shown by color alone",
            u.component_name,
            states.join("', '"),
            one_of(&a11y.text_props)
        ),
        prop: states.first().map(|s| s.to_string()),
    }]
}

fn keyboard_inaccessible(ctx: &A11yCtx<'_>) -> Vec<Finding> {
    let u = ctx.usage;
    let vocab = &ctx.catalog.accessibility;
    let pointer = present(u, &vocab.pointer_events);
    if pointer.is_empty() || !present(u, &vocab.keyboard_events).is_empty() {
        return Vec::new();
    }
    vec![Finding {
        message: format!(
            "'{}' handles {} with no keyboard equivalent",
            u.component_name,
            one_of(&pointer)
        ),
        prop: pointer.first().map(|s| s.to_string()),
    }]
}

fn empty_accessible_name(ctx: &A11yCtx<'_>) -> Vec<Finding> {
    let u = ctx.usage;
    ctx.name_props()
        .into_iter()
        .filter(|p| {
            matches!(u.prop(p), Some(PropValue::Literal(Literal::String(s))) if s.trim().is_empty())
        })
        .map(|p| Finding {
            message: format!("'{}' sets '{}' to an empty name", u.component_name, p),
            prop: Some(p.to_string()),
        })
        .collect()
}

/// Expand configured rule ids into enabled family ids.
pub fn resolve_families(
    catalog: &Catalog,
    requested: &[String],
    rules: &[A11yRule],
) -> BTreeSet<String> {
    let known = |id: &str| rules.iter().any(|r| r.id == id);
    let mut enabled = BTreeSet::new();
    for id in requested {
        if let Some(families) = catalog.accessibility.rule_sets.get(id) {
            for f in families {
                if known(f.as_str()) {
                    enabled.insert(f.clone());
                } else {
                    warn!(rule_set = %id, family = %f, "unknown accessibility rule in rule set ignored");
                }
            }
        } else if known(id.as_str()) {
            enabled.insert(id.clone());
        } else {
            warn!(rule = %id, "unknown accessibility rule ignored");
        }
    }
    enabled
}

/// Evaluates the enabled accessibility families.
pub struct A11yEngine<'a> {
    catalog: &'a Catalog,
    rules: Vec<A11yRule>,
    requested: Vec<String>,
    enabled: BTreeSet<String>,
    proximity: usize,
}

impl<'a> A11yEngine<'a> {
    pub fn new(catalog: &'a Catalog, requested: &[String]) -> Self {
        let rules = A11Y_RULES.to_vec();
        let enabled = resolve_families(catalog, requested, &rules);
        Self {
            catalog,
            rules,
            requested: requested.to_vec(),
            enabled,
            proximity: DEFAULT_LABEL_PROXIMITY,
        }
    }

    pub fn with_proximity(mut self, lines: usize) -> Self {
        self.proximity = lines;
        self
    }

    /// Add a family; it runs when the configuration enables its id.
    pub fn with_rule(mut self, rule: A11yRule) -> Self {
        self.rules.push(rule);
        self.enabled = resolve_families(self.catalog, &self.requested, &self.rules);
        self
    }

    /// Enabled family ids in evaluation order.
    pub fn enabled_rules(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| self.enabled.contains(r.id))
            .map(|r| r.id)
            .collect()
    }

    /// Issues for `usage`; `siblings` is the full usage list of its file.
    pub fn evaluate(
        &self,
        usage: &ComponentUsage,
        siblings: &[ComponentUsage],
    ) -> Vec<ValidationIssue> {
        self.evaluate_with(usage, &LabelIndex::new(self.catalog, siblings))
    }

    /// Issues for every usage of one file, in the same order.
    pub fn evaluate_file(&self, usages: &[ComponentUsage]) -> Vec<Vec<ValidationIssue>> {
        let labels = LabelIndex::new(self.catalog, usages);
        usages
            .iter()
            .map(|u| self.evaluate_with(u, &labels))
            .collect()
    }

    fn evaluate_with(&self, usage: &ComponentUsage, labels: &LabelIndex) -> Vec<ValidationIssue> {
        let Some(spec) = self.catalog.get(&usage.component_name) else {
            return Vec::new();
        };
        let ctx = A11yCtx {
            catalog: self.catalog,
            usage,
            spec,
            labels,
            proximity: self.proximity,
        };
        let mut issues = Vec::new();
        for rule in self.rules.iter().filter(|r| self.enabled.contains(r.id)) {
            let found = (rule.check)(&ctx);
            trace!(
                rule = rule.id,
                component = %usage.component_name,
                line = usage.line_number,
                found = found.len(),
                "accessibility rule evaluated"
            );
            for f in found {
                let mut issue = ValidationIssue::accessibility(
                    rule.id,
                    rule.severity,
                    format!("{} (WCAG {})", f.message, rule.criterion),
                )
                .at(usage.line_number, usage.column);
                issue.prop = f.prop;
                issues.push(issue);
            }
        }
        issues
    }
}
