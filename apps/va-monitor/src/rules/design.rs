//! Design-system conformance rules.

use super::one_of;
use crate::catalog::Catalog;
use crate::models::catalog::ComponentSpec;
use crate::models::{ComponentUsage, PropValue, Severity, ValidationIssue};
use tracing::trace;

/// What a design rule sees: the usage and its catalog entry, if any.
pub struct DesignCtx<'a> {
    pub catalog: &'a Catalog,
    pub usage: &'a ComponentUsage,
    pub spec: Option<&'a ComponentSpec>,
}

pub type DesignCheck = fn(&DesignCtx<'_>) -> Vec<ValidationIssue>;

#[derive(Clone, Copy)]
pub struct DesignRule {
    pub id: &'static str,
    pub check: DesignCheck,
}

pub const UNKNOWN_COMPONENT: &str = "unknown-component";
pub const DEPRECATED_COMPONENT: &str = "deprecated-component";
pub const MISSING_REQUIRED_PROP: &str = "missing-required-prop";
pub const DEPRECATED_PROP: &str = "deprecated-prop";
pub const INVALID_ENUM_VALUE: &str = "invalid-enum-value";
pub const UNVERIFIED_PROP_VALUE: &str = "unverified-prop-value";
pub const FORBIDDEN_PROP_COMBINATION: &str = "forbidden-prop-combination";

/// Builtin rules in evaluation order.
pub const DESIGN_RULES: &[DesignRule] = &[
    DesignRule {
        id: UNKNOWN_COMPONENT,
        check: unknown_component,
    },
    DesignRule {
        id: DEPRECATED_COMPONENT,
        check: deprecated_component,
    },
    DesignRule {
        id: MISSING_REQUIRED_PROP,
        check: missing_required_prop,
    },
    DesignRule {
        id: DEPRECATED_PROP,
        check: deprecated_prop,
    },
    DesignRule {
        id: INVALID_ENUM_VALUE,
        check: invalid_enum_value,
    },
    DesignRule {
        id: FORBIDDEN_PROP_COMBINATION,
        check: forbidden_prop_combination,
    },
];

fn unknown_component(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
    if ctx.spec.is_some() {
        return Vec::new();
    }
    vec![ValidationIssue::design(
        UNKNOWN_COMPONENT,
        Severity::Info,
        format!(
            "'{}' is not a known {} component (version {})",
            ctx.usage.component_name, ctx.catalog.name, ctx.catalog.version
        ),
    )]
}

fn deprecated_component(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
    let Some(spec) = ctx.spec.filter(|s| s.deprecated) else {
        return Vec::new();
    };
    let mut message = format!("'{}' is deprecated", spec.name);
    if let Some(r) = &spec.replacement {
        message.push_str(&format!("; use '{}' instead", r));
    }
    vec![ValidationIssue::design(
        DEPRECATED_COMPONENT,
        Severity::Warning,
        message,
    )]
}

fn missing_required_prop(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
    let Some(spec) = ctx.spec else {
        return Vec::new();
    };
    let u = ctx.usage;
    spec.required
        .iter()
        .filter(|p| !u.has_prop(p))
        .map(|p| {
            let issue = if u.spread {
                ValidationIssue::design(
                    MISSING_REQUIRED_PROP,
                    Severity::Info,
                    format!(
                        "could not statically verify required prop '{}' on '{}': props are spread",
                        p, u.component_name
                    ),
                )
            } else {
                ValidationIssue::design(
                    MISSING_REQUIRED_PROP,
                    Severity::Error,
                    format!("'{}' is missing required prop '{}'", u.component_name, p),
                )
            };
            issue.with_prop(p.as_str())
        })
        .collect()
}

fn deprecated_prop(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
    let Some(spec) = ctx.spec else {
        return Vec::new();
    };
    spec.deprecated_props
        .iter()
        .filter(|d| ctx.usage.has_prop(&d.prop))
        .map(|d| {
            let mut message = format!(
                "prop '{}' on '{}' is deprecated",
                d.prop, ctx.usage.component_name
            );
            if let Some(r) = &d.replacement {
                message.push_str(&format!("; use '{}' instead", r));
            }
            if let Some(note) = &d.note {
                message.push_str(&format!(" ({})", note));
            }
            ValidationIssue::design(DEPRECATED_PROP, Severity::Warning, message)
                .with_prop(d.prop.as_str())
        })
        .collect()
}

fn invalid_enum_value(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
    let Some(spec) = ctx.spec else {
        return Vec::new();
    };
    let u = ctx.usage;
    let mut out = Vec::new();
    for (prop, allowed) in &spec.enums {
        match u.prop(prop) {
            Some(PropValue::Literal(lit)) => {
                let text = lit.text();
                if !allowed.iter().any(|a| *a == text) {
                    out.push(
                        ValidationIssue::design(
                            INVALID_ENUM_VALUE,
                            Severity::Error,
                            format!(
                                "'{}' is not a valid value for '{}' on '{}'; expected {}",
                                text,
                                prop,
                                u.component_name,
                                one_of(allowed)
                            ),
                        )
                        .with_prop(prop.as_str()),
                    );
                }
            }
            Some(PropValue::Unresolved) => out.push(
                ValidationIssue::design(
                    UNVERIFIED_PROP_VALUE,
                    Severity::Info,
                    format!(
                        "could not statically verify the value of '{}' on '{}'",
                        prop, u.component_name
                    ),
                )
                .with_prop(prop.as_str()),
            ),
            // references are resolved at runtime; not judged
            Some(PropValue::Reference(_)) | None => {}
        }
    }
    out
}

fn forbidden_prop_combination(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
    let Some(spec) = ctx.spec else {
        return Vec::new();
    };
    let u = ctx.usage;
    let set = |p: &str| u.prop(p).is_some_and(PropValue::is_set_literal);
    spec.exclusive
        .iter()
        .filter(|(a, b)| set(a) && set(b))
        .map(|(a, b)| {
            ValidationIssue::design(
                FORBIDDEN_PROP_COMBINATION,
                Severity::Warning,
                format!(
                    "'{}' and '{}' cannot be combined on '{}'",
                    a, b, u.component_name
                ),
            )
            .with_prop(b.as_str())
        })
        .collect()
}

/// Evaluates design-system rules against one catalog version.
pub struct DesignEngine<'a> {
    catalog: &'a Catalog,
    rules: Vec<DesignRule>,
}

impl<'a> DesignEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            rules: DESIGN_RULES.to_vec(),
        }
    }

    /// Append a rule; it runs after the builtin ones.
    pub fn with_rule(mut self, rule: DesignRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Issues for `usage` in rule declaration order, located at the usage.
    pub fn evaluate(&self, usage: &ComponentUsage) -> Vec<ValidationIssue> {
        let ctx = DesignCtx {
            catalog: self.catalog,
            usage,
            spec: self.catalog.get(&usage.component_name),
        };
        let mut issues = Vec::new();
        for rule in &self.rules {
            let found = (rule.check)(&ctx);
            trace!(
                rule = rule.id,
                component = %usage.component_name,
                line = usage.line_number,
                found = found.len(),
                "design rule evaluated"
            );
            issues.extend(
                found
                    .into_iter()
                    .map(|i| i.at(usage.line_number, usage.column)),
            );
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::{IssueType, Literal};

    fn latest() -> Catalog {
        catalog::builtin().unwrap().resolve("latest").unwrap()
    }

    fn usage(name: &str, props: &[(&str, PropValue)]) -> ComponentUsage {
        let mut u = ComponentUsage::new(name, name, "a.vue", 4, 2);
        for (k, v) in props {
            u.props.insert(k.to_string(), v.clone());
        }
        u
    }

    fn rules_of(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule.as_str()).collect()
    }

    #[test]
    fn test_unknown_component_is_info_only() {
        let cat = latest();
        let issues = DesignEngine::new(&cat).evaluate(&usage("va-sparkle", &[]));
        assert_eq!(rules_of(&issues), vec![UNKNOWN_COMPONENT]);
        assert_eq!(issues[0].severity, Severity::Info);
        assert_eq!(issues[0].kind, IssueType::DesignSystem);
        assert_eq!((issues[0].line, issues[0].column), (Some(4), Some(2)));
    }

    #[test]
    fn test_one_error_per_missing_required_prop() {
        let cat = latest();
        let issues = DesignEngine::new(&cat).evaluate(&usage("va-link", &[]));
        let missing: Vec<_> = issues
            .iter()
            .filter(|i| i.rule == MISSING_REQUIRED_PROP)
            .collect();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|i| i.severity == Severity::Error));
        let props: Vec<_> = missing.iter().filter_map(|i| i.prop.as_deref()).collect();
        assert_eq!(props, vec!["href", "text"]);
    }

    #[test]
    fn test_references_and_unresolved_satisfy_presence() {
        let cat = latest();
        let u = usage(
            "va-link",
            &[
                ("href", PropValue::Reference("url".into())),
                ("text", PropValue::Unresolved),
            ],
        );
        assert!(DesignEngine::new(&cat).evaluate(&u).is_empty());
    }

    #[test]
    fn test_spread_downgrades_missing_required() {
        let cat = latest();
        let mut u = usage("va-text-input", &[]);
        u.spread = true;
        let issues = DesignEngine::new(&cat).evaluate(&u);
        assert_eq!(rules_of(&issues), vec![MISSING_REQUIRED_PROP]);
        assert_eq!(issues[0].severity, Severity::Info);
        assert!(issues[0].message.contains("could not statically verify"));
    }

    #[test]
    fn test_enum_values() {
        let cat = latest();
        let engine = DesignEngine::new(&cat);
        let bad = engine.evaluate(&usage("va-alert", &[("status", PropValue::string("danger"))]));
        assert_eq!(rules_of(&bad), vec![INVALID_ENUM_VALUE]);
        assert_eq!(bad[0].severity, Severity::Error);
        assert!(bad[0].message.contains("danger"));

        let ok = engine.evaluate(&usage("va-alert", &[("status", PropValue::string("info"))]));
        assert!(ok.is_empty());

        let unresolved = engine.evaluate(&usage("va-alert", &[("status", PropValue::Unresolved)]));
        assert_eq!(rules_of(&unresolved), vec![UNVERIFIED_PROP_VALUE]);
        assert_eq!(unresolved[0].severity, Severity::Info);

        let reference =
            engine.evaluate(&usage("va-alert", &[("status", PropValue::Reference("s".into()))]));
        assert!(reference.is_empty());

        let number = engine.evaluate(&usage(
            "va-icon",
            &[
                ("icon", PropValue::string("add")),
                ("size", PropValue::Literal(Literal::Number("4".into()))),
            ],
        ));
        assert!(number.is_empty());
    }

    #[test]
    fn test_deprecations() {
        let cat = latest();
        let engine = DesignEngine::new(&cat);
        let issues = engine.evaluate(&usage("va-promo-banner", &[("href", PropValue::string("/"))]));
        assert_eq!(rules_of(&issues), vec![DEPRECATED_COMPONENT]);
        assert!(issues[0].message.contains("va-banner"));

        let issues = engine.evaluate(&usage(
            "va-alert",
            &[
                ("status", PropValue::string("info")),
                ("backgroundOnly", PropValue::bool(true)),
            ],
        ));
        assert_eq!(rules_of(&issues), vec![DEPRECATED_PROP]);
        assert!(issues[0].message.contains("'slim'"));
    }

    #[test]
    fn test_exclusive_props_need_both_set() {
        let cat = latest();
        let engine = DesignEngine::new(&cat);
        let both = engine.evaluate(&usage(
            "va-button",
            &[
                ("text", PropValue::string("Go")),
                ("back", PropValue::bool(true)),
                ("continue", PropValue::bool(true)),
            ],
        ));
        assert_eq!(rules_of(&both), vec![FORBIDDEN_PROP_COMBINATION]);

        let off = engine.evaluate(&usage(
            "va-button",
            &[
                ("text", PropValue::string("Go")),
                ("back", PropValue::bool(true)),
                ("continue", PropValue::bool(false)),
            ],
        ));
        assert!(off.is_empty());
    }

    #[test]
    fn test_version_selects_metadata() {
        let file = catalog::builtin().unwrap();
        let v1 = file.resolve("v1").unwrap();
        let u = usage("va-promo-banner", &[("href", PropValue::string("/"))]);
        assert!(DesignEngine::new(&v1).evaluate(&u).is_empty());
    }

    #[test]
    fn test_custom_rule_runs_last() {
        fn no_tags(ctx: &DesignCtx<'_>) -> Vec<ValidationIssue> {
            if ctx.usage.component_name == "va-tag-status" {
                vec![ValidationIssue::design("no-tags", Severity::Warning, "no tags")]
            } else {
                Vec::new()
            }
        }
        let cat = latest();
        let engine = DesignEngine::new(&cat).with_rule(DesignRule {
            id: "no-tags",
            check: no_tags,
        });
        let issues = engine.evaluate(&usage("va-tag-status", &[]));
        assert_eq!(rules_of(&issues), vec![MISSING_REQUIRED_PROP, "no-tags"]);
    }
}
