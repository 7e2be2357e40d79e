//! Rule engines evaluating one component usage at a time.
//!
//! Rules are data: each engine owns a table of `{ id, check }` entries and
//! runs them in declaration order through one loop. Adding a rule means
//! adding a table entry (or calling `with_rule`), never a new branch.

pub mod a11y;
pub mod design;

pub use a11y::{A11yEngine, A11yRule, A11Y_RULES};
pub use design::{DesignEngine, DesignRule, DESIGN_RULES};

use crate::models::ComponentUsage;

/// Human list of prop names: `text, label or aria-label`.
pub(crate) fn one_of<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => format!(
            "{} or {}",
            init.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
            last.as_ref()
        ),
    }
}

/// Names of the props of `usage` that appear in `names`.
pub(crate) fn present<'a, S: AsRef<str>>(usage: &ComponentUsage, names: &'a [S]) -> Vec<&'a str> {
    names
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| usage.has_prop(n))
        .collect()
}
