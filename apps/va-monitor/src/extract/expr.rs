//! Classification of attribute expressions into `PropValue`s.

use super::lex::{find_close, ident_end, is_ident_start, skip_string, split_top_level};
use crate::models::{Literal, PropValue};
use regex::Regex;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:0[xXbBoO][0-9a-fA-F_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?|\.\d+)n?$")
        .expect("number literal pattern")
});

static MEMBER_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(?:\??\.[A-Za-z_$][\w$]*)*$").expect("member path pattern")
});

/// Object keys whose object-literal value holds the real props (Vue 2
/// render functions: `h('va-button', { attrs: { text: 'Go' } })`).
const NESTED_PROP_KEYS: &[&str] = &["attrs", "props", "domProps"];

fn wrapped_in(e: &str, open: u8) -> bool {
    let b = e.as_bytes();
    !b.is_empty() && b[0] == open && find_close(b, 0, b.len()) == Some(b.len() - 1)
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Quoted string literal body, if `e` is exactly one string literal.
fn string_literal(e: &str) -> Option<String> {
    let b = e.as_bytes();
    match b.first()? {
        b'\'' | b'"' if b.len() >= 2 && skip_string(b, 0, b.len()) == b.len() => {
            Some(unescape(&e[1..e.len() - 1]))
        }
        b'`' if wrapped_in(e, b'`') && !e.contains("${") => Some(e[1..e.len() - 1].to_string()),
        _ => None,
    }
}

/// Classify an expression as a literal, a reference or unresolved.
pub(super) fn classify(expr: &str) -> PropValue {
    let mut e = expr.trim();
    while wrapped_in(e, b'(') {
        e = e[1..e.len() - 1].trim();
    }
    if let Some(stripped) = e.strip_suffix("as const") {
        e = stripped.trim_end();
    }
    if let Some(stripped) = e.strip_suffix('!') {
        e = stripped.trim_end();
    }
    match e {
        "" | "null" | "undefined" => return PropValue::Unresolved,
        "true" => return PropValue::bool(true),
        "false" => return PropValue::bool(false),
        _ => {}
    }
    if NUMBER.is_match(e) {
        return PropValue::Literal(Literal::Number(e.to_string()));
    }
    if let Some(s) = string_literal(e) {
        return PropValue::string(s);
    }
    if MEMBER_PATH.is_match(e) {
        return PropValue::Reference(e.to_string());
    }
    PropValue::Unresolved
}

/// Props declared by the body of an object literal (without its braces).
///
/// Returns the entries in source order plus whether the literal spreads or
/// computes keys, in which case any prop may be present.
pub(super) fn parse_object_literal(body: &str) -> (Vec<(String, PropValue)>, bool) {
    let mut props = Vec::new();
    let mut spread = false;
    for entry in split_top_level(body, b',') {
        let e = entry.trim();
        if e.is_empty() {
            continue;
        }
        if e.starts_with("...") || e.starts_with('[') {
            spread = true;
            continue;
        }
        let b = e.as_bytes();
        let (key, rest) = match b[0] {
            b'\'' | b'"' => {
                let end = skip_string(b, 0, b.len());
                if end < 2 || b[end - 1] != b[0] {
                    continue;
                }
                (unescape(&e[1..end - 1]), &e[end..])
            }
            c if is_ident_start(c) || c.is_ascii_digit() => {
                let end = ident_end(b, 0, b.len());
                (e[..end].to_string(), &e[end..])
            }
            _ => continue,
        };
        let rest = rest.trim_start();
        if rest.is_empty() {
            props.push((key.clone(), PropValue::Reference(key)));
        } else if let Some(value) = rest.strip_prefix(':') {
            let value = value.trim();
            if NESTED_PROP_KEYS.contains(&key.as_str()) && wrapped_in(value, b'{') {
                let (inner, inner_spread) = parse_object_literal(&value[1..value.len() - 1]);
                props.extend(inner);
                spread |= inner_spread;
            } else {
                props.push((key, classify(value)));
            }
        } else {
            // method shorthand or accessor
            props.push((key, PropValue::Unresolved));
        }
    }
    (props, spread)
}
