//! Invocation-site scanner.
//!
//! Walks one source file and records every catalog-prefixed invocation as a
//! `Site` with its byte extent. Script regions run a code/children mode stack
//! (JSX); template regions run a flat markup scanner. Attribute expressions
//! are scanned recursively up to the configured depth. Parents are derived
//! from the recorded extents afterwards.

use super::expr::{classify, parse_object_literal};
use super::lex::{
    comment_at, expr_position, find_close, ident_end, is_ident_char, is_ident_start, regex_at,
    skip_string, skip_ws,
};
use super::ExtractError;
use crate::catalog::{canonical_name, pascal_prefix};
use crate::models::PropValue;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// Loop steps between deadline checks.
const TICK: usize = 1024;

/// Callees whose first argument names the element to create.
const CALL_NAMES: &[&str] = &[
    "h",
    "createElement",
    "React.createElement",
    "jsx",
    "jsxs",
    "_jsx",
    "_jsxs",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

static JSX_LANG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blang\s*=\s*["']?(?:tsx|jsx)\b"#).expect("script lang pattern")
});

/// One recognized invocation.
#[derive(Debug)]
pub(super) struct Site {
    pub tag: String,
    pub name: String,
    /// Offset of the `<` or callee.
    pub start: usize,
    /// Offset just past the closing tag, self-closing `/>` or call `)`.
    pub end: usize,
    pub props: BTreeMap<String, PropValue>,
    pub spread: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum Syntax {
    Jsx,
    Markup,
}

enum TagKind {
    Open,
    SelfClose,
}

struct Tag {
    name: String,
    site: Option<usize>,
    kind: TagKind,
    end: usize,
}

enum AttrValue {
    Bare,
    Str(String),
    Expr(String),
}

enum Mode {
    Code { braces: usize },
    Children { tag: String, site: Option<usize> },
}

pub(super) struct Scanner<'a> {
    src: &'a str,
    b: &'a [u8],
    prefix: &'a str,
    pascal: String,
    max_sites: usize,
    max_depth: usize,
    deadline: Option<(Instant, u64)>,
    steps: usize,
    sites: Vec<Site>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        src: &'a str,
        prefix: &'a str,
        max_sites: usize,
        max_millis: u64,
        max_depth: usize,
    ) -> Self {
        let deadline = (max_millis > 0)
            .then(|| (Instant::now() + Duration::from_millis(max_millis), max_millis));
        Self {
            src,
            b: src.as_bytes(),
            prefix,
            pascal: pascal_prefix(prefix),
            max_sites,
            max_depth,
            deadline,
            steps: 0,
            sites: Vec::new(),
        }
    }

    pub fn into_sites(self) -> Vec<Site> {
        self.sites
    }

    /// Quick rejection: files that never mention the prefix hold no sites.
    pub fn mentions_prefix(&self) -> bool {
        self.src.contains(self.prefix) || self.src.contains(self.pascal.as_str())
    }

    fn check_deadline(&self) -> Result<(), ExtractError> {
        match self.deadline {
            Some((at, limit_ms)) if Instant::now() > at => Err(ExtractError::Timeout { limit_ms }),
            _ => Ok(()),
        }
    }

    fn tick(&mut self) -> Result<(), ExtractError> {
        self.steps += 1;
        if self.steps % TICK == 0 {
            self.check_deadline()
        } else {
            Ok(())
        }
    }

    /// `find_close` after a deadline check. A single call may walk the rest
    /// of the file, so repeated failing lookups must not outrun the limit.
    fn close_of(&self, open: usize, to: usize) -> Result<Option<usize>, ExtractError> {
        self.check_deadline()?;
        Ok(find_close(self.b, open, to))
    }

    fn push_site(&mut self, tag: &str, name: String, start: usize) -> Result<usize, ExtractError> {
        if self.sites.len() >= self.max_sites {
            return Err(ExtractError::TooManySites {
                limit: self.max_sites,
            });
        }
        self.check_deadline()?;
        self.sites.push(Site {
            tag: tag.to_string(),
            name,
            start,
            end: start,
            props: BTreeMap::new(),
            spread: false,
        });
        Ok(self.sites.len() - 1)
    }

    /// Scan `[from, to)` as script code.
    pub fn scan_script(
        &mut self,
        from: usize,
        to: usize,
        jsx: bool,
        depth: usize,
    ) -> Result<(), ExtractError> {
        let b = self.b;
        let mut modes = vec![Mode::Code { braces: 0 }];
        let mut i = from;
        while i < to {
            self.tick()?;
            let c = b[i];
            if matches!(modes.last(), Some(Mode::Children { .. })) {
                i = match c {
                    b'{' => {
                        modes.push(Mode::Code { braces: 0 });
                        i + 1
                    }
                    b'<' if i + 1 < to && b[i + 1] == b'/' => self.close_jsx(&mut modes, i, to),
                    b'<' => self.open_jsx(&mut modes, i, to, depth)?,
                    _ => i + 1,
                };
                continue;
            }
            if let Some(next) = comment_at(b, i, to).or_else(|| regex_at(b, from, i, to)) {
                i = next;
                continue;
            }
            i = match c {
                b'\'' | b'"' => skip_string(b, i, to),
                b'`' => self.close_of(i, to)?.map_or(to, |e| e + 1),
                b'{' => {
                    if let Some(Mode::Code { braces }) = modes.last_mut() {
                        *braces += 1;
                    }
                    i + 1
                }
                b'}' => {
                    let open_braces = match modes.last() {
                        Some(Mode::Code { braces }) => *braces,
                        _ => 0,
                    };
                    if open_braces > 0 {
                        if let Some(Mode::Code { braces }) = modes.last_mut() {
                            *braces -= 1;
                        }
                    } else if modes.len() > 1 {
                        // closes a `{expr}` child of an element
                        modes.pop();
                    }
                    i + 1
                }
                b'<' if jsx && self.tag_may_start(i, to) && expr_position(b, from, i) => {
                    self.open_jsx(&mut modes, i, to, depth)?
                }
                c if is_ident_start(c) => self.identifier(i, to)?,
                _ => i + 1,
            };
        }
        for m in modes {
            if let Mode::Children { site: Some(s), .. } = m {
                self.sites[s].end = to;
            }
        }
        Ok(())
    }

    fn tag_may_start(&self, i: usize, to: usize) -> bool {
        i + 1 < to && (self.b[i + 1].is_ascii_alphabetic() || self.b[i + 1] == b'>')
    }

    fn open_jsx(
        &mut self,
        modes: &mut Vec<Mode>,
        lt: usize,
        to: usize,
        depth: usize,
    ) -> Result<usize, ExtractError> {
        let Some(tag) = self.parse_tag(lt, to, depth, Syntax::Jsx)? else {
            return Ok(lt + 1);
        };
        match tag.kind {
            TagKind::SelfClose => {
                if let Some(s) = tag.site {
                    self.sites[s].end = tag.end;
                }
            }
            TagKind::Open => modes.push(Mode::Children {
                tag: tag.name,
                site: tag.site,
            }),
        }
        Ok(tag.end)
    }

    /// Handle `</name>` inside JSX children; unmatched closers are text.
    fn close_jsx(&mut self, modes: &mut Vec<Mode>, lt: usize, to: usize) -> usize {
        let b = self.b;
        let name_start = skip_ws(b, lt + 2, to);
        let name_end = tag_name_end(b, name_start, to);
        let gt = skip_ws(b, name_end, to);
        if gt >= to || b[gt] != b'>' {
            return lt + 1;
        }
        let name = &self.src[name_start..name_end];
        let mut k = modes.len();
        let mut found = None;
        while k > 0 {
            k -= 1;
            match &modes[k] {
                Mode::Children { tag, .. } if tag == name => {
                    found = Some(k);
                    break;
                }
                Mode::Children { .. } => {}
                Mode::Code { .. } => break,
            }
        }
        let Some(k) = found else {
            return gt + 1;
        };
        for m in modes.drain(k..) {
            if let Mode::Children { site: Some(s), .. } = m {
                self.sites[s].end = gt + 1;
            }
        }
        gt + 1
    }

    /// Record a call-like site when the identifier at `i` is a known
    /// element factory. Returns the position after the identifier path;
    /// arguments are scanned by the caller like any other code.
    fn identifier(&mut self, i: usize, to: usize) -> Result<usize, ExtractError> {
        let b = self.b;
        let mut j = ident_end(b, i, to);
        while j + 1 < to && b[j] == b'.' && is_ident_start(b[j + 1]) {
            j = ident_end(b, j + 1, to);
        }
        let path = &self.src[i..j];
        if !CALL_NAMES.contains(&path) || (i > 0 && b[i - 1] == b'.') {
            return Ok(j);
        }
        let paren = skip_ws(b, j, to);
        if paren < to && b[paren] == b'(' {
            self.call_site(i, paren, to)?;
        }
        Ok(j)
    }

    fn call_site(&mut self, start: usize, paren: usize, to: usize) -> Result<(), ExtractError> {
        let b = self.b;
        let close = self.close_of(paren, to)?;
        let limit = close.unwrap_or(to);
        let k = skip_ws(b, paren + 1, limit);
        if k >= limit {
            return Ok(());
        }
        let (raw, after) = match b[k] {
            b'\'' | b'"' => {
                let end = skip_string(b, k, limit);
                if end < k + 2 || b[end - 1] != b[k] {
                    return Ok(());
                }
                let raw = &self.src[k + 1..end - 1];
                // string names must already be in kebab form
                if canonical_name(raw, self.prefix).as_deref() != Some(raw) {
                    return Ok(());
                }
                (raw, end)
            }
            c if is_ident_start(c) => {
                let end = ident_end(b, k, limit);
                (&self.src[k..end], end)
            }
            _ => return Ok(()),
        };
        let Some(name) = canonical_name(raw, self.prefix) else {
            return Ok(());
        };
        let idx = self.push_site(raw, name, start)?;
        self.sites[idx].end = close.map_or(to, |c| c + 1);

        let comma = skip_ws(b, after, limit);
        if comma >= limit || b[comma] != b',' {
            return Ok(());
        }
        let obj = skip_ws(b, comma + 1, limit);
        if obj < limit && b[obj] == b'{' {
            if let Some(obj_end) = self.close_of(obj, limit)? {
                let (props, spread) = parse_object_literal(&self.src[obj + 1..obj_end]);
                let site = &mut self.sites[idx];
                site.props.extend(props);
                site.spread |= spread;
            }
        }
        Ok(())
    }

    /// Parse a start tag at `lt`. Returns `None` when the text is not a
    /// well-formed start tag; any site pushed for it is discarded.
    fn parse_tag(
        &mut self,
        lt: usize,
        to: usize,
        depth: usize,
        syntax: Syntax,
    ) -> Result<Option<Tag>, ExtractError> {
        let b = self.b;
        let mut j = lt + 1;
        if j >= to {
            return Ok(None);
        }
        if b[j] == b'>' && syntax == Syntax::Jsx {
            return Ok(Some(Tag {
                name: String::new(),
                site: None,
                kind: TagKind::Open,
                end: j + 1,
            }));
        }
        if !b[j].is_ascii_alphabetic() {
            return Ok(None);
        }
        let name_end = tag_name_end(b, j, to);
        if name_end < to && !matches!(b[name_end], b'/' | b'>') && !b[name_end].is_ascii_whitespace()
        {
            return Ok(None);
        }
        let name = &self.src[j..name_end];
        let mark = self.sites.len();
        let site = match canonical_name(name, self.prefix) {
            Some(canon) => Some(self.push_site(name, canon, lt)?),
            None => None,
        };
        j = name_end;

        let kind = loop {
            self.tick()?;
            j = skip_ws(b, j, to);
            if syntax == Syntax::Jsx {
                if let Some(next) = comment_at(b, j, to) {
                    j = next;
                    continue;
                }
            }
            if j >= to {
                break None;
            }
            match b[j] {
                b'/' if j + 1 < to && b[j + 1] == b'>' => {
                    j += 2;
                    break Some(TagKind::SelfClose);
                }
                b'>' => {
                    j += 1;
                    break Some(TagKind::Open);
                }
                b'{' => {
                    let Some(close) = self.close_of(j, to)? else {
                        break None;
                    };
                    if self.src[j + 1..close].trim_start().starts_with("...") {
                        if let Some(s) = site {
                            self.sites[s].spread = true;
                        }
                    }
                    j = close + 1;
                }
                c if is_attr_start(c) => {
                    let attr_end = attr_name_end(b, j, to);
                    let attr = &self.src[j..attr_end];
                    let eq = skip_ws(b, attr_end, to);
                    let (value, next) = if eq < to && b[eq] == b'=' {
                        match self.attr_value(skip_ws(b, eq + 1, to), to, depth, syntax)? {
                            Some(v) => v,
                            None => break None,
                        }
                    } else {
                        (AttrValue::Bare, attr_end)
                    };
                    if let Some(s) = site {
                        self.apply_attr(s, attr, value, syntax);
                    }
                    j = next;
                }
                _ => break None,
            }
        };

        match kind {
            Some(kind) => Ok(Some(Tag {
                name: name.to_string(),
                site,
                kind,
                end: j,
            })),
            None => {
                self.sites.truncate(mark);
                Ok(None)
            }
        }
    }

    fn attr_value(
        &mut self,
        v: usize,
        to: usize,
        depth: usize,
        syntax: Syntax,
    ) -> Result<Option<(AttrValue, usize)>, ExtractError> {
        let b = self.b;
        if v >= to {
            return Ok(None);
        }
        match b[v] {
            q @ (b'"' | b'\'') => {
                let Some(len) = b[v + 1..to].iter().position(|c| *c == q) else {
                    return Ok(None);
                };
                let text = self.src[v + 1..v + 1 + len].to_string();
                Ok(Some((AttrValue::Str(text), v + len + 2)))
            }
            b'{' => {
                let Some(close) = self.close_of(v, to)? else {
                    return Ok(None);
                };
                if syntax == Syntax::Jsx && depth < self.max_depth {
                    self.scan_script(v + 1, close, true, depth + 1)?;
                }
                let text = self.src[v + 1..close].to_string();
                Ok(Some((AttrValue::Expr(text), close + 1)))
            }
            _ if syntax == Syntax::Markup => {
                let mut e = v;
                while e < to && !b[e].is_ascii_whitespace() && b[e] != b'>' {
                    e += 1;
                }
                if e > v && b[e - 1] == b'/' && e < to && b[e] == b'>' {
                    e -= 1;
                }
                Ok(Some((AttrValue::Str(self.src[v..e].to_string()), e)))
            }
            _ => Ok(None),
        }
    }

    fn apply_attr(&mut self, site: usize, attr: &str, value: AttrValue, syntax: Syntax) {
        let (key, value) = match syntax {
            Syntax::Jsx => (attr.to_string(), jsx_value(value)),
            Syntax::Markup => match markup_attr(attr, value) {
                MarkupAttr::Prop(k, v) => (k, v),
                MarkupAttr::Spread => {
                    self.sites[site].spread = true;
                    return;
                }
                MarkupAttr::Ignore => return,
            },
        };
        self.sites[site].props.insert(key, value);
    }

    /// Scan `[from, to)` as markup (Vue, HTML, Svelte).
    pub fn scan_markup(&mut self, from: usize, to: usize, depth: usize) -> Result<(), ExtractError> {
        let b = self.b;
        let mut open: Vec<(String, Option<usize>)> = Vec::new();
        let mut i = from;
        while i < to {
            self.tick()?;
            let Some(off) = self.src[i..to].find('<') else {
                break;
            };
            i += off;
            let rest = &self.src[i..to];
            if rest.starts_with("<!--") {
                i = rest.find("-->").map_or(to, |e| i + e + 3);
                continue;
            }
            if rest.starts_with("</") {
                let name_start = skip_ws(b, i + 2, to);
                let name_end = tag_name_end(b, name_start, to);
                let gt = b[name_end..to]
                    .iter()
                    .position(|c| *c == b'>')
                    .map_or(to, |p| name_end + p + 1);
                let name = &self.src[name_start..name_end];
                if let Some(k) = open.iter().rposition(|(t, _)| t.eq_ignore_ascii_case(name)) {
                    for (_, site) in open.drain(k..) {
                        if let Some(s) = site {
                            self.sites[s].end = gt;
                        }
                    }
                }
                i = gt;
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                i = rest.find('>').map_or(to, |e| i + e + 1);
                continue;
            }
            let Some(tag) = self.parse_tag(i, to, depth, Syntax::Markup)? else {
                i += 1;
                continue;
            };
            let lower = tag.name.to_ascii_lowercase();
            match (lower.as_str(), &tag.kind) {
                ("script", TagKind::Open) => {
                    let body_end = find_ci(self.src, tag.end, to, "</script").unwrap_or(to);
                    let jsx = JSX_LANG.is_match(&self.src[i..tag.end]);
                    self.scan_script(tag.end, body_end, jsx, depth)?;
                    i = self.src[body_end..to].find('>').map_or(to, |e| body_end + e + 1);
                }
                ("style", TagKind::Open) => {
                    let body_end = find_ci(self.src, tag.end, to, "</style").unwrap_or(to);
                    i = self.src[body_end..to].find('>').map_or(to, |e| body_end + e + 1);
                }
                (_, TagKind::SelfClose) => {
                    if let Some(s) = tag.site {
                        self.sites[s].end = tag.end;
                    }
                    i = tag.end;
                }
                (name, TagKind::Open) if VOID_ELEMENTS.contains(&name) => {
                    if let Some(s) = tag.site {
                        self.sites[s].end = tag.end;
                    }
                    i = tag.end;
                }
                (_, TagKind::Open) => {
                    i = tag.end;
                    open.push((tag.name, tag.site));
                }
            }
        }
        for (_, site) in open {
            if let Some(s) = site {
                self.sites[s].end = to;
            }
        }
        Ok(())
    }
}

fn tag_name_end(b: &[u8], mut i: usize, to: usize) -> usize {
    while i < to && (is_ident_char(b[i]) || matches!(b[i], b'-' | b'.' | b':')) {
        i += 1;
    }
    i
}

fn is_attr_start(c: u8) -> bool {
    is_ident_start(c) || matches!(c, b':' | b'@' | b'#')
}

fn attr_name_end(b: &[u8], mut i: usize, to: usize) -> usize {
    while i < to && (is_ident_char(b[i]) || matches!(b[i], b'-' | b'.' | b':' | b'@' | b'#')) {
        i += 1;
    }
    i
}

/// Case-insensitive search for an ASCII `needle` in `src[from..to]`.
fn find_ci(src: &str, from: usize, to: usize, needle: &str) -> Option<usize> {
    let hay = &src.as_bytes()[from..to];
    let n = needle.as_bytes();
    if hay.len() < n.len() {
        return None;
    }
    (0..=hay.len() - n.len())
        .find(|&k| hay[k..k + n.len()].eq_ignore_ascii_case(n))
        .map(|k| from + k)
}

fn jsx_value(value: AttrValue) -> PropValue {
    match value {
        AttrValue::Bare => PropValue::bool(true),
        AttrValue::Str(s) => PropValue::string(s),
        AttrValue::Expr(e) => classify(&e),
    }
}

enum MarkupAttr {
    Prop(String, PropValue),
    Spread,
    Ignore,
}

/// Strip Vue modifiers: `click.prevent` -> `click`.
fn without_modifiers(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn markup_attr(attr: &str, value: AttrValue) -> MarkupAttr {
    let bound = |v: AttrValue| match v {
        AttrValue::Bare => PropValue::Unresolved,
        AttrValue::Str(s) | AttrValue::Expr(s) => classify(&s),
    };
    if attr == "v-bind" {
        return MarkupAttr::Spread;
    }
    let event = attr
        .strip_prefix('@')
        .or_else(|| attr.strip_prefix("v-on:"))
        .or_else(|| attr.strip_prefix("on:"));
    if let Some(evt) = event {
        return MarkupAttr::Prop(format!("on{}", without_modifiers(evt)), bound(value));
    }
    if let Some(prop) = attr
        .strip_prefix(':')
        .or_else(|| attr.strip_prefix("v-bind:"))
    {
        return MarkupAttr::Prop(without_modifiers(prop).to_string(), bound(value));
    }
    if attr.starts_with("v-") || attr.starts_with('#') || attr.contains(':') {
        return MarkupAttr::Ignore;
    }
    let value = match value {
        AttrValue::Bare => PropValue::bool(true),
        AttrValue::Str(s) => PropValue::string(s),
        AttrValue::Expr(e) => classify(&e),
    };
    MarkupAttr::Prop(attr.to_string(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(src: &str) -> Vec<Site> {
        let mut s = Scanner::new(src, "va-", 100, 0, 8);
        s.scan_script(0, src.len(), true, 0).unwrap();
        s.into_sites()
    }

    fn markup(src: &str) -> Vec<Site> {
        let mut s = Scanner::new(src, "va-", 100, 0, 8);
        s.scan_markup(0, src.len(), 0).unwrap();
        s.into_sites()
    }

    #[test]
    fn test_generic_is_not_a_tag() {
        let sites = script("const a: Array<VaButtonProps> = []; let b = x <VaButton;");
        assert!(sites.is_empty());
    }

    #[test]
    fn test_jsx_after_return_keyword() {
        let sites = script("function F() { return <VaButton text=\"Go\" />; }");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "va-button");
        assert_eq!(sites[0].props["text"], PropValue::string("Go"));
    }

    #[test]
    fn test_container_extent_covers_children() {
        let src = "<VaRadio label=\"Pick\"><VaRadioOption label=\"A\" /></VaRadio>";
        let sites = script(src);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].end, src.len());
        assert!(sites[1].start > sites[0].start && sites[1].end < sites[0].end);
    }

    #[test]
    fn test_apostrophe_in_jsx_text_is_plain() {
        let src = "<div>Don't <va-button text=\"x\"></va-button></div>";
        assert_eq!(script(src).len(), 1);
    }

    #[test]
    fn test_nested_site_in_attribute_expression() {
        let sites = script("<VaButton icon={<VaIcon icon=\"add\" />} text=\"Add\" />");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[1].name, "va-icon");
        assert!(sites[1].end <= sites[0].end);
    }

    #[test]
    fn test_call_sites() {
        let sites = script("h('va-alert', { status: 'info' }); React.createElement(VaButton, null)");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].props["status"], PropValue::string("info"));
        assert_eq!(sites[1].name, "va-button");
        // member calls are not factories
        assert!(script("this.h('va-alert')").is_empty());
    }

    #[test]
    fn test_markup_directives() {
        let sites = markup(
            "<template><va-button :text=\"label\" @click.prevent=\"save\" v-if=\"ok\" v-bind=\"rest\" disabled /></template>",
        );
        assert_eq!(sites.len(), 1);
        let s = &sites[0];
        assert_eq!(s.props["text"], PropValue::Reference("label".into()));
        assert_eq!(s.props["onclick"], PropValue::Reference("save".into()));
        assert_eq!(s.props["disabled"], PropValue::bool(true));
        assert!(!s.props.contains_key("v-if"));
        assert!(s.spread);
    }

    #[test]
    fn test_markup_skips_comments_and_style() {
        let sites = markup("<!-- <va-button /> --><style>.x{} va-link {}</style><va-link text='a' href='/'/>");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "va-link");
    }

    #[test]
    fn test_too_many_sites() {
        let src = "<va-link/><va-link/><va-link/>";
        let mut s = Scanner::new(src, "va-", 2, 0, 8);
        assert!(matches!(
            s.scan_markup(0, src.len(), 0),
            Err(ExtractError::TooManySites { limit: 2 })
        ));
    }
}
