//! Byte-level helpers shared by the scanner and the expression classifier.
//!
//! All positions are byte offsets into the same source string and every
//! returned position lands on an ASCII byte (or the region end), so callers
//! may slice the source at it.

pub(super) fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c >= 0x80
}

pub(super) fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

pub(super) fn skip_ws(b: &[u8], mut i: usize, to: usize) -> usize {
    while i < to && b[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// End of the identifier starting at `i`.
pub(super) fn ident_end(b: &[u8], mut i: usize, to: usize) -> usize {
    while i < to && is_ident_char(b[i]) {
        i += 1;
    }
    i
}

/// Skip a `'` or `"` string starting at `i`. Returns the position after the
/// closing quote. A newline ends the string early so that a stray apostrophe
/// in JSX text only swallows the rest of its line.
pub(super) fn skip_string(b: &[u8], i: usize, to: usize) -> usize {
    let quote = b[i];
    let mut j = i + 1;
    while j < to {
        match b[j] {
            b'\\' => j += 2,
            b'\n' => return j,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    to
}

pub(super) fn skip_line_comment(b: &[u8], i: usize, to: usize) -> usize {
    let mut j = i;
    while j < to && b[j] != b'\n' {
        j += 1;
    }
    j
}

pub(super) fn skip_block_comment(b: &[u8], i: usize, to: usize) -> usize {
    let mut j = i + 2;
    while j + 1 < to {
        if b[j] == b'*' && b[j + 1] == b'/' {
            return j + 2;
        }
        j += 1;
    }
    to
}

/// True when `b[i..]` starts a `//` or `/*` comment.
pub(super) fn comment_at(b: &[u8], i: usize, to: usize) -> Option<usize> {
    if i + 1 >= to || b[i] != b'/' {
        return None;
    }
    match b[i + 1] {
        b'/' => Some(skip_line_comment(b, i, to)),
        b'*' => Some(skip_block_comment(b, i, to)),
        _ => None,
    }
}

/// Keywords after which an expression begins.
const EXPR_KEYWORDS: &[&[u8]] = &[
    b"return", b"yield", b"await", b"default", b"case", b"else", b"in", b"of", b"typeof",
    b"void", b"do",
];

/// Last non-whitespace byte before `at`, not looking below `from`.
fn prev_significant(b: &[u8], from: usize, at: usize) -> Option<(usize, u8)> {
    let mut k = at;
    while k > from && b[k - 1].is_ascii_whitespace() {
        k -= 1;
    }
    (k > from).then(|| (k - 1, b[k - 1]))
}

/// Whether an expression may begin at `at`, judged by the code before it.
/// Anything that ends an operand (an identifier other than a keyword, a
/// closing paren or bracket, a string, a member dot) rules it out.
pub(super) fn expr_position(b: &[u8], from: usize, at: usize) -> bool {
    let Some((k, prev)) = prev_significant(b, from, at) else {
        return true;
    };
    if is_ident_char(prev) {
        let mut s = k;
        while s > from && is_ident_char(b[s - 1]) {
            s -= 1;
        }
        return EXPR_KEYWORDS.contains(&&b[s..=k]);
    }
    !matches!(prev, b')' | b']' | b'.' | b'\'' | b'"' | b'`')
}

/// Skip a regex literal whose opening `/` is at `i`. Returns the position
/// after its flags, or `i + 1` when the line ends before the closing `/`.
pub(super) fn skip_regex(b: &[u8], i: usize, to: usize) -> usize {
    let mut j = i + 1;
    let mut class = false;
    while j < to {
        match b[j] {
            b'\\' => j += 2,
            b'\n' => return i + 1,
            b'[' => {
                class = true;
                j += 1;
            }
            b']' => {
                class = false;
                j += 1;
            }
            b'/' if !class => return ident_end(b, j + 1, to),
            _ => j += 1,
        }
    }
    i + 1
}

/// End of the regex literal starting at `i`, when the `/` there opens one.
///
/// `/>` and `</` belong to JSX tags and never start a literal.
pub(super) fn regex_at(b: &[u8], from: usize, i: usize, to: usize) -> Option<usize> {
    if b[i] != b'/' || i + 1 >= to || matches!(b[i + 1], b'/' | b'*' | b'>') {
        return None;
    }
    if matches!(prev_significant(b, from, i), Some((_, b'<'))) || !expr_position(b, from, i) {
        return None;
    }
    let end = skip_regex(b, i, to);
    (end > i + 1).then_some(end)
}

#[derive(Clone, Copy, PartialEq)]
enum Ctx {
    /// Code expecting the given closing bracket.
    Code(u8),
    Template,
}

/// Position of the bracket (or backtick) closing the one at `open`.
///
/// Strings, comments, regex literals and template literals (with `${}`
/// nesting) are skipped.
/// A mismatched closer pops back to the nearest matching context, or is
/// ignored when none is open.
pub(super) fn find_close(b: &[u8], open: usize, to: usize) -> Option<usize> {
    let first = match b.get(open)? {
        b'{' => Ctx::Code(b'}'),
        b'(' => Ctx::Code(b')'),
        b'[' => Ctx::Code(b']'),
        b'`' => Ctx::Template,
        _ => return None,
    };
    let mut stack = vec![first];
    let mut i = open + 1;
    while i < to {
        let top = *stack.last()?;
        match top {
            Ctx::Template => match b[i] {
                b'\\' => i += 2,
                b'`' => {
                    stack.pop();
                    if stack.is_empty() {
                        return Some(i);
                    }
                    i += 1;
                }
                b'$' if i + 1 < to && b[i + 1] == b'{' => {
                    stack.push(Ctx::Code(b'}'));
                    i += 2;
                }
                _ => i += 1,
            },
            Ctx::Code(_) => {
                if let Some(next) = comment_at(b, i, to) {
                    i = next;
                    continue;
                }
                if let Some(next) = regex_at(b, open + 1, i, to) {
                    i = next;
                    continue;
                }
                match b[i] {
                    b'\'' | b'"' => {
                        i = skip_string(b, i, to);
                        continue;
                    }
                    b'`' => stack.push(Ctx::Template),
                    b'{' => stack.push(Ctx::Code(b'}')),
                    b'(' => stack.push(Ctx::Code(b')')),
                    b'[' => stack.push(Ctx::Code(b']')),
                    c @ (b'}' | b')' | b']') => {
                        if let Some(k) = stack.iter().rposition(|x| *x == Ctx::Code(c)) {
                            stack.truncate(k);
                            if stack.is_empty() {
                                return Some(i);
                            }
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        }
    }
    None
}

/// Split `text` at top-level occurrences of `sep`, ignoring separators
/// inside brackets, strings, comments and template literals.
pub(super) fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let b = text.as_bytes();
    let to = b.len();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < to {
        if let Some(next) = comment_at(b, i, to) {
            i = next;
            continue;
        }
        match b[i] {
            b'\'' | b'"' => i = skip_string(b, i, to),
            b'{' | b'(' | b'[' | b'`' => i = find_close(b, i, to).map_or(to, |e| e + 1),
            c if c == sep => {
                parts.push(&text[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(s: &str) -> Option<usize> {
        find_close(s.as_bytes(), 0, s.len())
    }

    #[test]
    fn test_find_close_skips_strings_and_templates() {
        assert_eq!(close("{a}"), Some(2));
        assert_eq!(close("{ '}' }"), Some(6));
        assert_eq!(close("{ `x ${ {y} } }` }"), Some(17));
        assert_eq!(close("{ /* } */ }"), Some(10));
        assert_eq!(close("{ a "), None);
    }

    #[test]
    fn test_string_ends_at_newline() {
        let s = "'don\nt'";
        assert_eq!(skip_string(s.as_bytes(), 0, s.len()), 4);
    }

    #[test]
    fn test_mismatched_closer_recovers() {
        // the stray `)` closes nothing and is ignored
        assert_eq!(close("{ ) }"), Some(4));
        // `}` pops the unclosed `(`
        assert_eq!(close("{ ( }"), Some(4));
    }

    #[test]
    fn test_regex_literals_are_skipped() {
        assert_eq!(close("{ /}/ }"), Some(6));
        assert_eq!(close("{ s.split(/`/g) }"), Some(16));
        assert_eq!(close("{ /[/}]/.test(x) }"), Some(17));
        // division, not a literal
        assert_eq!(close("{ (a) / 2 }"), Some(10));
        assert_eq!(close("{ a / b }"), Some(8));
    }

    #[test]
    fn test_regex_never_starts_at_jsx_slashes() {
        let s = b"<a></a> <b {...p} />";
        assert_eq!(regex_at(s, 0, 4, s.len()), None);
        assert_eq!(regex_at(s, 0, 18, s.len()), None);
        let r = b"x = /a b/i;";
        assert_eq!(regex_at(r, 0, 4, r.len()), Some(10));
        let n = b"/ab\ncd/";
        assert_eq!(skip_regex(n, 0, n.len()), 1);
    }

    #[test]
    fn test_split_top_level() {
        let parts = split_top_level("a: 1, b: f(1, 2), c: '1,2'", b',');
        assert_eq!(parts, vec!["a: 1", " b: f(1, 2)", " c: '1,2'"]);
    }
}
