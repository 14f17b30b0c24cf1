//! Dependency extraction from formula strings.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `$B$2`,
//! `B2:C5`) that the formula depends on. This is used to build the
//! dependency graph for propagation and cycle detection.
//!
//! Matching is token-aware: `A1` is only found where it stands as a whole
//! reference, so a formula mentioning `A10` or `XA1` does not depend on `A1`.
//! References inside string literals are ignored.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::range::CellRange;

const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Single reference token, capturing anchors separately.
///
/// Captures: `cabs` (`$` or empty), `col`, `rabs`, `row`.
pub(crate) fn cell_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?<cabs>\$?)(?<col>[A-Z]+)(?<rabs>\$?)(?<row>[0-9]+)\b")
            .expect("cell token regex must compile")
    })
}

/// A reference optionally followed by `:` and a second reference.
fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\$?[A-Z]+\$?[0-9]+)\b(?:\s*:\s*(\$?[A-Z]+\$?[0-9]+)\b)?")
            .expect("dependency reference regex must compile")
    })
}

/// True if a token starting at byte `start` is not glued to a preceding
/// identifier or number (so `fooA1`, `1.5E3` and `log10` never count).
pub(crate) fn at_token_start(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'))
}

/// Extract all cell references from a formula as dependencies, in order of
/// first appearance, without duplicates. Text that does not start with `=`
/// is a literal and has none.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let Some(body) = formula.strip_prefix('=') else {
        return Vec::new();
    };
    let body = strip_string_literals(body);

    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    let mut push = |cell: CellRef| {
        if seen.insert(cell.clone()) {
            deps.push(cell);
        }
    };

    for caps in reference_re().captures_iter(&body) {
        let whole = caps.get(0).expect("group 0 always present");
        if !at_token_start(&body, whole.start()) {
            continue;
        }
        let Ok(start) = CellRef::parse(&caps[1]) else {
            continue;
        };
        match caps.get(2).map(|m| CellRef::parse(m.as_str())) {
            Some(Ok(end)) => {
                let range = CellRange::new(start, end);
                match range.cell_count() {
                    Some(n) if n <= MAX_DEPENDENCY_RANGE_CELLS => range.iter().for_each(&mut push),
                    _ => log::warn!(
                        "range {}:{} too large to track as dependencies",
                        range.start,
                        range.end
                    ),
                }
            }
            Some(Err(_)) | None => push(start),
        }
    }

    deps
}

/// Blank out the contents of `"..."` literals, keeping byte offsets intact.
pub(crate) fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in script.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push_str(&" ".repeat(ch.len_utf8()));
                continue;
            }
            if ch == '\\' {
                escaped = true;
                out.push(' ');
                continue;
            }
            if ch == '"' {
                in_string = false;
                out.push('"');
            } else {
                out.push_str(&" ".repeat(ch.len_utf8()));
            }
        } else if ch == '"' {
            in_string = true;
            out.push('"');
        } else {
            out.push(ch);
        }
    }

    out
}

/// Apply `f` to every stretch of `script` outside string literals.
pub(crate) fn map_outside_strings<F>(script: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut seg_start = 0;
    let mut in_string = false;
    let mut backslashes = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                continue;
            }
            if b == b'"' && backslashes.is_multiple_of(2) {
                out.push_str(&script[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            continue;
        }

        if b == b'"' {
            out.push_str(&f(&script[seg_start..i]));
            in_string = true;
            seg_start = i;
            backslashes = 0;
        }
    }

    if seg_start < script.len() {
        if in_string {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&f(&script[seg_start..]));
        }
    }

    out
}
