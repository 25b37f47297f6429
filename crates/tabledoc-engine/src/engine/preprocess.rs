//! Formula preprocessing.
//!
//! Before a formula can be evaluated by Rhai, cell references like `A1` must
//! be transformed into function calls. This module handles:
//!
//! - **Cell references**: `A1` → `CELL(0, 0)` (numeric view, row first)
//! - **Typed references**: `@A1` → `VALUE(0, 0)` (text, number or formula result)
//! - **Range functions**: `SUM(A1:B5)` → `SUM_RANGE(0, 0, 4, 1)`
//!
//! References inside string literals are left untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use crate::builtins::{RangeFn, range_fn_re};

pub(crate) fn cell_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z]+[0-9]+)\b").expect("cell regex must compile"))
}

fn value_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z]+[0-9]+)\b").expect("value regex must compile"))
}

/// Apply `f` to every part of `script` that lies outside a double-quoted
/// string literal. Quoted parts (including their quotes) are copied verbatim.
pub(crate) fn map_outside_strings(script: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(script.len());
    let mut segment_start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in script.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                out.push_str(&script[segment_start..=i]);
                segment_start = i + 1;
            }
        } else if ch == '"' {
            out.push_str(&f(&script[segment_start..i]));
            segment_start = i;
            in_string = true;
        }
    }

    let rest = &script[segment_start..];
    if in_string {
        // Unterminated literal; let Rhai report it.
        out.push_str(rest);
    } else {
        out.push_str(&f(rest));
    }
    out
}

fn rewrite_ranges(segment: &str) -> String {
    range_fn_re()
        .replace_all(segment, |caps: &Captures| {
            let (Some(start), Some(end), Some(rhai_name)) = (
                CellRef::parse(&caps[2]),
                CellRef::parse(&caps[3]),
                RangeFn::from_sheet_name(&caps[1]).map(RangeFn::rhai_name),
            ) else {
                return caps[0].to_string();
            };
            format!(
                "{}({}, {}, {}, {})",
                rhai_name,
                start.row.min(end.row),
                start.col.min(end.col),
                start.row.max(end.row),
                start.col.max(end.col)
            )
        })
        .into_owned()
}

fn rewrite_refs(segment: &str, re: &Regex, func: &str) -> String {
    re.replace_all(segment, |caps: &Captures| match CellRef::parse(&caps[1]) {
        Some(cell) => format!("{}({}, {})", func, cell.row, cell.col),
        None => caps[0].to_string(),
    })
    .into_owned()
}

/// Rewrite a formula body (without the leading `=`) into evaluable Rhai.
pub fn preprocess_formula(formula: &str) -> String {
    map_outside_strings(formula, |segment| {
        let segment = rewrite_ranges(segment);
        let segment = rewrite_refs(&segment, value_token_re(), "VALUE");
        rewrite_refs(&segment, cell_token_re(), "CELL")
    })
}
