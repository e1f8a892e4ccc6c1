// File: src/builtins/string.rs
// Purpose: Character class and substring checks

use once_cell::sync::Lazy;
use regex::Regex;

use super::{rule, Builtin};
use crate::field_level::FieldLevel;
use crate::value::Value;

static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static ALPHANUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static ALPHA_UNICODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{L}+$").unwrap());
static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").unwrap());
static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static HEXADECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0[xX])?[0-9a-fA-F]+$").unwrap());

pub(super) fn rules() -> Vec<Builtin> {
    vec![
        rule("alpha", |fl: &FieldLevel<'_>| text(fl, |s| ALPHA_REGEX.is_match(s))),
        rule("alphanum", |fl: &FieldLevel<'_>| text(fl, |s| ALPHANUM_REGEX.is_match(s))),
        rule("alphaunicode", |fl: &FieldLevel<'_>| text(fl, |s| ALPHA_UNICODE_REGEX.is_match(s))),
        rule("numeric", is_numeric),
        rule("number", is_number),
        rule("hexadecimal", |fl: &FieldLevel<'_>| text(fl, |s| HEXADECIMAL_REGEX.is_match(s))),
        rule("lowercase", |fl: &FieldLevel<'_>| text(fl, |s| !s.is_empty() && s == s.to_lowercase())),
        rule("uppercase", |fl: &FieldLevel<'_>| text(fl, |s| !s.is_empty() && s == s.to_uppercase())),
        rule("ascii", |fl: &FieldLevel<'_>| text(fl, |s| s.is_ascii())),
        rule("printascii", |fl: &FieldLevel<'_>| text(fl, |s| s.bytes().all(|b| (0x20..=0x7e).contains(&b)))),
        rule("boolean", is_boolean),
        rule("contains", |fl: &FieldLevel<'_>| text(fl, |s| s.contains(&*fl.param()))),
        rule("containsany", |fl: &FieldLevel<'_>| text(fl, |s| contains_any(s, &fl.param()))),
        rule("containsrune", |fl: &FieldLevel<'_>| text(fl, |s| contains_rune(s, &fl.param()))),
        rule("excludes", |fl: &FieldLevel<'_>| text(fl, |s| !s.contains(&*fl.param()))),
        rule("excludesall", |fl: &FieldLevel<'_>| text(fl, |s| !contains_any(s, &fl.param()))),
        rule("excludesrune", |fl: &FieldLevel<'_>| text(fl, |s| !contains_rune(s, &fl.param()))),
        rule("startswith", |fl: &FieldLevel<'_>| text(fl, |s| s.starts_with(&*fl.param()))),
        rule("endswith", |fl: &FieldLevel<'_>| text(fl, |s| s.ends_with(&*fl.param()))),
        rule("startsnotwith", |fl: &FieldLevel<'_>| text(fl, |s| !s.starts_with(&*fl.param()))),
        rule("endsnotwith", |fl: &FieldLevel<'_>| text(fl, |s| !s.ends_with(&*fl.param()))),
    ]
}

/// Applies `check` to string fields; any other kind fails
pub(super) fn text(fl: &FieldLevel<'_>, check: impl Fn(&str) -> bool) -> bool {
    fl.value().as_str().is_some_and(check)
}

fn contains_any(s: &str, chars: &str) -> bool {
    s.chars().any(|c| chars.contains(c))
}

fn contains_rune(s: &str, param: &str) -> bool {
    param.chars().next().is_some_and(|r| s.contains(r))
}

/// Numbers always pass; strings must hold a decimal number
fn is_numeric(fl: &FieldLevel<'_>) -> bool {
    match fl.value() {
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => true,
        Value::Str(s) => NUMERIC_REGEX.is_match(s),
        _ => false,
    }
}

fn is_number(fl: &FieldLevel<'_>) -> bool {
    match fl.value() {
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => true,
        Value::Str(s) => NUMBER_REGEX.is_match(s),
        _ => false,
    }
}

fn is_boolean(fl: &FieldLevel<'_>) -> bool {
    match fl.value() {
        Value::Bool(_) => true,
        Value::Str(s) => matches!(s, "1" | "t" | "T" | "TRUE" | "true" | "True" | "0" | "f" | "F" | "FALSE" | "false" | "False"),
        _ => false,
    }
}
