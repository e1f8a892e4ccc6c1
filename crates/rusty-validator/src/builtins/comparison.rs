// File: src/builtins/comparison.rs
// Purpose: Length, range and equality checks against a parameter

use std::cmp::Ordering;

use super::{as_float, as_int, as_len, as_uint, rule, split_params, Builtin};
use crate::field_level::FieldLevel;
use crate::value::Value;

pub(super) fn rules() -> Vec<Builtin> {
    vec![
        rule("len", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_eq)),
        rule("min", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_ge)),
        rule("max", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_le)),
        rule("gt", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_gt)),
        rule("gte", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_ge)),
        rule("lt", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_lt)),
        rule("lte", |fl: &FieldLevel<'_>| ordered(fl, Ordering::is_le)),
        rule("eq", is_eq),
        rule("ne", |fl: &FieldLevel<'_>| !is_eq(fl)),
        rule("oneof", is_one_of),
        rule("eq_ignore_case", |fl: &FieldLevel<'_>| ignore_case_eq(fl)),
        rule("ne_ignore_case", |fl: &FieldLevel<'_>| !ignore_case_eq(fl)),
    ]
}

/// # Panics
///
/// When the field kind has no ordering against a parameter.
fn bad_field(fl: &FieldLevel<'_>) -> ! {
    panic!("Bad field type {}", fl.field().type_name)
}

/// Strings by character count, containers by length, numbers by value
fn ordered(fl: &FieldLevel<'_>, accept: fn(Ordering) -> bool) -> bool {
    let param = fl.param();
    let value = fl.value();

    let ordering = match value {
        Value::Str(_) | Value::Slice(_) | Value::Array(_) | Value::Map(_) => {
            value.len().unwrap_or_default().cmp(&as_len(&param))
        }
        Value::Int(i) => i.cmp(&as_int(&param)),
        Value::Uint(u) => u.cmp(&as_uint(&param)),
        Value::Float(x) => match x.partial_cmp(&as_float(&param)) {
            Some(ordering) => ordering,
            None => return false,
        },
        _ => bad_field(fl),
    };

    accept(ordering)
}

fn is_eq(fl: &FieldLevel<'_>) -> bool {
    match fl.value() {
        Value::Str(s) => s == fl.param(),
        Value::Bool(b) => b == as_bool(&fl.param()),
        _ => ordered(fl, Ordering::is_eq),
    }
}

fn is_one_of(fl: &FieldLevel<'_>) -> bool {
    let options = split_params(&fl.param());

    match fl.value() {
        Value::Str(s) => options.iter().any(|o| o == s),
        Value::Int(i) => options.iter().any(|o| as_int(o) == i),
        Value::Uint(u) => options.iter().any(|o| as_uint(o) == u),
        _ => bad_field(fl),
    }
}

fn ignore_case_eq(fl: &FieldLevel<'_>) -> bool {
    match fl.value() {
        Value::Str(s) => s.to_lowercase() == fl.param().to_lowercase(),
        _ => bad_field(fl),
    }
}

fn as_bool(param: &str) -> bool {
    match param {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
        "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
        _ => panic!("Bad param '{param}': expected a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use crate::validator::Validator;

    #[test]
    fn test_string_length_counts_characters() {
        let v = Validator::new();
        assert!(v.var(&"héllo".to_string(), "len=5").is_ok());
        assert!(v.var(&"héllo".to_string(), "max=4").is_err());
        assert!(v.var(&"ab".to_string(), "min=3").is_err());
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let v = Validator::new();
        assert!(v.var(&135u32, "lte=130").is_err());
        assert!(v.var(&-4i32, "gt=-5").is_ok());
        assert!(v.var(&2.5f64, "gte=2.5").is_ok());
        assert!(v.var(&2.5f64, "lt=2.5").is_err());
        assert!(v.var(&16u8, "eq=0x10").is_ok());
    }

    #[test]
    fn test_containers_compare_by_length() {
        let v = Validator::new();
        assert!(v.var(&vec![1, 2, 3], "len=3").is_ok());
        assert!(v.var(&vec![1, 2, 3], "max=2").is_err());
        assert!(v.var(&[0u8; 4], "min=4").is_ok());
    }

    #[test]
    fn test_eq_and_ne() {
        let v = Validator::new();
        assert!(v.var(&"abc".to_string(), "eq=abc").is_ok());
        assert!(v.var(&"abc".to_string(), "ne=abc").is_err());
        assert!(v.var(&true, "eq=true").is_ok());
    }

    #[test]
    fn test_oneof() {
        let v = Validator::new();
        assert!(v.var(&"blue".to_string(), "oneof=red green blue").is_ok());
        assert!(v.var(&"dark blue".to_string(), "oneof='dark blue' red").is_ok());
        assert!(v.var(&"pink".to_string(), "oneof=red green").is_err());
        assert!(v.var(&7i64, "oneof=5 7 9").is_ok());
    }

    #[test]
    fn test_ignore_case() {
        let v = Validator::new();
        assert!(v.var(&"HeLLo".to_string(), "eq_ignore_case=hello").is_ok());
        assert!(v.var(&"HeLLo".to_string(), "ne_ignore_case=hello").is_err());
    }

    #[test]
    #[should_panic(expected = "Bad param 'abc'")]
    fn test_malformed_param_panics() {
        let _ = Validator::new().var(&3u8, "min=abc");
    }

    #[test]
    #[should_panic(expected = "Bad field type bool")]
    fn test_unsupported_kind_panics() {
        let _ = Validator::new().var(&true, "min=1");
    }
}
