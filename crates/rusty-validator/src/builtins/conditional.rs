// File: src/builtins/conditional.rs
// Purpose: Presence rules conditioned on sibling fields
//
// Every rule here is evaluated even when the field is nil.

use super::{as_float, as_int, as_len, as_uint, rule_on_nil, split_params, Builtin};
use crate::field_level::FieldLevel;
use crate::lookup::Lookup;
use crate::value::Value;

pub(super) fn rules() -> Vec<Builtin> {
    vec![
        rule_on_nil("required_if", required_if),
        rule_on_nil("required_unless", required_unless),
        rule_on_nil("required_with", required_with),
        rule_on_nil("required_with_all", required_with_all),
        rule_on_nil("required_without", required_without),
        rule_on_nil("required_without_all", required_without_all),
        rule_on_nil("excluded_if", excluded_if),
        rule_on_nil("excluded_unless", excluded_unless),
        rule_on_nil("excluded_with", excluded_with),
        rule_on_nil("excluded_with_all", excluded_with_all),
        rule_on_nil("excluded_without", excluded_without),
        rule_on_nil("excluded_without_all", excluded_without_all),
    ]
}

/// `Field value` pairs from the parameter
///
/// # Panics
///
/// When the parameter holds an odd number of items.
fn pairs(fl: &FieldLevel<'_>) -> Vec<(String, String)> {
    let params = split_params(&fl.param());
    if params.len() % 2 != 0 {
        panic!("Bad param number for {} {}", fl.tag(), fl.field_name());
    }

    params
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Sibling `path` holds `expected`; an unresolvable path never matches
fn field_equals(fl: &FieldLevel<'_>, path: &str, expected: &str) -> bool {
    let Some(field) = fl.lookup(path).found() else {
        return false;
    };

    match field.value {
        Value::Nil | Value::Indirect(None) => expected == "nil",
        Value::Int(i) => i == as_int(expected),
        Value::Uint(u) => u == as_uint(expected),
        Value::Float(x) => x == as_float(expected),
        Value::Bool(b) => b == (expected == "true"),
        Value::Str(s) => s == expected,
        Value::Slice(_) | Value::Array(_) | Value::Map(_) => field.value.len() == Some(as_len(expected)),
        _ => false,
    }
}

/// Sibling `path` is nil, zero or cannot be resolved
fn field_is_empty(fl: &FieldLevel<'_>, path: &str) -> bool {
    match fl.lookup(path) {
        Lookup::Found(field) => !field.has_value(),
        Lookup::Absent | Lookup::Undeclared => true,
    }
}

fn required_if(fl: &FieldLevel<'_>) -> bool {
    if pairs(fl).iter().all(|(path, expected)| field_equals(fl, path, expected)) {
        fl.has_value()
    } else {
        true
    }
}

fn required_unless(fl: &FieldLevel<'_>) -> bool {
    if pairs(fl).iter().any(|(path, expected)| field_equals(fl, path, expected)) {
        true
    } else {
        fl.has_value()
    }
}

fn excluded_if(fl: &FieldLevel<'_>) -> bool {
    if pairs(fl).iter().all(|(path, expected)| field_equals(fl, path, expected)) {
        !fl.has_value()
    } else {
        true
    }
}

fn excluded_unless(fl: &FieldLevel<'_>) -> bool {
    if pairs(fl).iter().all(|(path, expected)| field_equals(fl, path, expected)) {
        true
    } else {
        !fl.has_value()
    }
}

fn fields(fl: &FieldLevel<'_>) -> Vec<String> {
    split_params(&fl.param())
}

fn required_with(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().any(|path| !field_is_empty(fl, path)) {
        fl.has_value()
    } else {
        true
    }
}

fn required_with_all(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().all(|path| !field_is_empty(fl, path)) {
        fl.has_value()
    } else {
        true
    }
}

fn required_without(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().any(|path| field_is_empty(fl, path)) {
        fl.has_value()
    } else {
        true
    }
}

fn required_without_all(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().all(|path| field_is_empty(fl, path)) {
        fl.has_value()
    } else {
        true
    }
}

fn excluded_with(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().any(|path| !field_is_empty(fl, path)) {
        !fl.has_value()
    } else {
        true
    }
}

fn excluded_with_all(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().all(|path| !field_is_empty(fl, path)) {
        !fl.has_value()
    } else {
        true
    }
}

fn excluded_without(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().any(|path| field_is_empty(fl, path)) {
        !fl.has_value()
    } else {
        true
    }
}

fn excluded_without_all(fl: &FieldLevel<'_>) -> bool {
    if fields(fl).iter().all(|path| field_is_empty(fl, path)) {
        !fl.has_value()
    } else {
        true
    }
}
