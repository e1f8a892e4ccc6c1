// File: src/builtins/cross_field.rs
// Purpose: Comparisons against another field of the same or the top-level record

use std::cmp::Ordering;

use super::{rule, Builtin};
use crate::field_level::FieldLevel;
use crate::value::{deep_eq, FieldValue, Value};

#[derive(Clone, Copy)]
enum Scope {
    /// Path is relative to the enclosing record
    Sibling,
    /// Path is relative to the top-level value
    Top,
}

pub(super) fn rules() -> Vec<Builtin> {
    use Scope::{Sibling, Top};

    vec![
        rule("eqfield", |fl: &FieldLevel<'_>| eq_field(fl, Sibling)),
        rule("nefield", |fl: &FieldLevel<'_>| ne_field(fl, Sibling)),
        rule("gtfield", |fl: &FieldLevel<'_>| ordered_field(fl, Sibling, Ordering::is_gt)),
        rule("gtefield", |fl: &FieldLevel<'_>| ordered_field(fl, Sibling, Ordering::is_ge)),
        rule("ltfield", |fl: &FieldLevel<'_>| ordered_field(fl, Sibling, Ordering::is_lt)),
        rule("ltefield", |fl: &FieldLevel<'_>| ordered_field(fl, Sibling, Ordering::is_le)),
        rule("eqcsfield", |fl: &FieldLevel<'_>| eq_field(fl, Top)),
        rule("necsfield", |fl: &FieldLevel<'_>| ne_field(fl, Top)),
        rule("gtcsfield", |fl: &FieldLevel<'_>| ordered_field(fl, Top, Ordering::is_gt)),
        rule("gtecsfield", |fl: &FieldLevel<'_>| ordered_field(fl, Top, Ordering::is_ge)),
        rule("ltcsfield", |fl: &FieldLevel<'_>| ordered_field(fl, Top, Ordering::is_lt)),
        rule("ltecsfield", |fl: &FieldLevel<'_>| ordered_field(fl, Top, Ordering::is_le)),
        rule("fieldcontains", field_contains),
        rule("fieldexcludes", field_excludes),
    ]
}

fn target<'a>(fl: &FieldLevel<'a>, scope: Scope) -> Option<FieldValue<'a>> {
    let path = fl.param();
    match scope {
        Scope::Sibling => fl.expect_field(&path),
        Scope::Top => fl.expect_top_field(&path),
    }
}

/// Both values, when the referenced field resolves to the same kind
fn comparable<'a>(fl: &FieldLevel<'a>, scope: Scope) -> Option<(Value<'a>, Value<'a>)> {
    let other = target(fl, scope)?;
    let field = fl.field();
    (field.kind() == other.kind()).then_some((field.value, other.value))
}

fn ordering(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Uint(x), Value::Uint(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(_), Value::Str(_))
        | (Value::Slice(_), Value::Slice(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Map(_), Value::Map(_)) => Some(a.len()?.cmp(&b.len()?)),
        _ => None,
    }
}

/// Strings and records by content, containers by length, numbers by value
fn equal(a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Struct(_), Value::Struct(_)) => deep_eq(a, b),
        _ => ordering(a, b) == Some(Ordering::Equal),
    }
}

fn eq_field(fl: &FieldLevel<'_>, scope: Scope) -> bool {
    comparable(fl, scope).is_some_and(|(a, b)| equal(&a, &b))
}

fn ne_field(fl: &FieldLevel<'_>, scope: Scope) -> bool {
    comparable(fl, scope).map_or(true, |(a, b)| !equal(&a, &b))
}

fn ordered_field(fl: &FieldLevel<'_>, scope: Scope, accept: fn(Ordering) -> bool) -> bool {
    comparable(fl, scope)
        .and_then(|(a, b)| ordering(&a, &b))
        .is_some_and(accept)
}

fn field_contains(fl: &FieldLevel<'_>) -> bool {
    let Some(other) = fl.expect_field(&fl.param()) else {
        return false;
    };
    match (fl.value().as_str(), other.value.as_str()) {
        (Some(field), Some(needle)) => field.contains(needle),
        _ => false,
    }
}

fn field_excludes(fl: &FieldLevel<'_>) -> bool {
    let Some(other) = fl.expect_field(&fl.param()) else {
        return true;
    };
    match (fl.value().as_str(), other.value.as_str()) {
        (Some(field), Some(needle)) => !field.contains(needle),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::validator::Validator;

    #[test]
    fn test_map_parent_paths() {
        let v = Validator::new();
        let mut parent = BTreeMap::new();
        parent.insert("a".to_string(), 5i32);
        parent.insert("b".to_string(), 9i32);

        assert!(v.var_with_value(&5i32, &parent, "eqfield=[a]").is_ok());
        assert!(v.var_with_value(&5i32, &parent, "gtfield=[b]").is_err());
        assert!(v.var_with_value(&5i32, &parent, "ltfield=[b]").is_ok());
        assert!(v.var_with_value(&5i32, &parent, "nefield=[missing]").is_ok());
    }

    #[test]
    fn test_kind_mismatch_fails() {
        let v = Validator::new();
        let mut parent = BTreeMap::new();
        parent.insert("a".to_string(), 5u64);

        assert!(v.var_with_value(&5i32, &parent, "eqfield=[a]").is_err());
        assert!(v.var_with_value(&5i32, &parent, "nefield=[a]").is_ok());
    }
}
