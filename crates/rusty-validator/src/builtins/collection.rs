// File: src/builtins/collection.rs
// Purpose: Checks over container elements

use super::{rule, Builtin};
use crate::field_level::FieldLevel;
use crate::value::{deep_eq, Value};

pub(super) fn rules() -> Vec<Builtin> {
    vec![rule("unique", is_unique)]
}

/// Elements (or map values) are pairwise distinct; `unique=Field` compares
/// record elements by one field
///
/// # Panics
///
/// When the field is not a container, or `Field` is not declared on an element.
fn is_unique(fl: &FieldLevel<'_>) -> bool {
    let validator = fl.validator();
    let param = fl.param();

    let values: Vec<Value<'_>> = match fl.value() {
        Value::Slice(seq) | Value::Array(seq) => (0..seq.len())
            .filter_map(|i| seq.get(i))
            .map(|elem| validator.extract(elem).value)
            .collect(),
        Value::Map(map) => map.entries().map(|(_, elem)| validator.extract(elem).value).collect(),
        _ => panic!("Bad field type {}", fl.field().type_name),
    };

    if param.is_empty() {
        return all_distinct(&values);
    }

    let keyed: Vec<Value<'_>> = values
        .iter()
        .map(|value| match value {
            Value::Struct(record) => {
                let Some(index) = record.descriptor().field_index(&param) else {
                    panic!("Bad field name {param}");
                };
                record
                    .field(index)
                    .map_or(Value::Nil, |field| validator.extract(field).value)
            }
            Value::Nil => Value::Nil,
            _ => panic!("Bad field name {param}"),
        })
        .collect();

    all_distinct(&keyed)
}

fn all_distinct(values: &[Value<'_>]) -> bool {
    values
        .iter()
        .enumerate()
        .all(|(i, a)| values[i + 1..].iter().all(|b| !deep_eq(a, b)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::validator::Validator;

    #[test]
    fn test_unique_sequences() {
        let v = Validator::new();
        assert!(v.var(&vec![1, 2, 3], "unique").is_ok());
        assert!(v.var(&vec![1, 2, 1], "unique").is_err());
        assert!(v.var(&["a".to_string(), "a".to_string()], "unique").is_err());
    }

    #[test]
    fn test_unique_map_values() {
        let v = Validator::new();
        let mut map = BTreeMap::new();
        map.insert("a", 1u8);
        map.insert("b", 1u8);
        assert!(v.var(&map, "unique").is_err());

        map.insert("b", 2u8);
        assert!(v.var(&map, "unique").is_ok());
    }

    #[test]
    #[should_panic(expected = "Bad field type")]
    fn test_unique_rejects_scalars() {
        let _ = Validator::new().var(&5u8, "unique");
    }
}
