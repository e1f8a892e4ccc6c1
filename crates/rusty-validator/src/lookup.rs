// File: src/lookup.rs
// Purpose: Resolving relative field paths such as `Inner.Items[0]`

use crate::extract::CustomTypes;
use crate::reflect::Reflect;
use crate::value::{render_key, FieldValue, Value};

/// Outcome of resolving a path against a value
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Found(FieldValue<'a>),
    /// Declared but not present: a nil wrapper on the path, an index out of
    /// range or a missing map key
    Absent,
    /// The path names something the value's shape does not declare
    Undeclared,
}

impl<'a> Lookup<'a> {
    pub fn found(self) -> Option<FieldValue<'a>> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

pub(crate) fn resolve<'a>(types: &CustomTypes, start: &'a dyn Reflect, path: &str) -> Lookup<'a> {
    let mut current = types.extract(start);
    let mut rest = path;

    loop {
        if rest.is_empty() {
            return Lookup::Found(current);
        }
        if current.is_nil() {
            return Lookup::Absent;
        }

        let next = match current.value {
            Value::Struct(record) => {
                let (name, tail) = split_field(rest);
                rest = tail;
                let Some(index) = record.descriptor().field_index(name) else {
                    return Lookup::Undeclared;
                };
                match record.field(index) {
                    Some(obj) => obj,
                    None => return Lookup::Undeclared,
                }
            }
            Value::Slice(seq) | Value::Array(seq) => {
                let Some((index, tail)) = split_index(rest) else {
                    return Lookup::Undeclared;
                };
                let Ok(index) = index.parse::<usize>() else {
                    return Lookup::Undeclared;
                };
                rest = tail;
                match seq.get(index) {
                    Some(obj) => obj,
                    None => return Lookup::Absent,
                }
            }
            Value::Map(map) => {
                let Some((key, tail)) = split_index(rest) else {
                    return Lookup::Undeclared;
                };
                rest = tail;
                let entry = map
                    .entries()
                    .find(|(k, _)| render_key(&types.extract(*k).value) == key);
                match entry {
                    Some((_, obj)) => obj,
                    None => return Lookup::Absent,
                }
            }
            _ => return Lookup::Undeclared,
        };

        current = types.extract(next);
    }
}

/// `Name.rest`, `Name[0].rest` -> (`Name`, remainder)
fn split_field(path: &str) -> (&str, &str) {
    let (mut field, mut rest) = match path.find('.') {
        Some(dot) => (&path[..dot], &path[dot + 1..]),
        None => (path, ""),
    };

    if let Some(bracket) = field.find('[') {
        field = &field[..bracket];
        rest = &path[bracket..];
    }

    (field, rest)
}

/// `[key].rest` -> (`key`, `rest`)
fn split_index(path: &str) -> Option<(&str, &str)> {
    let inner = path.strip_prefix('[')?;
    let close = inner.find(']')?;
    let tail = &inner[close + 1..];
    Some((&inner[..close], tail.strip_prefix('.').unwrap_or(tail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_split_field() {
        assert_eq!(split_field("Inner.Name"), ("Inner", "Name"));
        assert_eq!(split_field("Items[2].Name"), ("Items", "[2].Name"));
        assert_eq!(split_field("Name"), ("Name", ""));
    }

    #[test]
    fn test_split_index() {
        assert_eq!(split_index("[3].Name"), Some(("3", "Name")));
        assert_eq!(split_index("[en][0]"), Some(("en", "[0]")));
        assert_eq!(split_index("Name"), None);
    }

    #[test]
    fn test_resolve_containers() {
        let types = CustomTypes::default();
        let items = vec![vec![1i32, 2], vec![3]];

        let found = resolve(&types, &items, "[1][0]").found().unwrap();
        assert!(matches!(found.value, Value::Int(3)));
        assert!(matches!(resolve(&types, &items, "[5]"), Lookup::Absent));
        assert!(matches!(resolve(&types, &items, "[x]"), Lookup::Undeclared));

        let mut map = BTreeMap::new();
        map.insert("en".to_string(), Some(1u8));
        map.insert("fr".to_string(), None);
        assert!(resolve(&types, &map, "[en]").is_found());
        assert!(matches!(resolve(&types, &map, "[de]"), Lookup::Absent));

        let nil = resolve(&types, &map, "[fr]").found().unwrap();
        assert!(nil.is_nil());
    }

    #[test]
    fn test_resolve_through_scalar_is_undeclared() {
        let types = CustomTypes::default();
        assert!(matches!(resolve(&types, &5u8, "Inner"), Lookup::Undeclared));
        assert!(resolve(&types, &5u8, "").is_found());
    }
}
