// File: src/reflect.rs
// Purpose: Reflection capability traits and std implementations

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::sync::Arc;

use crate::value::Value;

/// Type-erased access shared by every reflected type
///
/// Blanket-implemented for all `'static` types, so `&dyn Reflect` can always be
/// downcast and named.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value the engine can walk
///
/// Implemented for std scalars and containers here, and for records by
/// `#[derive(Validate)]`.
pub trait Reflect: AsAny {
    fn reflect(&self) -> Value<'_>;
}

/// Ordered sequence view (slices, vectors, arrays)
pub trait Sequence {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Associative container view
pub trait Mapping {
    fn len(&self) -> usize;

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record with named fields
///
/// Generated by `#[derive(Validate)]`; the descriptor is a static table built at
/// compile time.
pub trait Record: Reflect {
    fn descriptor(&self) -> &'static RecordDescriptor;

    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    fn as_reflect(&self) -> &dyn Reflect;
}

/// Static description of a record type
#[derive(Debug)]
pub struct RecordDescriptor {
    /// Type identifier as written in source
    pub name: &'static str,

    /// Fields in declaration order
    pub fields: &'static [FieldDescriptor],
}

impl RecordDescriptor {
    /// [`Record::field`] index of a field by its structural name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.index)
    }
}

/// Static description of one record field
#[derive(Debug)]
pub struct FieldDescriptor {
    /// Field identifier
    pub name: &'static str,

    /// Position passed to [`Record::field`]
    pub index: usize,

    /// Tag entries as `(key, value)` pairs, e.g. `("validate", "required")`
    pub tags: &'static [(&'static str, &'static str)],

    /// Declared type is `Option<...>`
    pub indirect: bool,
}

impl FieldDescriptor {
    /// First tag value recorded under `key`
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

macro_rules! reflect_int {
    ($($ty:ty),*) => {
        $(impl Reflect for $ty {
            fn reflect(&self) -> Value<'_> {
                Value::Int(*self as i64)
            }
        })*
    };
}

macro_rules! reflect_uint {
    ($($ty:ty),*) => {
        $(impl Reflect for $ty {
            fn reflect(&self) -> Value<'_> {
                Value::Uint(*self as u64)
            }
        })*
    };
}

reflect_int!(i8, i16, i32, i64, isize);
reflect_uint!(u8, u16, u32, u64, usize);

impl Reflect for f32 {
    fn reflect(&self) -> Value<'_> {
        Value::Float(f64::from(*self))
    }
}

impl Reflect for f64 {
    fn reflect(&self) -> Value<'_> {
        Value::Float(*self)
    }
}

impl Reflect for bool {
    fn reflect(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl Reflect for String {
    fn reflect(&self) -> Value<'_> {
        Value::Str(self)
    }
}

impl Reflect for &'static str {
    fn reflect(&self) -> Value<'_> {
        Value::Str(self)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> Value<'_> {
        Value::Indirect(self.as_ref().map(|v| v as &dyn Reflect))
    }
}

// Boxes and shared pointers are never absent, so they are transparent.
impl<T: Reflect> Reflect for Box<T> {
    fn reflect(&self) -> Value<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn reflect(&self) -> Value<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> Value<'_> {
        Value::Slice(self)
    }
}

impl<T: Reflect> Sequence for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        VecDeque::get(self, index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(&self) -> Value<'_> {
        Value::Slice(self)
    }
}

impl<T: Reflect, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(&self) -> Value<'_> {
        Value::Array(self)
    }
}

impl<K: Reflect, V: Reflect, S: BuildHasher + 'static> Mapping for HashMap<K, V, S> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
        )
    }
}

impl<K: Reflect, V: Reflect, S: BuildHasher + 'static> Reflect for HashMap<K, V, S> {
    fn reflect(&self) -> Value<'_> {
        Value::Map(self)
    }
}

impl<K: Reflect, V: Reflect> Mapping for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
        )
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(&self) -> Value<'_> {
        Value::Map(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    #[test]
    fn test_scalar_kinds() {
        assert_eq!(7u8.reflect().kind(), Kind::Uint);
        assert_eq!((-3i32).reflect().kind(), Kind::Int);
        assert_eq!(1.5f32.reflect().kind(), Kind::Float);
        assert_eq!(String::from("x").reflect().kind(), Kind::String);
        assert_eq!(true.reflect().kind(), Kind::Bool);
    }

    #[test]
    fn test_option_is_indirect() {
        let none: Option<i32> = None;
        assert!(matches!(none.reflect(), Value::Indirect(None)));

        let some = Some(4i32);
        match some.reflect() {
            Value::Indirect(Some(inner)) => assert!(matches!(inner.reflect(), Value::Int(4))),
            _ => panic!("expected indirection"),
        }
    }

    #[test]
    fn test_box_is_transparent() {
        let boxed = Box::new(9u16);
        assert!(matches!(boxed.reflect(), Value::Uint(9)));
    }

    #[test]
    fn test_containers() {
        let v = vec![1i64, 2, 3];
        match v.reflect() {
            Value::Slice(seq) => {
                assert_eq!(seq.len(), 3);
                assert!(seq.get(3).is_none());
            }
            _ => panic!("expected slice"),
        }

        let arr = [0u8; 4];
        assert_eq!(arr.reflect().kind(), Kind::Array);

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1i32);
        match map.reflect() {
            Value::Map(m) => assert_eq!(m.entries().count(), 1),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_type_name_through_dyn() {
        let value = 3u32;
        let erased: &dyn Reflect = &value;
        assert_eq!(erased.type_name(), "u32");
        assert!(erased.as_any().downcast_ref::<u32>().is_some());
    }
}
