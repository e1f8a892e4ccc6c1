// File: src/value.rs
// Purpose: Runtime value view, kinds, and structural helpers

use std::fmt;

use serde::Serialize;

use crate::reflect::{Mapping, Record, Reflect, Sequence};

/// Borrowed view of a reflected value
#[derive(Clone, Copy)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
    Slice(&'a dyn Sequence),
    Array(&'a dyn Sequence),
    Map(&'a dyn Mapping),
    Struct(&'a dyn Record),
    /// Optional wrapper; `None` is an absent value
    Indirect(Option<&'a dyn Reflect>),
    /// No kind of its own; expected to be unwrapped by a custom-type hook
    Opaque,
}

/// Runtime kind of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Invalid,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Slice,
    Array,
    Map,
    Struct,
    Ptr,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Slice => "slice",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Struct => "struct",
            Kind::Ptr => "ptr",
        };
        f.write_str(name)
    }
}

impl<'a> Value<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil | Value::Indirect(None) => Kind::Ptr,
            Value::Indirect(Some(_)) => Kind::Ptr,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::String,
            Value::Slice(_) => Kind::Slice,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Struct(_) => Kind::Struct,
            Value::Opaque => Kind::Invalid,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil | Value::Indirect(None))
    }

    /// Element count for strings (characters) and containers
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Slice(seq) | Value::Array(seq) => Some(seq.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&'a dyn Record> {
        match self {
            Value::Struct(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil | Value::Indirect(None) => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Slice(seq) => write!(f, "slice(len={})", seq.len()),
            Value::Array(seq) => write!(f, "array(len={})", seq.len()),
            Value::Map(map) => write!(f, "map(len={})", map.len()),
            Value::Struct(r) => write!(f, "{} {{..}}", r.descriptor().name),
            Value::Indirect(Some(_)) => f.write_str("&.."),
            Value::Opaque => f.write_str("opaque"),
        }
    }
}

/// A dereferenced value as seen by predicates
#[derive(Clone, Copy, Debug)]
pub struct FieldValue<'a> {
    pub value: Value<'a>,

    /// Type whose reflection produced `value`
    pub type_name: &'static str,

    /// At least one optional wrapper was removed to reach `value`
    pub nullable: bool,
}

impl<'a> FieldValue<'a> {
    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    pub fn is_nil(&self) -> bool {
        self.value.is_nil()
    }

    /// Presence test used by `required`, `omitempty` and the conditional rules
    pub fn has_value(&self) -> bool {
        if self.value.is_nil() {
            return false;
        }
        if self.nullable {
            return true;
        }
        !is_zero(&self.value)
    }
}

/// Zero value test, recursing through records and fixed arrays
pub fn is_zero(value: &Value<'_>) -> bool {
    match value {
        Value::Nil | Value::Indirect(None) => true,
        Value::Indirect(Some(_)) => false,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Uint(u) => *u == 0,
        Value::Float(x) => *x == 0.0,
        Value::Str(s) => s.is_empty(),
        Value::Slice(seq) => seq.is_empty(),
        Value::Map(map) => map.is_empty(),
        Value::Array(seq) => (0..seq.len())
            .filter_map(|i| seq.get(i))
            .all(|elem| is_zero(&elem.reflect())),
        Value::Struct(record) => {
            let fields = record.descriptor().fields.len();
            (0..fields)
                .filter_map(|i| record.field(i))
                .all(|field| is_zero(&field.reflect()))
        }
        Value::Opaque => false,
    }
}

/// Structural equality between two values of the same shape
pub fn deep_eq(a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (x, y) if x.is_nil() && y.is_nil() => true,
        (Value::Indirect(Some(x)), _) => deep_eq(&x.reflect(), b),
        (_, Value::Indirect(Some(y))) => deep_eq(a, &y.reflect()),
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Uint(x), Value::Uint(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Slice(x), Value::Slice(y)) | (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len()
                && (0..x.len()).all(|i| match (x.get(i), y.get(i)) {
                    (Some(l), Some(r)) => deep_eq(&l.reflect(), &r.reflect()),
                    _ => false,
                })
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.entries().all(|(k, v)| {
                    let key = k.reflect();
                    y.entries().any(|(k2, v2)| {
                        deep_eq(&key, &k2.reflect()) && deep_eq(&v.reflect(), &v2.reflect())
                    })
                })
        }
        (Value::Struct(x), Value::Struct(y)) => {
            let dx = x.descriptor();
            std::ptr::eq(dx, y.descriptor())
                && (0..dx.fields.len()).all(|i| match (x.field(i), y.field(i)) {
                    (Some(l), Some(r)) => deep_eq(&l.reflect(), &r.reflect()),
                    _ => false,
                })
        }
        _ => false,
    }
}

/// Text used for a map key inside a namespace segment
pub fn render_key(value: &Value<'_>) -> String {
    match value {
        Value::Str(s) => (*s).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Indirect(Some(inner)) => render_key(&inner.reflect()),
        other => format!("{other:?}"),
    }
}
