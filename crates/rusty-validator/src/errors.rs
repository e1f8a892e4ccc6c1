//! Error types
//!
//! A validation call fails in one of two ways: the input could not be checked
//! at all ([`InvalidValidationError`]), or it was checked and broke one or more
//! rules ([`ValidationErrors`]). Broken rules written into tags (bad syntax,
//! unknown rule names, diving into a scalar) are programming errors and panic
//! instead.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::value::{FieldValue, Kind, Value};

/// Owned copy of a failing value, kept so errors outlive the input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValueSnapshot {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Sequence { len: usize },
    Map { len: usize },
    Record { type_name: String },
    Opaque,
}

impl ValueSnapshot {
    pub(crate) fn of(value: &Value<'_>) -> Self {
        match value {
            Value::Nil | Value::Indirect(None) => ValueSnapshot::Nil,
            Value::Bool(b) => ValueSnapshot::Bool(*b),
            Value::Int(i) => ValueSnapshot::Int(*i),
            Value::Uint(u) => ValueSnapshot::Uint(*u),
            Value::Float(x) => ValueSnapshot::Float(*x),
            Value::Str(s) => ValueSnapshot::Str((*s).to_string()),
            Value::Slice(seq) | Value::Array(seq) => ValueSnapshot::Sequence { len: seq.len() },
            Value::Map(map) => ValueSnapshot::Map { len: map.len() },
            Value::Struct(record) => ValueSnapshot::Record {
                type_name: record.descriptor().name.to_string(),
            },
            Value::Indirect(Some(inner)) => ValueSnapshot::of(&inner.reflect()),
            Value::Opaque => ValueSnapshot::Opaque,
        }
    }
}

/// A single rule failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub(crate) namespace: String,
    pub(crate) struct_namespace: String,
    pub(crate) field: String,
    pub(crate) struct_field: String,
    pub(crate) tag: String,
    pub(crate) actual_tag: String,
    pub(crate) kind: Kind,
    pub(crate) type_name: String,
    pub(crate) value: ValueSnapshot,
    pub(crate) param: String,
}

impl FieldError {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        namespace: String,
        struct_namespace: String,
        field: &str,
        struct_field: &str,
        tag: &str,
        actual_tag: &str,
        param: &str,
        value: &FieldValue<'_>,
    ) -> Self {
        Self {
            namespace,
            struct_namespace,
            field: field.to_string(),
            struct_field: struct_field.to_string(),
            tag: tag.to_string(),
            actual_tag: actual_tag.to_string(),
            kind: value.kind(),
            type_name: value.type_name.to_string(),
            value: ValueSnapshot::of(&value.value),
            param: param.to_string(),
        }
    }

    /// Path built from display names, e.g. `User.emails[0]`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path built from field identifiers, e.g. `User.Emails[0]`
    pub fn struct_namespace(&self) -> &str {
        &self.struct_namespace
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn struct_field(&self) -> &str {
        &self.struct_field
    }

    /// Tag as written: the alias, the OR-group text, or the rule name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Underlying rule that failed
    pub fn actual_tag(&self) -> &str {
        &self.actual_tag
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> &ValueSnapshot {
        &self.value
    }

    /// Raw rule parameter
    pub fn param(&self) -> &str {
        &self.param
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Key: '{}' Error:Field validation for '{}' failed on the '{}' tag",
            self.namespace, self.field, self.tag
        )
    }
}

impl std::error::Error for FieldError {}

/// Every failure from one call, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub(crate) Vec<FieldError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// First failure recorded at a namespace
    pub fn get(&self, namespace: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.namespace == namespace)
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// The top-level argument was not a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validator: (nil {type_name})")]
pub struct InvalidValidationError {
    pub type_name: String,
}

/// Outcome of a failed top-level call
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Invalid(#[from] InvalidValidationError),

    #[error(transparent)]
    Failed(#[from] ValidationErrors),

    #[error("validation cancelled")]
    Cancelled,
}

impl ValidateError {
    /// Rule failures, if that is what this is
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            ValidateError::Failed(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn into_errors(self) -> Option<ValidationErrors> {
        match self {
            ValidateError::Failed(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Recoverable registration mistakes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("function key cannot be empty")]
    EmptyName,

    #[error("alias tags cannot be empty for alias '{0}'")]
    EmptyAlias(String),
}
