// File: src/field_level.rs
// Purpose: Context handed to predicates

use std::borrow::Cow;
use std::sync::Arc;

use crate::lookup::{resolve, Lookup};
use crate::reflect::Reflect;
use crate::tag::{decode_param, Tag};
use crate::validator::Validator;
use crate::value::{FieldValue, Value};

/// A validation rule: `true` when the field satisfies it
pub type Predicate = Arc<dyn Fn(&FieldLevel<'_>) -> bool + Send + Sync>;

/// Everything a predicate may inspect about the field under test
pub struct FieldLevel<'a> {
    pub(crate) validator: &'a Validator,
    pub(crate) top: &'a dyn Reflect,
    pub(crate) parent: &'a dyn Reflect,
    pub(crate) field: FieldValue<'a>,
    pub(crate) tag: &'a Tag,
    pub(crate) field_name: &'a str,
    pub(crate) struct_field_name: &'a str,
}

impl<'a> FieldLevel<'a> {
    pub fn validator(&self) -> &'a Validator {
        self.validator
    }

    /// Value passed to the top-level call
    pub fn top(&self) -> &'a dyn Reflect {
        self.top
    }

    /// Record enclosing the field
    pub fn parent(&self) -> &'a dyn Reflect {
        self.parent
    }

    pub fn field(&self) -> FieldValue<'a> {
        self.field
    }

    pub fn value(&self) -> Value<'a> {
        self.field.value
    }

    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    pub fn struct_field_name(&self) -> &'a str {
        self.struct_field_name
    }

    /// Rule name being evaluated
    pub fn tag(&self) -> &'a str {
        &self.tag.name
    }

    /// Parameter with `0x2C` and `0x7C` decoded
    pub fn param(&self) -> Cow<'a, str> {
        decode_param(&self.tag.param)
    }

    pub fn raw_param(&self) -> &'a str {
        &self.tag.param
    }

    pub fn has_value(&self) -> bool {
        self.field.has_value()
    }

    /// Resolves `path` relative to the enclosing record
    pub fn lookup(&self, path: &str) -> Lookup<'a> {
        resolve(&self.validator.custom_types, self.parent, path)
    }

    /// Resolves `path` relative to the top-level value
    pub fn lookup_from_top(&self, path: &str) -> Lookup<'a> {
        resolve(&self.validator.custom_types, self.top, path)
    }

    /// Like [`lookup`](Self::lookup), but a path the record does not declare
    /// is a programming error
    ///
    /// # Panics
    ///
    /// When `path` is not declared on the enclosing record.
    pub fn expect_field(&self, path: &str) -> Option<FieldValue<'a>> {
        self.expect(self.lookup(path), path)
    }

    /// Like [`lookup_from_top`](Self::lookup_from_top), panicking on
    /// undeclared paths
    pub fn expect_top_field(&self, path: &str) -> Option<FieldValue<'a>> {
        self.expect(self.lookup_from_top(path), path)
    }

    fn expect(&self, lookup: Lookup<'a>, path: &str) -> Option<FieldValue<'a>> {
        match lookup {
            Lookup::Found(value) => Some(value),
            Lookup::Absent => None,
            Lookup::Undeclared => panic!(
                "Field '{}' referenced by tag '{}' on field '{}' is not declared",
                path,
                self.tag(),
                self.struct_field_name
            ),
        }
    }
}
