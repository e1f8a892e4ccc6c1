// File: src/struct_level.rs
// Purpose: Context handed to struct-level hooks

use std::any::Any;
use std::sync::Arc;

use crate::errors::{FieldError, ValidationErrors};
use crate::reflect::{Record, Reflect};
use crate::validator::Validator;

/// Hook run after a record's fields have been validated
pub type StructHook = Arc<dyn Fn(&mut StructLevel<'_>) + Send + Sync>;

pub(crate) fn struct_hook<F>(f: F) -> StructHook
where
    F: Fn(&mut StructLevel<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Access to the record being validated and to the shared error list
pub struct StructLevel<'s> {
    pub(crate) validator: &'s Validator,
    pub(crate) top: &'s dyn Reflect,
    pub(crate) parent: &'s dyn Reflect,
    pub(crate) current: &'s dyn Record,
    pub(crate) namespace: &'s str,
    pub(crate) struct_namespace: &'s str,
    pub(crate) errors: &'s mut Vec<FieldError>,
}

impl<'s> StructLevel<'s> {
    pub fn validator(&self) -> &'s Validator {
        self.validator
    }

    pub fn top(&self) -> &'s dyn Reflect {
        self.top
    }

    pub fn parent(&self) -> &'s dyn Reflect {
        self.parent
    }

    /// The record under validation, downcast to its concrete type
    pub fn current<T: Any>(&self) -> Option<&'s T> {
        let current: &'s dyn Record = self.current;
        current.as_any().downcast_ref::<T>()
    }

    pub fn current_record(&self) -> &'s dyn Record {
        self.current
    }

    /// Display namespace of the record, ending in `.`
    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn struct_namespace(&self) -> &str {
        self.struct_namespace
    }

    /// Records a failure for `field` inside the current record
    ///
    /// An empty `struct_field` defaults to `field`.
    pub fn report_error(&mut self, value: &dyn Reflect, field: &str, struct_field: &str, tag: &str, param: &str) {
        let struct_field = if struct_field.is_empty() { field } else { struct_field };
        let value = self.validator.custom_types.extract(value);

        self.errors.push(FieldError::new(
            format!("{}{}", self.namespace, field),
            format!("{}{}", self.struct_namespace, struct_field),
            field,
            struct_field,
            tag,
            tag,
            param,
            &value,
        ));
    }

    /// Appends errors from a nested validation, prefixing their namespaces
    pub fn report_validation_errors(
        &mut self,
        relative_namespace: &str,
        relative_struct_namespace: &str,
        errors: ValidationErrors,
    ) {
        for mut err in errors {
            err.namespace = format!("{}{}{}", self.namespace, relative_namespace, err.namespace);
            err.struct_namespace =
                format!("{}{}{}", self.struct_namespace, relative_struct_namespace, err.struct_namespace);
            self.errors.push(err);
        }
    }
}
