// File: src/extract.rs
// Purpose: Indirection removal and custom-type substitution

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::reflect::Reflect;
use crate::value::{FieldValue, Value};

/// Presents an externally defined wrapper type as an inner value
pub(crate) trait CustomType: Send + Sync {
    fn extract<'a>(&self, value: &'a dyn Any) -> Option<Value<'a>>;
}

struct TypedCustomType<T> {
    func: for<'a> fn(&'a T) -> Value<'a>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Any> CustomType for TypedCustomType<T> {
    fn extract<'a>(&self, value: &'a dyn Any) -> Option<Value<'a>> {
        value.downcast_ref::<T>().map(self.func)
    }
}

/// Registered custom-type hooks keyed by type
#[derive(Clone, Default)]
pub(crate) struct CustomTypes {
    hooks: HashMap<TypeId, Arc<dyn CustomType>>,
}

impl CustomTypes {
    pub fn register<T: Any>(&mut self, func: for<'a> fn(&'a T) -> Value<'a>) {
        let hook = TypedCustomType { func, _marker: PhantomData };
        self.hooks.insert(TypeId::of::<T>(), Arc::new(hook));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Removes optional wrappers and applies custom-type hooks until a
    /// concrete value is reached
    pub fn extract<'a>(&self, mut obj: &'a dyn Reflect) -> FieldValue<'a> {
        let mut nullable = false;

        loop {
            let value = match self.hooks.get(&Any::type_id(obj.as_any())) {
                Some(hook) => hook.extract(obj.as_any()).unwrap_or(Value::Opaque),
                None => obj.reflect(),
            };

            match value {
                Value::Indirect(Some(inner)) => {
                    nullable = true;
                    obj = inner;
                }
                Value::Indirect(None) => {
                    return FieldValue { value: Value::Nil, type_name: obj.type_name(), nullable: true };
                }
                value => {
                    return FieldValue { value, type_name: obj.type_name(), nullable };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cents(i64);

    impl Reflect for Cents {
        fn reflect(&self) -> Value<'_> {
            Value::Opaque
        }
    }

    fn cents(c: &Cents) -> Value<'_> {
        Value::Int(c.0)
    }

    #[test]
    fn test_unwraps_nested_options() {
        let types = CustomTypes::default();
        let value: Option<Option<u8>> = Some(Some(3));
        let field = types.extract(&value);
        assert!(matches!(field.value, Value::Uint(3)));
        assert!(field.nullable);
        assert_eq!(field.type_name, "u8");

        let none: Option<String> = None;
        let field = types.extract(&none);
        assert!(field.is_nil());
        assert!(field.nullable);
    }

    #[test]
    fn test_custom_type_hook() {
        let mut types = CustomTypes::default();
        let plain = types.extract(&Cents(250));
        assert!(matches!(plain.value, Value::Opaque));

        types.register::<Cents>(cents);
        assert_eq!(types.len(), 1);
        let hooked = types.extract(&Some(Cents(250)));
        assert!(matches!(hooked.value, Value::Int(250)));
        assert!(hooked.nullable);
    }
}
