//! # rusty-validator
//!
//! Declarative validation of records, collections and single values driven by
//! tag strings such as `required,min=3,dive,email`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rusty_validator::{Validate, Validator};
//!
//! #[derive(Validate)]
//! struct User {
//!     #[validate("required")]
//!     name: String,
//!
//!     #[validate("gte=0,lte=130")]
//!     age: u8,
//!
//!     #[validate("omitempty,dive,email")]
//!     emails: Vec<String>,
//!
//!     // Left out of validation entirely
//!     #[validate(skip)]
//!     session: Session,
//! }
//!
//! let validator = Validator::new();
//! let user = User { name: String::new(), age: 135, emails: vec![], session: Session::default() };
//!
//! let err = validator.validate(&user).unwrap_err();
//! for field in err.errors().unwrap() {
//!     println!("{field}");
//! }
//! ```
//!
//! Rule strings are compiled once per record type and cached, so a single
//! [`Validator`] is meant to be built at startup and shared.

extern crate self as rusty_validator;

mod builtins;
mod cache;
mod engine;
mod extract;
mod pool;

pub mod config;
pub mod errors;
pub mod field_level;
pub mod json;
pub mod lookup;
pub mod reflect;
pub mod struct_level;
pub mod tag;
pub mod validator;
pub mod value;

pub use cache::{CompiledField, CompiledStruct};
pub use config::ValidatorConfig;
pub use errors::{FieldError, InvalidValidationError, RegisterError, ValidateError, ValidationErrors, ValueSnapshot};
pub use field_level::{FieldLevel, Predicate};
pub use lookup::Lookup;
pub use reflect::{AsAny, FieldDescriptor, Mapping, Record, RecordDescriptor, Reflect, Sequence};
pub use struct_level::{StructHook, StructLevel};
pub use tag::{Tag, TagKind};
pub use validator::{TagNameFn, Validator};
pub use value::{deep_eq, is_zero, FieldValue, Kind, Value};

pub use rusty_validator_derive::Validate;

/// Re-exports for glob import
pub mod prelude {
    pub use crate::{FieldLevel, Record, Reflect, StructLevel, Validate, ValidateError, ValidationErrors, Validator};
}
