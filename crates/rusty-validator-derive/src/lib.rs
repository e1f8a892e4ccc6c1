// rusty-validator procedural macros
// Generates the reflection tables the validation engine walks

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod validation;

/// Derives `Reflect` and `Record` for a struct with named fields
///
/// # Attributes
///
/// - `#[validate("rules")]` - rule string recorded under the `validate` key
/// - `#[validate(key = "value")]` - rule string under any other key, e.g.
///   `#[validate(binding = "required")]` for `Validator::set_tag_name("binding")`
/// - `#[serde(rename = "...")]` - captured under the `serde` key so a tag name
///   hook can report serialization names
///
/// # Example
///
/// ```ignore
/// #[derive(Validate)]
/// struct Signup {
///     #[validate("required,email")]
///     email: String,
///
///     #[validate("omitempty,min=8")]
///     password: Option<String>,
/// }
/// ```
#[proc_macro_derive(Validate, attributes(validate))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    validation::impl_validate(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
