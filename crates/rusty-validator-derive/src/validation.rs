// File: rusty-validator-derive/src/validation.rs
// Purpose: Validate derive and field attribute processing

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{parse_quote, Data, DeriveInput, Expr, Fields, GenericParam, Ident, LitStr, Token};

/// Tag key used by a bare `#[validate("...")]`
const DEFAULT_TAG_KEY: &str = "validate";

/// One entry inside `#[validate(...)]`
enum TagEntry {
    Rules(LitStr),
    Keyed(Ident, LitStr),
    Skip,
}

impl Parse for TagEntry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(TagEntry::Rules(input.parse()?));
        }

        let key = input.call(Ident::parse_any)?;
        if key == "skip" && !input.peek(Token![=]) {
            return Ok(TagEntry::Skip);
        }
        input.parse::<Token![=]>()?;
        Ok(TagEntry::Keyed(key, input.parse()?))
    }
}

/// Tag pairs collected from a field's attributes
#[derive(Debug, Default, PartialEq)]
struct FieldTags {
    pairs: Vec<(String, String)>,
    skip: bool,
}

/// Collect `(key, value)` tag pairs from a field's attributes, in order
fn extract_tags(attrs: &[syn::Attribute]) -> syn::Result<FieldTags> {
    let mut tags = FieldTags::default();

    for attr in attrs {
        if attr.path().is_ident("validate") {
            let entries = attr.parse_args_with(Punctuated::<TagEntry, Token![,]>::parse_terminated)?;
            for entry in entries {
                match entry {
                    TagEntry::Rules(rules) => tags.pairs.push((DEFAULT_TAG_KEY.to_string(), rules.value())),
                    TagEntry::Keyed(key, value) => tags.pairs.push((key.unraw().to_string(), value.value())),
                    TagEntry::Skip => tags.skip = true,
                }
            }
        } else if attr.path().is_ident("serde") {
            if let Some(rename) = serde_rename(attr) {
                tags.pairs.push(("serde".to_string(), rename));
            }
        }
    }

    Ok(tags)
}

/// `rename = "..."` from a serde attribute; other serde options are skipped
fn serde_rename(attr: &syn::Attribute) -> Option<String> {
    let mut rename = None;

    let _ = attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
            let value: LitStr = meta.value()?.parse()?;
            rename = Some(value.value());
        } else if meta.input.peek(Token![=]) {
            meta.value()?.parse::<Expr>()?;
        } else if meta.input.peek(syn::token::Paren) {
            let content;
            syn::parenthesized!(content in meta.input);
            content.parse::<TokenStream>()?;
        }
        Ok(())
    });

    rename
}

/// Check if a type is Option<T>
fn is_option_type(ty: &syn::Type) -> bool {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

pub fn impl_validate(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Validate can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Validate can only be derived for structs with named fields",
            ))
        }
    };

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Validate cannot be derived for types with lifetime parameters",
        ));
    }

    let mut generics = input.generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(type_param) = param {
            type_param.bounds.push(parse_quote!(::rusty_validator::Reflect));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut descriptors = Vec::new();
    let mut accessors = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.unraw().to_string();
        let indirect = is_option_type(&field.ty);
        let tags = extract_tags(&field.attrs)?;
        // Skipped fields stay out of the descriptor table entirely
        if tags.skip {
            continue;
        }
        let keys = tags.pairs.iter().map(|(k, _)| k);
        let values = tags.pairs.iter().map(|(_, v)| v);

        descriptors.push(quote! {
            ::rusty_validator::FieldDescriptor {
                name: #field_name,
                index: #index,
                tags: &[#((#keys, #values)),*],
                indirect: #indirect,
            }
        });
        accessors.push(quote! {
            #index => ::core::option::Option::Some(&self.#ident),
        });
    }

    Ok(quote! {
        impl #impl_generics ::rusty_validator::Reflect for #name #ty_generics #where_clause {
            fn reflect(&self) -> ::rusty_validator::Value<'_> {
                ::rusty_validator::Value::Struct(self)
            }
        }

        impl #impl_generics ::rusty_validator::Record for #name #ty_generics #where_clause {
            fn descriptor(&self) -> &'static ::rusty_validator::RecordDescriptor {
                static DESCRIPTOR: ::rusty_validator::RecordDescriptor = ::rusty_validator::RecordDescriptor {
                    name: #name_str,
                    fields: &[#(#descriptors),*],
                };
                &DESCRIPTOR
            }

            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::rusty_validator::Reflect> {
                match index {
                    #(#accessors)*
                    _ => ::core::option::Option::None,
                }
            }

            fn as_reflect(&self) -> &dyn ::rusty_validator::Reflect {
                self
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tags_mixed_forms() {
        let field: syn::Field = parse_quote! {
            #[validate("required,email", json = "email_address")]
            #[serde(default, rename = "mail")]
            email: String
        };

        let tags = extract_tags(&field.attrs).unwrap();
        assert!(!tags.skip);
        assert_eq!(
            tags.pairs,
            vec![
                ("validate".to_string(), "required,email".to_string()),
                ("json".to_string(), "email_address".to_string()),
                ("serde".to_string(), "mail".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_tags_skip() {
        let field: syn::Field = parse_quote! {
            #[validate(skip)]
            secret: String
        };

        let tags = extract_tags(&field.attrs).unwrap();
        assert!(tags.skip);
        assert!(tags.pairs.is_empty());
    }

    #[test]
    fn test_is_option_type() {
        assert!(is_option_type(&parse_quote!(Option<String>)));
        assert!(is_option_type(&parse_quote!(std::option::Option<u8>)));
        assert!(!is_option_type(&parse_quote!(Vec<String>)));
    }

    #[test]
    fn test_rejects_tuple_structs() {
        let input: DeriveInput = parse_quote! { struct Pair(u8, u8); };
        let err = impl_validate(&input).unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }

    #[test]
    fn test_rejects_lifetimes() {
        let input: DeriveInput = parse_quote! { struct View<'a> { name: &'a str } };
        assert!(impl_validate(&input).is_err());
    }
}
