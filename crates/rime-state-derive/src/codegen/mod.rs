//! Code generation for the Lens derive macro.

mod lens;

use crate::field_kind::FieldKind;
use crate::parse::LensInput;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use syn::DeriveInput;

/// Main entry point for code generation.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() || input.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Lens)] does not support generic structs; \
             wrap a concrete instantiation in its own struct instead",
        ));
    }

    let parsed = LensInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    for field in parsed.lens_fields() {
        if field.nested && !field.kind().is_nested() {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "#[rime(nested)] only supports plain struct fields (not Option/Vec/Map). \
                 The field type must implement Lens.",
            ));
        }
        if field.default.is_some() && matches!(field.kind(), FieldKind::Optional(_)) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "#[rime(default)] has no effect on Option fields; absent reads as None",
            ));
        }
    }

    lens::generate(&parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_generic_structs_are_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Wrapper<T> {
                inner: T,
            }
        };
        let err = expand(&input).unwrap_err();
        assert!(err.to_string().contains("generic structs"));
    }

    #[test]
    fn test_where_clauses_are_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Counter where u32: Copy {
                value: u32,
            }
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn test_plain_struct_expands() {
        let input: DeriveInput = parse_quote! {
            struct Counter {
                value: i64,
            }
        };
        let tokens = expand(&input).unwrap().to_string();
        assert!(tokens.contains("CounterLens"));
    }
}
