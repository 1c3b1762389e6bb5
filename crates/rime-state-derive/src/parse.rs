//! Attribute parsing for the Lens derive macro.

use crate::field_kind::FieldKind;
use darling::{ast, FromDeriveInput, FromField};
use syn::{Ident, Type, Visibility};

/// Parsed struct-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(rime), supports(struct_named))]
pub struct LensInput {
    /// The struct identifier.
    pub ident: Ident,

    /// The struct visibility; the lens gets the same.
    pub vis: Visibility,

    /// Struct data (fields).
    pub data: ast::Data<(), FieldInput>,

    /// Dot-separated path the type lives at (`#[rime(path = "todos")]`).
    #[darling(default)]
    pub path: Option<String>,
}

impl LensInput {
    /// Fields that appear on the lens.
    pub fn lens_fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields.into_iter().filter(|f| !f.skip).collect())
            .unwrap_or_default()
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(rime))]
pub struct FieldInput {
    /// Field identifier; always present on named structs.
    pub ident: Option<Ident>,

    /// Field type.
    pub ty: Type,

    /// Key the field is stored under.
    #[darling(default)]
    pub rename: Option<String>,

    /// Expression used when the key is absent.
    #[darling(default)]
    pub default: Option<String>,

    /// Leave the field off the lens.
    #[darling(default)]
    pub skip: bool,

    /// The field type has its own lens.
    #[darling(default)]
    pub nested: bool,
}

impl FieldInput {
    /// The field identifier.
    pub fn name(&self) -> syn::Result<&Ident> {
        self.ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(&self.ty, "Lens requires named fields"))
    }

    /// The key this field is stored under.
    pub fn key(&self) -> syn::Result<String> {
        match &self.rename {
            Some(rename) => Ok(rename.clone()),
            None => self.name().map(|ident| ident.to_string()),
        }
    }

    /// The field's shape.
    pub fn kind(&self) -> FieldKind {
        FieldKind::classify(&self.ty, self.nested)
    }

    /// The parsed default expression, if one was given.
    pub fn default_expr(&self) -> syn::Result<Option<syn::Expr>> {
        self.default
            .as_deref()
            .map(|source| {
                syn::parse_str(source).map_err(|e| {
                    syn::Error::new_spanned(&self.ty, format!("invalid default expression: {e}"))
                })
            })
            .transpose()
    }
}
