//! Lens code generation.
//!
//! Generates a view struct holding a `Proxy` positioned at a value of the
//! deriving type. Every generated accessor goes through that proxy, so reads
//! see the host's latest state and writes become mutation descriptors.

use crate::field_kind::{type_name, FieldKind};
use crate::parse::{FieldInput, LensInput};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Generate the lens struct and the `Lens` impl.
pub fn generate(input: &LensInput) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;
    let lens_name = format_ident!("{}Lens", struct_name);
    let vis = &input.vis;
    let path_value = input.path.as_deref().unwrap_or("");

    let mut methods = TokenStream::new();
    for field in input.lens_fields() {
        methods.extend(read_method(field)?);
        methods.extend(write_methods(field)?);
        methods.extend(delete_method(field)?);
    }

    Ok(quote! {
        /// Typed view over the proxy layer.
        ///
        /// Reads return the latest committed values; writes are dispatched as
        /// mutation descriptors.
        #[derive(Clone, Debug)]
        #vis struct #lens_name {
            proxy: ::rime_state::Proxy,
        }

        impl #lens_name {
            /// The underlying proxy.
            pub fn proxy(&self) -> &::rime_state::Proxy {
                &self.proxy
            }

            /// The path this lens is positioned at.
            pub fn path(&self) -> &::rime_state::Path {
                self.proxy.path()
            }

            /// Read the whole value.
            pub fn get(&self) -> ::rime_state::RimeResult<#struct_name> {
                let value = self.proxy.value();
                if value.is_undefined() {
                    return Err(::rime_state::RimeError::path_not_found(self.proxy.path().clone()));
                }
                ::rime_state::from_value(&value)
            }

            #methods
        }

        impl ::rime_state::Lens for #struct_name {
            type View = #lens_name;

            const PATH: &'static str = #path_value;

            fn lens(proxy: ::rime_state::Proxy) -> Self::View {
                #lens_name { proxy }
            }

            fn from_value(value: &::rime_state::Value) -> ::rime_state::RimeResult<Self> {
                ::rime_state::from_value(value)
            }

            fn to_value(&self) -> ::rime_state::RimeResult<::rime_state::Value> {
                ::rime_state::to_value(self)
            }
        }
    })
}

/// The read accessor for one field.
fn read_method(field: &FieldInput) -> syn::Result<TokenStream> {
    let name = field.name()?;
    let ty = &field.ty;
    let key = field.key()?;

    let method = match field.kind() {
        FieldKind::Nested => {
            let value_name = format_ident!("{}_value", name);
            quote! {
                /// Lens over the nested field.
                pub fn #name(&self) -> <#ty as ::rime_state::Lens>::View {
                    <#ty as ::rime_state::Lens>::lens(self.proxy.at(#key))
                }

                /// Read the nested field as a whole value.
                pub fn #value_name(&self) -> ::rime_state::RimeResult<#ty> {
                    let value = self.proxy.get_value(#key);
                    if value.is_undefined() {
                        return Err(::rime_state::RimeError::path_not_found(
                            self.proxy.path().clone().key(#key),
                        ));
                    }
                    <#ty as ::rime_state::Lens>::from_value(&value)
                }
            }
        }
        FieldKind::Optional(_) => quote! {
            /// Read the optional field; absent or null is `None`.
            pub fn #name(&self) -> ::rime_state::RimeResult<#ty> {
                let value = self.proxy.get_value(#key);
                if value.is_undefined() {
                    return Ok(None);
                }
                ::rime_state::from_value(&value)
            }
        },
        _ => {
            let absent = match field.default_expr()? {
                Some(expr) => quote! { return Ok(#expr); },
                None => quote! {
                    return Err(::rime_state::RimeError::path_not_found(
                        self.proxy.path().clone().key(#key),
                    ));
                },
            };
            quote! {
                /// Read the field.
                pub fn #name(&self) -> ::rime_state::RimeResult<#ty> {
                    let value = self.proxy.get_value(#key);
                    if value.is_undefined() {
                        #absent
                    }
                    ::rime_state::from_value(&value)
                }
            }
        }
    };

    Ok(method)
}

/// Setters and collection helpers for one field.
fn write_methods(field: &FieldInput) -> syn::Result<TokenStream> {
    let name = field.name()?;
    let ty = &field.ty;
    let key = field.key()?;
    let set_name = format_ident!("set_{}", name);

    let set = if type_name(ty).as_deref() == Some("String") {
        quote! {
            /// Assign the field.
            pub fn #set_name(&self, value: impl Into<String>) {
                let value: String = value.into();
                self.proxy.set(#key, value);
            }
        }
    } else {
        quote! {
            /// Assign the field.
            pub fn #set_name(&self, value: #ty) -> ::rime_state::RimeResult<()> {
                self.proxy.set(#key, ::rime_state::to_value(&value)?);
                Ok(())
            }
        }
    };

    let extra = match field.kind() {
        FieldKind::Optional(_) => {
            let none_name = format_ident!("{}_none", name);
            quote! {
                /// Set the optional field to null (`None`).
                pub fn #none_name(&self) {
                    self.proxy.set(#key, ::rime_state::Value::Null);
                }
            }
        }
        FieldKind::List(inner) => {
            let push_name = format_ident!("{}_push", name);
            let proxy_name = format_ident!("{}_proxy", name);
            quote! {
                /// Append an item. Returns the new length.
                pub fn #push_name(&self, item: impl Into<#inner>) -> ::rime_state::RimeResult<usize> {
                    let item: #inner = item.into();
                    let item = ::rime_state::to_value(&item)?;
                    let target = self.proxy.get_value(#key);
                    if !(target.is_undefined() || target.is_null() || target.is_array()) {
                        return Err(::rime_state::RimeError::type_mismatch(
                            self.proxy.path().clone().key(#key),
                            "array",
                            target.type_name(),
                        ));
                    }
                    let len = target.len() + 1;
                    self.proxy.at(#key).push([item]);
                    Ok(len)
                }

                /// Proxy over the array, for the remaining array methods.
                pub fn #proxy_name(&self) -> ::rime_state::Proxy {
                    self.proxy.at(#key)
                }
            }
        }
        FieldKind::Map { key: key_ty, value } if type_name(&key_ty).as_deref() == Some("String") => {
            let insert_name = format_ident!("{}_insert", name);
            quote! {
                /// Insert an entry into the map.
                pub fn #insert_name(
                    &self,
                    entry: impl Into<String>,
                    value: impl Into<#value>,
                ) -> ::rime_state::RimeResult<()> {
                    let entry: String = entry.into();
                    let value: #value = value.into();
                    self.proxy.at(#key).set(entry, ::rime_state::to_value(&value)?);
                    Ok(())
                }
            }
        }
        _ => quote! {},
    };

    Ok(quote! {
        #set
        #extra
    })
}

fn delete_method(field: &FieldInput) -> syn::Result<TokenStream> {
    let delete_name = format_ident!("delete_{}", field.name()?);
    let key = field.key()?;
    Ok(quote! {
        /// Remove the field.
        pub fn #delete_name(&self) {
            self.proxy.delete(#key);
        }
    })
}
