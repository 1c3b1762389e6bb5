//! Derive macro for the rime-state `Lens` trait.
//!
//! This crate provides the `#[derive(Lens)]` macro that generates:
//! - `{Name}Lens`: a typed view over a `Proxy` positioned at a `{Name}`
//! - `impl Lens for {Name}`
//!
//! Generated code refers to `::rime_state`, so the deriving crate must depend
//! on `rime-state` directly.
//!
//! # Usage
//!
//! ```ignore
//! use rime_state::Lens;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Lens, Serialize, Deserialize)]
//! struct Todos {
//!     items: Vec<Todo>,
//!     #[rime(nested)]
//!     filter: Filter,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod field_kind;
mod parse;

/// Derive the `Lens` trait for a struct.
///
/// The struct must also implement `Serialize` and `Deserialize`.
///
/// # Generated Methods
///
/// For each field `x` of type `T`:
/// - `x()`: read the live value (`PathNotFound` when absent)
/// - `set_x(value)`: dispatch a SET
/// - `delete_x()`: dispatch a DELETE
///
/// Plus, by shape:
/// - `Option<T>`: `x()` reads absent or null as `None`; `x_none()`
/// - `Vec<T>`: `x_push(item)` returns the new length; `x_proxy()` for the
///   other array methods
/// - String-keyed maps: `x_insert(key, value)`
/// - `#[rime(nested)]`: `x()` returns the nested lens; `x_value()` reads the
///   whole nested value
///
/// # Attributes
///
/// ## Struct Attributes
///
/// - `#[rime(path = "a.b")]`: the path `Session::lens_of` opens the lens at
///
/// Generic structs are rejected.
///
/// ## Field Attributes
///
/// - `#[rime(rename = "key")]`: store under a different key
/// - `#[rime(default = "expr")]`: value returned when the key is absent
/// - `#[rime(skip)]`: leave the field off the lens
/// - `#[rime(nested)]`: the field type derives `Lens` too
///
/// # Examples
///
/// ```ignore
/// #[derive(Lens, Serialize, Deserialize)]
/// struct Counter {
///     value: i64,
///     #[rime(rename = "display_name")]
///     label: String,
/// }
///
/// let counter = session.lens::<Counter>("counters.main");
/// let value = counter.value()?;
/// counter.set_value(value + 1)?;
/// counter.set_label("Updated");
/// ```
#[proc_macro_derive(Lens, attributes(rime))]
pub fn derive_lens(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
