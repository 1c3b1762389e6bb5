//! Typed views over proxies.
//!
//! The `Lens` trait ties a Rust type to a generated view struct that reads and
//! writes the type's fields through a [`Proxy`]. It is typically implemented
//! via `#[derive(Lens)]`.

use crate::{Proxy, RimeError, RimeResult, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type with a typed view over the proxy layer.
///
/// # Example
///
/// ```ignore
/// use rime_state::Lens;
///
/// #[derive(Lens, Serialize, Deserialize)]
/// struct Todo {
///     title: String,
///     done: bool,
/// }
///
/// let todo = session.lens::<Todo>("todos.0");
/// let title = todo.title()?;
/// todo.set_done(true)?;
/// ```
pub trait Lens: Sized {
    /// The generated view type.
    type View;

    /// Dot-separated path the type lives at, when bound via
    /// `#[rime(path = "...")]`. Empty means the root.
    const PATH: &'static str = "";

    /// Wrap a proxy positioned at a value of this type.
    fn lens(proxy: Proxy) -> Self::View;

    /// Convert a node into this type.
    fn from_value(value: &Value) -> RimeResult<Self>;

    /// Convert this type into a node.
    fn to_value(&self) -> RimeResult<Value>;
}

/// Convert a node into any deserializable type.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> RimeResult<T> {
    serde_json::from_value(value.to_json()).map_err(RimeError::from)
}

/// Convert any serializable type into a node.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> RimeResult<Value> {
    serde_json::to_value(value)
        .map(Value::from)
        .map_err(RimeError::from)
}
