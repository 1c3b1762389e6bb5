//! The immutable state tree.
//!
//! A [`Value`] is either a scalar leaf or an interior node (array or object).
//! Interior nodes sit behind `Arc`s: cloning a value is cheap and shares every
//! subtree. Nothing reachable from a `Value` can be mutated in place; new
//! versions are produced by the update engine, which copies only the nodes on
//! the edited path (see [`crate::apply_edit`]).

use crate::Seg;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Keyed children of an object node, in insertion order.
pub type Map = IndexMap<String, Value>;

pub(crate) static UNDEFINED: Value = Value::Undefined;

/// A numeric leaf.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
}

impl Number {
    /// Convert to f64.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Convert to i64 (truncates floats, saturating at the bounds).
    #[inline]
    pub fn as_i64(&self) -> i64 {
        match self {
            Number::Int(i) => *i,
            Number::Float(f) => *f as i64,
        }
    }

    /// Check if this is an integer.
    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) if x.is_nan() => write!(f, "NaN"),
            Number::Float(x) if x.is_infinite() => {
                write!(f, "{}", if x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Number::Float(x) if x.fract() == 0.0 && x.abs() < 1e21 => write!(f, "{}", x as i64),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v as i64)
    }
}

impl From<usize> for Number {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or(Number::Float(v as f64), Number::Int)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// An opaque leaf: any shareable Rust value stored in the tree as-is.
///
/// Opaque leaves are never traversed or copied. They compare by identity and
/// serialize as `null`.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the wrapped value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&format_args!("{:#x}", self.addr())).finish()
    }
}

/// Stable handle of an interior node.
///
/// Two values have the same `NodeId` exactly when they share the same
/// underlying node. A handle stays unique for as long as some value keeps the
/// node alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A node of the state tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value, what reading a missing key yields.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean leaf.
    Bool(bool),
    /// Numeric leaf.
    Number(Number),
    /// String leaf.
    String(Arc<str>),
    /// Ordered sequence of children.
    Array(Arc<Vec<Value>>),
    /// Keyed mapping of children.
    Object(Arc<Map>),
    /// Opaque leaf.
    Opaque(Opaque),
}

impl Value {
    /// Seal a vector of children into an array node.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    /// Seal a map of children into an object node.
    pub fn object(map: Map) -> Self {
        Value::Object(Arc::new(map))
    }

    /// An empty object node.
    pub fn empty_object() -> Self {
        Value::object(Map::new())
    }

    /// Wrap any shareable Rust value as an opaque leaf.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    /// Returns true for [`Value::Undefined`].
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for arrays.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true for objects.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns true for interior nodes (arrays and objects).
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Get the boolean if this is a boolean leaf.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string if this is a string leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number as i64 if this is a numeric leaf.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(n.as_i64()),
            _ => None,
        }
    }

    /// Get the number as f64 if this is a numeric leaf.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Borrow the children of an array node.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the children of an object node.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the opaque leaf's content if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(o) => o.downcast_ref(),
            _ => None,
        }
    }

    /// Index one level down.
    ///
    /// Indexing is permissive: an index on an object looks up its decimal key,
    /// a numeric key on an array is an index. Anything else is `None`.
    pub fn get(&self, seg: &Seg) -> Option<&Value> {
        match self {
            Value::Array(items) => seg.as_position().and_then(|i| items.get(i)),
            Value::Object(map) => match seg {
                Seg::Key(k) => map.get(k.as_str()),
                Seg::Index(i) => map.get(i.to_string().as_str()),
            },
            _ => None,
        }
    }

    /// Number of children of an interior node; 0 for leaves.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    /// Whether [`Value::len`] is 0.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable handle of this node, for interior nodes only.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Array(items) => Some(NodeId(Arc::as_ptr(items) as *const () as usize)),
            Value::Object(map) => Some(NodeId(Arc::as_ptr(map) as *const () as usize)),
            _ => None,
        }
    }

    /// Reference identity.
    ///
    /// Interior nodes and opaque leaves are identical when they share the same
    /// allocation; scalars are identical when they are equal.
    pub fn same_node(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            (Value::Array(_) | Value::Object(_) | Value::Opaque(_), _)
            | (_, Value::Array(_) | Value::Object(_) | Value::Opaque(_)) => false,
            _ => self == other,
        }
    }

    /// Name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Convert to a JSON value (deep copy).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        *self == Value::from(other.clone())
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Value::Number(n) if *n == Number::Int(*other))
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl std::ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(&Seg::key(key)).unwrap_or(&UNDEFINED)
    }
}

impl std::ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.get(&Seg::Index(index)).unwrap_or(&UNDEFINED)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v.into())
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::array(iter.into_iter().collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => n
                    .as_f64()
                    .map_or(Value::Null, |f| Value::Number(Number::Float(f))),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => items.into_iter().map(Value::from).collect(),
            serde_json::Value::Object(map) => Value::object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Undefined | Value::Null | Value::Opaque(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(Number::Int(i)) => serde_json::Value::from(*i),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null | Value::Opaque(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let present = map.values().filter(|v| !v.is_undefined()).count();
                let mut out = serializer.serialize_map(Some(present))?;
                for (k, v) in map.iter().filter(|(_, v)| !v.is_undefined()) {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_and_back() {
        let doc = json!({"a": [1, 2.5, "x", null, true], "b": {"c": {}}});
        let value = Value::from(doc.clone());
        assert_eq!(value.to_json(), doc);
        assert_eq!(value, doc);
    }

    #[test]
    fn test_clone_shares_nodes() {
        let value = Value::from(json!({"a": {"b": 1}}));
        let copy = value.clone();
        assert!(value.same_node(&copy));
        assert!(value["a"].same_node(&copy["a"]));
    }

    #[test]
    fn test_equal_but_distinct_nodes() {
        let a = Value::from(json!({"x": [1]}));
        let b = Value::from(json!({"x": [1]}));
        assert_eq!(a, b);
        assert!(!a.same_node(&b));
        assert_ne!(a.node_id(), b.node_id());
    }

    #[test]
    fn test_scalars_are_identical_when_equal() {
        assert!(Value::from("x").same_node(&Value::from("x")));
        assert!(Value::from(1).same_node(&Value::from(1.0)));
        assert!(!Value::Null.same_node(&Value::Undefined));
        assert!(Value::Null.node_id().is_none());
    }

    #[test]
    fn test_permissive_get() {
        let value = Value::from(json!({"list": ["a", "b"], "0": "zero"}));
        assert_eq!(value["list"][1], "b");
        assert_eq!(value["list"].get(&Seg::key("1")), Some(&Value::from("b")));
        assert_eq!(value.get(&Seg::index(0)), Some(&Value::from("zero")));
        assert!(value["missing"]["deeper"].is_undefined());
        assert!(value["list"]["length"].is_undefined());
    }

    #[test]
    fn test_undefined_fields_are_not_serialized() {
        let mut map = Map::new();
        map.insert("kept".into(), Value::from(1));
        map.insert("gone".into(), Value::Undefined);
        let value = Value::object(map);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"kept":1}"#);

        let items = Value::array(vec![Value::Undefined, Value::from(2)]);
        assert_eq!(serde_json::to_string(&items).unwrap(), "[null,2]");
    }

    #[test]
    fn test_opaque_identity() {
        #[derive(Debug, PartialEq)]
        struct Handle(u32);

        let a = Value::opaque(Handle(7));
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Value::opaque(Handle(7)));
        assert_eq!(a.downcast_ref::<Handle>(), Some(&Handle(7)));
        assert_eq!(serde_json::to_string(&a).unwrap(), "null");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(Number::Int(3).to_string(), "3");
        assert_eq!(Number::Float(3.0).to_string(), "3");
        assert_eq!(Number::Float(1.5).to_string(), "1.5");
        assert_eq!(Number::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(Number::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Undefined.type_name(), "undefined");
        assert_eq!(Value::from(json!([1])).type_name(), "array");
        assert_eq!(Value::from(json!({})).type_name(), "object");
    }
}
