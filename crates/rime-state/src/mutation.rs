//! Mutation descriptors.
//!
//! A descriptor records one intercepted write: what kind of operation, where,
//! and with which arguments. Applying a descriptor to a tree is pure and
//! yields the next tree plus the value the operation surfaces to its caller.

use crate::array;
use crate::resolve::resolve_segments;
use crate::update::{apply_edit_in, scoped_segments};
use crate::{Path, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// The operation a descriptor records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
    /// Assign a value to a key.
    Set,
    /// Remove a key.
    Delete,
    /// Append items to an array.
    Push,
    /// Remove the first element of an array.
    Shift,
    /// Remove the last element of an array.
    Pop,
    /// Prepend items to an array.
    Unshift,
    /// Remove and/or insert elements of an array.
    Splice,
    /// Reverse an array.
    Reverse,
    /// Sort an array.
    Sort,
    /// Copy a range of an array over another range of it.
    CopyWithin,
    /// Any kind this version does not know. Applying it changes nothing.
    #[serde(other)]
    Unknown,
}

impl MutationKind {
    /// The kind recorded by the array method `name`, if it is a mutating one.
    pub fn from_method(name: &str) -> Option<Self> {
        Some(match name {
            "push" => MutationKind::Push,
            "shift" => MutationKind::Shift,
            "pop" => MutationKind::Pop,
            "unshift" => MutationKind::Unshift,
            "splice" => MutationKind::Splice,
            "reverse" => MutationKind::Reverse,
            "sort" => MutationKind::Sort,
            "copyWithin" => MutationKind::CopyWithin,
            _ => return None,
        })
    }

    /// Whether this kind edits an array.
    pub fn is_array_method(&self) -> bool {
        !matches!(
            self,
            MutationKind::Set | MutationKind::Delete | MutationKind::Unknown
        )
    }

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::Set => "SET",
            MutationKind::Delete => "DELETE",
            MutationKind::Push => "PUSH",
            MutationKind::Shift => "SHIFT",
            MutationKind::Pop => "POP",
            MutationKind::Unshift => "UNSHIFT",
            MutationKind::Splice => "SPLICE",
            MutationKind::Reverse => "REVERSE",
            MutationKind::Sort => "SORT",
            MutationKind::CopyWithin => "COPYWITHIN",
            MutationKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An in-process sort comparator carried by a SORT descriptor.
///
/// Comparators never cross the wire: a deserialized SORT uses the default
/// order.
#[derive(Clone)]
pub struct Comparator(Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>);

impl Comparator {
    /// Wrap a comparison function.
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(compare))
    }

    /// Compare two elements.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.0)(a, b)
    }
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Tag {
    #[default]
    Mutation,
}

/// A mutation descriptor.
///
/// Serialized as
/// `{"type": "mutation", "path": [...], "mutation": "SET", "value": ..., "args": [...]}`
/// with `value` and `args` omitted when empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    #[serde(rename = "type")]
    tag: Tag,
    /// Address of the edited slot (SET, DELETE) or array (everything else).
    pub path: Path,
    /// The recorded operation.
    #[serde(rename = "mutation")]
    pub kind: MutationKind,
    /// Assigned value, for SET.
    #[serde(default, skip_serializing_if = "Value::is_undefined")]
    pub value: Value,
    /// Method arguments, for the array kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    /// Comparator for SORT.
    #[serde(skip)]
    pub comparator: Option<Comparator>,
}

/// Outcome of applying a descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    /// The next tree.
    pub state: Value,
    /// What the operation surfaces to its caller.
    pub result: Value,
}

impl Applied {
    fn unchanged(root: &Value) -> Self {
        Self {
            state: root.clone(),
            result: Value::Undefined,
        }
    }
}

impl Mutation {
    /// Create a descriptor with no value or arguments.
    pub fn new(kind: MutationKind, path: Path) -> Self {
        Self {
            tag: Tag::Mutation,
            path,
            kind,
            value: Value::Undefined,
            args: Vec::new(),
            comparator: None,
        }
    }

    /// Create a SET descriptor.
    pub fn set(path: Path, value: impl Into<Value>) -> Self {
        Self::new(MutationKind::Set, path).with_value(value)
    }

    /// Create a DELETE descriptor.
    pub fn delete(path: Path) -> Self {
        Self::new(MutationKind::Delete, path)
    }

    /// Create a PUSH descriptor.
    pub fn push(path: Path, items: Vec<Value>) -> Self {
        Self::new(MutationKind::Push, path).with_args(items)
    }

    /// Create a SHIFT descriptor.
    pub fn shift(path: Path) -> Self {
        Self::new(MutationKind::Shift, path)
    }

    /// Create a POP descriptor.
    pub fn pop(path: Path) -> Self {
        Self::new(MutationKind::Pop, path)
    }

    /// Create an UNSHIFT descriptor.
    pub fn unshift(path: Path, items: Vec<Value>) -> Self {
        Self::new(MutationKind::Unshift, path).with_args(items)
    }

    /// Create a SPLICE descriptor from `[start, deleteCount?, ...items]`.
    pub fn splice(path: Path, args: Vec<Value>) -> Self {
        Self::new(MutationKind::Splice, path).with_args(args)
    }

    /// Create a REVERSE descriptor.
    pub fn reverse(path: Path) -> Self {
        Self::new(MutationKind::Reverse, path)
    }

    /// Create a SORT descriptor using the default order.
    pub fn sort(path: Path) -> Self {
        Self::new(MutationKind::Sort, path)
    }

    /// Create a SORT descriptor with a comparator.
    pub fn sort_by(path: Path, comparator: Comparator) -> Self {
        let mut mutation = Self::new(MutationKind::Sort, path);
        mutation.comparator = Some(comparator);
        mutation
    }

    /// Create a COPYWITHIN descriptor from `[target, start, end?]`.
    pub fn copy_within(path: Path, args: Vec<Value>) -> Self {
        Self::new(MutationKind::CopyWithin, path).with_args(args)
    }

    /// Replace the value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Replace the arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Apply to a whole tree (pure function).
    ///
    /// # Examples
    ///
    /// ```
    /// use rime_state::{path, Mutation, Value};
    /// use serde_json::json;
    ///
    /// let state = Value::from(json!({"foo": {"bar": ["a"]}}));
    /// let applied = Mutation::push(path!("foo", "bar"), vec!["b".into()]).apply(&state);
    ///
    /// assert_eq!(applied.state, json!({"foo": {"bar": ["a", "b"]}}));
    /// assert_eq!(applied.result, 2i64);
    /// assert_eq!(state, json!({"foo": {"bar": ["a"]}}));
    /// ```
    pub fn apply(&self, root: &Value) -> Applied {
        self.apply_scoped(root, None)
    }

    /// Apply to the slice owned by `namespace`.
    ///
    /// Returns `None`, leaving the slice untouched, when the descriptor's
    /// leading segment names a different namespace.
    pub fn apply_in(&self, slice: &Value, namespace: &str) -> Option<Applied> {
        if !self.path.is_in_namespace(namespace) {
            trace!(namespace, path = %self.path, "descriptor outside namespace");
            return None;
        }
        Some(self.apply_scoped(slice, Some(namespace)))
    }

    fn apply_scoped(&self, root: &Value, namespace: Option<&str>) -> Applied {
        match self.kind {
            MutationKind::Set => {
                let (state, ()) = apply_edit_in(root, namespace, &self.path, |container, key| {
                    container.set(key, self.value.clone());
                });
                Applied {
                    state,
                    result: self.value.clone(),
                }
            }
            MutationKind::Delete => {
                let (state, _) = apply_edit_in(root, namespace, &self.path, |container, key| {
                    container.remove(key)
                });
                Applied {
                    state,
                    result: Value::Bool(true),
                }
            }
            MutationKind::Unknown => {
                trace!(path = %self.path, "ignoring unknown mutation");
                Applied::unchanged(root)
            }
            _ => self.apply_array(root, namespace),
        }
    }

    fn apply_array(&self, root: &Value, namespace: Option<&str>) -> Applied {
        let target = resolve_segments(root, scoped_segments(&self.path, namespace));
        if array::editable(target).is_none() {
            warn!(
                kind = %self.kind,
                path = %self.path,
                found = target.type_name(),
                "array mutation on non-array target ignored"
            );
            return Applied::unchanged(root);
        }

        let (state, result) = apply_edit_in(root, namespace, &self.path, |container, key| {
            let mut items = match container.get(key) {
                Some(Value::Array(items)) => (**items).clone(),
                _ => Vec::new(),
            };
            let result = self.edit_array(&mut items);
            let array = Value::array(items);
            container.set(key, array.clone());
            result.unwrap_or(array)
        });
        Applied { state, result }
    }

    /// Edit `items` in place. `None` means the operation surfaces the new
    /// array itself.
    fn edit_array(&self, items: &mut Vec<Value>) -> Option<Value> {
        match self.kind {
            MutationKind::Push => {
                items.extend(self.args.iter().cloned());
                Some(Value::from(items.len()))
            }
            MutationKind::Shift => Some(if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }),
            MutationKind::Pop => Some(items.pop().unwrap_or_default()),
            MutationKind::Unshift => {
                items.splice(0..0, self.args.iter().cloned());
                Some(Value::from(items.len()))
            }
            MutationKind::Splice => Some(Value::array(array::splice(items, &self.args))),
            MutationKind::Reverse => {
                items.reverse();
                None
            }
            MutationKind::Sort => {
                array::sort(items, self.comparator.as_ref());
                None
            }
            MutationKind::CopyWithin => {
                array::copy_within(items, &self.args);
                None
            }
            MutationKind::Set | MutationKind::Delete | MutationKind::Unknown => {
                Some(Value::Undefined)
            }
        }
    }
}

/// Apply descriptors one after another, in order (pure function).
pub fn apply_mutations<'a>(
    root: &Value,
    mutations: impl IntoIterator<Item = &'a Mutation>,
) -> Value {
    mutations
        .into_iter()
        .fold(root.clone(), |acc, mutation| mutation.apply(&acc).state)
}
