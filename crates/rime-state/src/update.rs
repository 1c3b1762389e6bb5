//! Structural update engine.
//!
//! Produces a new tree from an old one by copying only the nodes on the edited
//! path. Every node off that path is shared, by reference, with the old tree.

use crate::value::UNDEFINED;
use crate::{Map, Path, Seg, Value};
use tracing::trace;

/// An owned, editable shallow copy of an interior node.
///
/// Containers exist only while an edit is in progress; [`Container::seal`]
/// turns one back into an immutable [`Value`].
#[derive(Clone, Debug, PartialEq)]
pub enum Container {
    /// Copy of an array node.
    Array(Vec<Value>),
    /// Copy of an object node.
    Object(Map),
}

impl Container {
    /// Shallow-copy `node`. Anything that is not an array copies as an empty
    /// object, so edits below a missing or scalar node create it.
    pub fn copy_of(node: &Value) -> Self {
        match node {
            Value::Array(items) => Container::Array((**items).clone()),
            Value::Object(map) => Container::Object((**map).clone()),
            _ => Container::Object(Map::new()),
        }
    }

    /// Read a child.
    pub fn get(&self, seg: &Seg) -> Option<&Value> {
        match self {
            Container::Array(items) => seg.as_position().and_then(|i| items.get(i)),
            Container::Object(map) => map.get(seg.to_key().as_str()),
        }
    }

    /// Write a child.
    ///
    /// Writing past the end of an array pads it with `Undefined`. A key that is
    /// not an array position is ignored on arrays.
    pub fn set(&mut self, seg: &Seg, value: Value) {
        match self {
            Container::Array(items) => match seg.as_position() {
                Some(i) => {
                    if i >= items.len() {
                        items.resize(i + 1, Value::Undefined);
                    }
                    items[i] = value;
                }
                None => trace!(key = %seg, "ignoring non-index key on array"),
            },
            Container::Object(map) => {
                map.insert(seg.to_key(), value);
            }
        }
    }

    /// Remove a child, returning whether it was present.
    ///
    /// Objects drop the key and keep the order of the remaining keys. Arrays
    /// keep their length and leave an `Undefined` hole.
    pub fn remove(&mut self, seg: &Seg) -> bool {
        match self {
            Container::Array(items) => match seg.as_position().and_then(|i| items.get_mut(i)) {
                Some(slot) => !std::mem::take(slot).is_undefined(),
                None => false,
            },
            Container::Object(map) => map.shift_remove(seg.to_key().as_str()).is_some(),
        }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        match self {
            Container::Array(items) => items.len(),
            Container::Object(map) => map.len(),
        }
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seal into an immutable node.
    pub fn seal(self) -> Value {
        match self {
            Container::Array(items) => Value::array(items),
            Container::Object(map) => Value::object(map),
        }
    }
}

/// Apply an in-place edit at `path` without touching `root` (pure function).
///
/// The container holding the last segment is shallow-copied and handed to
/// `edit` together with that segment. Afterwards the copy and a fresh copy of
/// every ancestor are sealed into the new root.
///
/// # Arguments
///
/// * `root` - The current tree (not modified)
/// * `path` - Address of the slot to edit
/// * `edit` - Mutates the copied container and returns the operation's result
///
/// # Returns
///
/// The new root and whatever `edit` returned.
///
/// # Examples
///
/// ```
/// use rime_state::{apply_edit, path, Value};
/// use serde_json::json;
///
/// let old = Value::from(json!({"a": {"b": 1}, "c": {"d": 2}}));
/// let (new, _) = apply_edit(&old, &path!("a", "b"), |container, key| {
///     container.set(key, Value::from(10));
/// });
///
/// assert_eq!(new, json!({"a": {"b": 10}, "c": {"d": 2}}));
/// assert!(new["c"].same_node(&old["c"]));
/// assert_eq!(old["a"]["b"], 1i64);
/// ```
pub fn apply_edit<R, F>(root: &Value, path: &Path, edit: F) -> (Value, R)
where
    F: FnOnce(&mut Container, &Seg) -> R,
{
    apply_edit_segments(root, path.segments(), edit)
}

/// [`apply_edit`] against a namespaced slice.
///
/// With `Some(namespace)` the leading segment of `path` names the slice and is
/// stripped before resolving against `root`.
pub fn apply_edit_in<R, F>(root: &Value, namespace: Option<&str>, path: &Path, edit: F) -> (Value, R)
where
    F: FnOnce(&mut Container, &Seg) -> R,
{
    apply_edit_segments(root, scoped_segments(path, namespace), edit)
}

/// The segments of `path` relative to `namespace`.
pub fn scoped_segments<'a>(path: &'a Path, namespace: Option<&str>) -> &'a [Seg] {
    match namespace {
        Some(_) => path.segments().get(1..).unwrap_or(&[]),
        None => path.segments(),
    }
}

/// Slice form of [`apply_edit`].
///
/// An empty path addresses the root itself, as the sole slot of a virtual
/// parent: the edit sees the root under index 0, and whatever is left in that
/// slot becomes the new root.
pub fn apply_edit_segments<R, F>(root: &Value, segments: &[Seg], edit: F) -> (Value, R)
where
    F: FnOnce(&mut Container, &Seg) -> R,
{
    match segments.split_last() {
        Some((last, parents)) => {
            trace!(depth = parents.len(), "rebuilding path");
            rebuild(root, parents, last, edit)
        }
        None => {
            let mut slot = Container::Array(vec![root.clone()]);
            let key = Seg::Index(0);
            let result = edit(&mut slot, &key);
            let new_root = slot.get(&key).cloned().unwrap_or_default();
            (new_root, result)
        }
    }
}

fn rebuild<R, F>(node: &Value, parents: &[Seg], last: &Seg, edit: F) -> (Value, R)
where
    F: FnOnce(&mut Container, &Seg) -> R,
{
    let mut copy = Container::copy_of(node);
    let result = match parents.split_first() {
        None => edit(&mut copy, last),
        Some((seg, rest)) => {
            let child = node.get(seg).unwrap_or(&UNDEFINED);
            let (new_child, result) = rebuild(child, rest, last, edit);
            copy.set(seg, new_child);
            result
        }
    };
    (copy.seal(), result)
}
