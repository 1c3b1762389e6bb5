//! Path resolution against a state tree.

use crate::value::UNDEFINED;
use crate::{Path, Seg, Value};

/// Read the node at `path`.
///
/// Walks the path left to right. A missing key, an out-of-range index, or
/// stepping into a leaf yields [`Value::Undefined`]. Resolution never fails.
pub fn resolve<'a>(root: &'a Value, path: &Path) -> &'a Value {
    resolve_segments(root, path.segments())
}

/// Slice form of [`resolve`].
pub fn resolve_segments<'a>(root: &'a Value, segments: &[Seg]) -> &'a Value {
    segments
        .iter()
        .try_fold(root, |node, seg| node.get(seg))
        .unwrap_or(&UNDEFINED)
}
