//! Array-method arithmetic shared by the update engine and the proxy.
//!
//! The proxy computes the values surfaced to action code from a pre-call
//! snapshot with the same helpers the engine uses to build the new array, so
//! both always agree.

use crate::mutation::Comparator;
use crate::{Number, Value};
use std::cmp::Ordering;

/// Coerce an argument to an integer. Non-numbers and NaN are 0.
pub(crate) fn to_integer(value: &Value) -> i64 {
    match value {
        Value::Number(Number::Int(i)) => *i,
        Value::Number(Number::Float(f)) => float_to_integer(*f),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, float_to_integer),
        _ => 0,
    }
}

fn float_to_integer(f: f64) -> i64 {
    if f.is_nan() {
        0
    } else {
        // `as` saturates at the i64 bounds
        f.trunc() as i64
    }
}

/// Resolve a possibly negative relative index against `len`, clamped to `0..=len`.
pub(crate) fn relative_index(relative: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let absolute = if relative < 0 {
        len_i.saturating_add(relative).max(0)
    } else {
        relative.min(len_i)
    };
    usize::try_from(absolute).unwrap_or(0)
}

/// The elements an array method starts from: empty for an absent or null
/// target, `None` for any other non-array, which array methods leave alone.
pub(crate) fn editable(target: &Value) -> Option<&[Value]> {
    match target {
        Value::Array(items) => Some(items.as_slice()),
        Value::Undefined | Value::Null => Some(&[][..]),
        _ => None,
    }
}

/// `splice(start, deleteCount?, ...items)` in place; returns the removed elements.
///
/// With no arguments nothing is removed. With only a start everything from
/// the start onward is removed.
pub(crate) fn splice(items: &mut Vec<Value>, args: &[Value]) -> Vec<Value> {
    let len = items.len();
    let start = relative_index(args.first().map_or(0, to_integer), len);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => usize::try_from(to_integer(&args[1]).max(0))
            .unwrap_or(0)
            .min(len - start),
    };
    let inserted = args.iter().skip(2).cloned();
    items.splice(start..start + delete_count, inserted).collect()
}

/// `copyWithin(target, start, end?)` in place.
pub(crate) fn copy_within(items: &mut [Value], args: &[Value]) {
    let len = items.len();
    let to = relative_index(args.first().map_or(0, to_integer), len);
    let from = relative_index(args.get(1).map_or(0, to_integer), len);
    let end = match args.get(2) {
        None | Some(Value::Undefined) => len,
        Some(end) => relative_index(to_integer(end), len),
    };
    let count = end.saturating_sub(from).min(len - to);
    if count == 0 {
        return;
    }
    let copied = items[from..from + count].to_vec();
    items[to..to + count].clone_from_slice(&copied);
}

/// Stable sort in place. `Undefined` elements always sort last and are never
/// handed to the comparator.
pub(crate) fn sort(items: &mut Vec<Value>, comparator: Option<&Comparator>) {
    let mut undefined = 0;
    items.retain(|item| {
        let keep = !item.is_undefined();
        if !keep {
            undefined += 1;
        }
        keep
    });
    match comparator {
        Some(comparator) => items.sort_by(|a, b| comparator.compare(a, b)),
        None => items.sort_by(compare_default),
    }
    items.extend(std::iter::repeat(Value::Undefined).take(undefined));
}

/// Default sort order: compare string forms by UTF-16 code units.
pub(crate) fn compare_default(a: &Value, b: &Value) -> Ordering {
    let (a, b) = (display_string(a), display_string(b));
    a.encode_utf16().cmp(b.encode_utf16())
}

/// String form of a value as permissive hosts print it.
pub(crate) fn display_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_owned(),
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Undefined | Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) | Value::Opaque(_) => "[object Object]".to_owned(),
    }
}
