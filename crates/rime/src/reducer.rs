//! Reducers: the single place descriptors are applied.
//!
//! A [`SliceReducer`] owns one namespace of the root object. A
//! [`Reducer::Combined`] runs every slice reducer against every descriptor
//! and rebuilds the root only when a slice changed.

use rime_state::{Applied, Map, Mutation, Value};
use tracing::{trace, warn};

/// Reducer for one top-level namespace.
#[derive(Clone, Debug)]
pub struct SliceReducer {
    namespace: String,
    initial: Value,
}

impl SliceReducer {
    /// Reducer for `namespace`, seeded with `initial`.
    pub fn new(namespace: impl Into<String>, initial: impl Into<Value>) -> Self {
        Self {
            namespace: namespace.into(),
            initial: initial.into(),
        }
    }

    /// The namespace this reducer owns.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The slice the reducer starts from.
    pub fn initial(&self) -> &Value {
        &self.initial
    }

    /// Fold one descriptor into `slice`.
    ///
    /// An absent slice is seeded from the initial value first. Descriptors
    /// for other namespaces return the slice unchanged with an `Undefined`
    /// result.
    pub fn reduce(&self, slice: &Value, mutation: &Mutation) -> Applied {
        let slice = if slice.is_undefined() {
            &self.initial
        } else {
            slice
        };
        mutation
            .apply_in(slice, &self.namespace)
            .unwrap_or_else(|| Applied {
                state: slice.clone(),
                result: Value::Undefined,
            })
    }
}

/// How a store turns descriptors into new trees.
#[derive(Clone, Debug)]
pub enum Reducer {
    /// One tree; descriptor paths start at the root.
    Flat(Value),
    /// A root object with one slice per namespace.
    Combined(Vec<SliceReducer>),
}

impl Reducer {
    /// A combined reducer with one slice per top-level key of `initial`.
    ///
    /// A non-object `initial` has no namespaces and falls back to a flat
    /// reducer.
    pub fn from_namespaces(initial: &Value) -> Self {
        match initial.as_object() {
            Some(map) => Reducer::Combined(
                map.iter()
                    .map(|(namespace, slice)| SliceReducer::new(namespace.as_str(), slice.clone()))
                    .collect(),
            ),
            None => {
                warn!(
                    found = initial.type_name(),
                    "initial state is not an object, using a flat reducer"
                );
                Reducer::Flat(initial.clone())
            }
        }
    }

    /// The tree a store starts from.
    pub fn initial_state(&self) -> Value {
        match self {
            Reducer::Flat(initial) => initial.clone(),
            Reducer::Combined(slices) => Value::object(
                slices
                    .iter()
                    .map(|slice| (slice.namespace.clone(), slice.initial.clone()))
                    .collect(),
            ),
        }
    }

    /// The namespaces of a combined reducer; empty for a flat one.
    pub fn namespaces(&self) -> Vec<&str> {
        match self {
            Reducer::Flat(_) => Vec::new(),
            Reducer::Combined(slices) => slices.iter().map(SliceReducer::namespace).collect(),
        }
    }

    /// Apply one descriptor to `state`.
    ///
    /// When nothing changes the returned state is `state` itself.
    pub fn reduce(&self, state: &Value, mutation: &Mutation) -> Applied {
        match self {
            Reducer::Flat(_) => mutation.apply(state),
            Reducer::Combined(slices) => reduce_combined(slices, state, mutation),
        }
    }
}

fn reduce_combined(slices: &[SliceReducer], state: &Value, mutation: &Mutation) -> Applied {
    let mut changed: Vec<(&str, Value)> = Vec::new();
    let mut result = Value::Undefined;

    for slice in slices {
        let current = &state[slice.namespace.as_str()];
        let applied = slice.reduce(current, mutation);
        if !applied.state.same_node(current) {
            changed.push((slice.namespace(), applied.state));
        }
        if !applied.result.is_undefined() {
            result = applied.result;
        }
    }

    if changed.is_empty() {
        trace!(path = %mutation.path, "no slice changed");
        return Applied {
            state: state.clone(),
            result,
        };
    }

    let mut root: Map = state.as_object().cloned().unwrap_or_default();
    for (namespace, slice) in changed {
        root.insert(namespace.to_string(), slice);
    }
    Applied {
        state: Value::object(root),
        result,
    }
}
