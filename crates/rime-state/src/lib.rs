//! Mutation-tracking proxies over an immutable, structurally shared state tree.
//!
//! `rime-state` lets application code write to state through ordinary-looking
//! operations (`set`, `delete`, `push`, `splice`, ...) while the tree itself is
//! never mutated. Every write becomes a [`Mutation`] descriptor; applying a
//! descriptor produces a new tree that shares every untouched subtree with the
//! old one.
//!
//! # Core Concepts
//!
//! - **Value**: An immutable tree node; interior nodes are `Arc`-shared
//! - **Path**: The sequence of keys leading to a node
//! - **Mutation**: A serializable record of one intercepted write
//! - **apply_edit**: The structural update engine behind every descriptor
//! - **Proxy**: A live view of one position that turns writes into descriptors
//! - **Session**: One action invocation's host binding and proxy identity cache
//! - **Lens**: A typed view generated by `#[derive(Lens)]`
//!
//! # Pure Transitions
//!
//! ```text
//! (State', result) = apply(State, Mutation)
//! ```
//!
//! - `State` is never modified
//! - nodes off the mutation's path are shared by reference with `State'`
//! - the root, every ancestor and the edited container are fresh nodes
//!
//! # Quick Start
//!
//! ```
//! use rime_state::{path, Mutation, Value};
//! use serde_json::json;
//!
//! let state = Value::from(json!({"todos": [], "filter": {"done": false}}));
//!
//! let applied = Mutation::push(path!("todos"), vec![json!({"title": "write"}).into()])
//!     .apply(&state);
//!
//! assert_eq!(applied.result, 1i64);
//! assert_eq!(applied.state["todos"][0]["title"], "write");
//! assert!(applied.state["filter"].same_node(&state["filter"]));
//! assert!(state["todos"].is_empty());
//! ```
//!
//! # Writing Through Proxies
//!
//! ```
//! use rime_state::{DocCell, Session, Value};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let doc = Arc::new(DocCell::new(Value::from(json!({"foo": {"bar": ["a"]}}))));
//! let session = Session::new(doc.clone());
//!
//! let bar = session.root().at("foo").at("bar");
//! assert_eq!(bar.push(["b"]), 2i64);
//! assert_eq!(bar.value(), json!(["a", "b"]));
//! assert_eq!(doc.get(), json!({"foo": {"bar": ["a", "b"]}}));
//! ```

mod array;
mod cache;
mod doc_cell;
mod error;
mod lens;
mod mutation;
mod path;
mod proxy;
mod resolve;
mod update;
mod value;

// Tree
pub use path::{parse_path, Path, Seg};
pub use value::{Map, NodeId, Number, Opaque, Value};

// Engine
pub use mutation::{apply_mutations, Applied, Comparator, Mutation, MutationKind};
pub use resolve::{resolve, resolve_segments};
pub use update::{apply_edit, apply_edit_in, apply_edit_segments, scoped_segments, Container};

// Proxy layer
pub use cache::ProxyCache;
pub use doc_cell::DocCell;
pub use proxy::{Entry, Host, Proxy, Session};

// Typed access
pub use error::{RimeError, RimeResult};
pub use lens::{from_value, to_value, Lens};

#[cfg(feature = "derive")]
pub use rime_state_derive::Lens;
