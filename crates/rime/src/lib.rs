//! Hosting store for rime-state.
//!
//! `rime` wires the proxy layer and the update engine from [`rime_state`]
//! into a usable store:
//!
//! - [`Store`]: owns the current tree, commits descriptors, notifies
//!   subscribers
//! - [`Reducer`] / [`SliceReducer`]: namespaced application of descriptors
//! - [`Actions`] / [`ActionContext`]: named functions run against a fresh
//!   proxy session per invocation
//! - [`StoreOptions`]: debug logging, read from the environment
//!
//! Everything from `rime_state` is re-exported. Types deriving [`Lens`] must
//! still depend on `rime-state` directly, since generated code names it.
//!
//! # Quick Start
//!
//! ```
//! use rime::Store;
//! use serde_json::json;
//!
//! let store = Store::combined(json!({"foo": {"bar": ["foo"]}}));
//! let len = store.run(|ctx, _| ctx.state.at("foo").at("bar").push(["bar"]), ());
//!
//! assert_eq!(len, 2i64);
//! assert_eq!(store.state(), json!({"foo": {"bar": ["foo", "bar"]}}));
//! ```
//!
//! # Async actions
//!
//! ```
//! use rime::Store;
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = Store::combined(json!({"foo": {"bar": "baz"}}));
//! store
//!     .run_async(
//!         |ctx, _| async move {
//!             let foo = ctx.state.at("foo");
//!             foo.set("bar", "baz!");
//!             tokio::task::yield_now().await;
//!             assert_eq!(foo.get_value("bar"), "baz!");
//!         },
//!         (),
//!     )
//!     .await;
//! # });
//! ```

mod action;
mod config;
mod error;
mod options;
mod reducer;
mod store;

pub use action::{ActionContext, Actions, BoundAction, BoxFuture};
pub use config::{create, Config};
pub use error::{StoreError, StoreResult};
pub use options::{StoreOptions, DEBUG_VAR, ENV_VAR};
pub use reducer::{Reducer, SliceReducer};
pub use store::{Store, SubscriptionId};

pub use rime_state::*;
