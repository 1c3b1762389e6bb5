//! Actions: named functions run against a fresh proxy session.
//!
//! Every invocation gets its own [`Session`], so identity of proxies never
//! leaks between invocations. Actions receive the root proxy and the store's
//! effects through an [`ActionContext`].

use crate::{Store, StoreError, StoreResult};
use rime_state::{Lens, Proxy, Session, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug_span, Instrument};

/// Boxed future returned by async actions.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type SyncHandler<E> = Arc<dyn Fn(ActionContext<E>, Value) -> StoreResult<Value> + Send + Sync>;
type AsyncHandler<E> =
    Arc<dyn Fn(ActionContext<E>, Value) -> BoxFuture<StoreResult<Value>> + Send + Sync>;

/// What an action receives.
pub struct ActionContext<E = ()> {
    /// Root proxy of this invocation's session.
    pub state: Proxy,
    /// The store's effects.
    pub effects: Arc<E>,
}

impl<E> ActionContext<E> {
    /// The session backing [`ActionContext::state`].
    pub fn session(&self) -> &Session {
        self.state.session()
    }

    /// Typed lens at a dot-separated path.
    pub fn lens<T: Lens>(&self, path: &str) -> T::View {
        self.session().lens::<T>(path)
    }

    /// Typed lens at the type's bound path.
    pub fn lens_of<T: Lens>(&self) -> T::View {
        self.session().lens_of::<T>()
    }
}

impl<E> Clone for ActionContext<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            effects: Arc::clone(&self.effects),
        }
    }
}

impl<E> fmt::Debug for ActionContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

enum Handler<E> {
    Sync(SyncHandler<E>),
    Async(AsyncHandler<E>),
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        match self {
            Handler::Sync(f) => Handler::Sync(Arc::clone(f)),
            Handler::Async(f) => Handler::Async(Arc::clone(f)),
        }
    }
}

/// Registry of named actions.
///
/// Nested registries are flattened into dotted names: an action `add`
/// nested under `todos` is looked up as `todos.add`.
pub struct Actions<E = ()> {
    handlers: HashMap<String, Handler<E>>,
}

impl<E> Default for Actions<E> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<E> fmt::Debug for Actions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("names", &self.names())
            .finish()
    }
}

impl<E: 'static> Actions<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous action.
    pub fn register<F>(&mut self, name: impl Into<String>, action: F) -> StoreResult<()>
    where
        F: Fn(ActionContext<E>, Value) -> StoreResult<Value> + Send + Sync + 'static,
    {
        self.insert(name.into(), Handler::Sync(Arc::new(action)))
    }

    /// Register an async action.
    ///
    /// Writes made before an `.await` are committed before the action
    /// suspends; reads made after it see whatever other actions committed in
    /// the meantime.
    pub fn register_async<F, Fut>(&mut self, name: impl Into<String>, action: F) -> StoreResult<()>
    where
        F: Fn(ActionContext<E>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<Value>> + Send + 'static,
    {
        let handler: AsyncHandler<E> = Arc::new(
            move |ctx: ActionContext<E>, payload: Value| -> BoxFuture<StoreResult<Value>> {
                Box::pin(action(ctx, payload))
            },
        );
        self.insert(name.into(), Handler::Async(handler))
    }

    /// Move every action of `actions` in under `namespace`.
    pub fn nest(&mut self, namespace: &str, actions: Actions<E>) -> StoreResult<()> {
        for (name, handler) in actions.handlers {
            self.insert(format!("{namespace}.{name}"), handler)?;
        }
        Ok(())
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no action is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Whether an action is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    fn insert(&mut self, name: String, handler: Handler<E>) -> StoreResult<()> {
        if self.handlers.contains_key(&name) {
            return Err(StoreError::DuplicateAction { name });
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<Handler<E>> {
        self.handlers.get(name).cloned()
    }
}

impl<E> Actions<E> {
    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// An action bound to a store.
pub struct BoundAction<E = ()> {
    name: String,
    handler: Handler<E>,
    store: Store<E>,
}

impl<E: Send + Sync + 'static> BoundAction<E> {
    pub(crate) fn lookup(store: &Store<E>, name: &str) -> StoreResult<Self> {
        let handler = store
            .actions()
            .get(name)
            .ok_or_else(|| StoreError::UnknownAction {
                name: name.to_string(),
            })?;
        Ok(Self {
            name: name.to_string(),
            handler,
            store: store.clone(),
        })
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the action must be awaited.
    pub fn is_async(&self) -> bool {
        matches!(self.handler, Handler::Async(_))
    }

    /// Run a synchronous action to completion.
    pub fn call(&self, payload: impl Into<Value>) -> StoreResult<Value> {
        match &self.handler {
            Handler::Sync(action) => {
                let _span = debug_span!("action", name = %self.name).entered();
                action(self.store.context(), payload.into())
            }
            Handler::Async(_) => Err(StoreError::AsyncAction {
                name: self.name.clone(),
            }),
        }
    }

    /// Run the action, awaiting it when it is async.
    pub async fn call_async(&self, payload: impl Into<Value>) -> StoreResult<Value> {
        let payload = payload.into();
        let span = debug_span!("action", name = %self.name);
        match &self.handler {
            Handler::Sync(action) => span.in_scope(|| action(self.store.context(), payload)),
            Handler::Async(action) => action(self.store.context(), payload).instrument(span).await,
        }
    }
}

impl<E> fmt::Debug for BoundAction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("name", &self.name)
            .field("async", &matches!(self.handler, Handler::Async(_)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: ActionContext, _: Value) -> StoreResult<Value> {
        Ok(Value::Undefined)
    }

    #[test]
    fn test_register_and_names() {
        let mut actions = Actions::new();
        actions.register("b", noop).unwrap();
        actions.register("a", noop).unwrap();

        assert_eq!(actions.len(), 2);
        assert!(actions.contains("a"));
        assert_eq!(actions.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut actions = Actions::new();
        actions.register("a", noop).unwrap();
        let err = actions.register("a", noop).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateAction { name } if name == "a"));
    }

    #[test]
    fn test_nest_prefixes_names() {
        let mut todos = Actions::new();
        todos.register("add", noop).unwrap();
        todos
            .register_async("sync", |_, _| async { Ok(Value::Null) })
            .unwrap();

        let mut root = Actions::new();
        root.register("reset", noop).unwrap();
        root.nest("todos", todos).unwrap();

        assert_eq!(root.names(), vec!["reset", "todos.add", "todos.sync"]);
        assert!(!root.contains("add"));
    }

    #[test]
    fn test_nest_conflicts_surface() {
        let mut inner = Actions::new();
        inner.register("add", noop).unwrap();

        let mut root = Actions::new();
        root.register("todos.add", noop).unwrap();
        assert!(root.nest("todos", inner).is_err());
    }
}
