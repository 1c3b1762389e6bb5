//! The hosting store.
//!
//! A [`Store`] owns the current tree and is the only place descriptors are
//! committed. Each dispatch is one complete state transition. Commits are
//! serialised by a commit lock; the reducer runs on a snapshot with the state
//! lock released, so comparators may read the store, and the state lock is
//! held only to swap in the new root. Subscribers are notified after both
//! locks are released.

use crate::action::{ActionContext, Actions, BoundAction};
use crate::{Reducer, StoreOptions, StoreResult};
use parking_lot::{Mutex, RwLock};
use rime_state::{Host, Mutation, Session, Value};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, debug_span, trace, Instrument};

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

struct StoreCore {
    state: RwLock<Value>,
    commit: Mutex<()>,
    reducer: Reducer,
    options: StoreOptions,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_listener: AtomicU64,
}

impl StoreCore {
    fn commit(&self, mutation: &Mutation) -> Value {
        let (state, result) = {
            let _commit = self.commit.lock();
            let current = self.state.read().clone();
            let applied = self.reducer.reduce(&current, mutation);
            *self.state.write() = applied.state.clone();
            (applied.state, applied.result)
        };

        if self.options.debug {
            debug!(target: "rime::mutation", kind = %mutation.kind, path = %mutation.path, "committed");
        } else {
            trace!(target: "rime::mutation", kind = %mutation.kind, path = %mutation.path, "committed");
        }

        // Listeners may subscribe or dispatch themselves.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&state);
        }

        result
    }
}

impl Host for StoreCore {
    fn state(&self) -> Value {
        self.state.read().clone()
    }

    fn dispatch(&self, mutation: Mutation) {
        self.commit(&mutation);
    }
}

/// Cheap-clone handle to a store.
///
/// # Examples
///
/// ```
/// use rime::Store;
/// use serde_json::json;
///
/// let store = Store::combined(json!({"foo": {"bar": "baz"}}));
/// store.run(|ctx, _| ctx.state.at("foo").set("bar", "baz2"), ());
///
/// assert_eq!(store.state(), json!({"foo": {"bar": "baz2"}}));
/// ```
pub struct Store<E = ()> {
    core: Arc<StoreCore>,
    effects: Arc<E>,
    actions: Arc<Actions<E>>,
}

impl<E> Clone for Store<E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            effects: Arc::clone(&self.effects),
            actions: Arc::clone(&self.actions),
        }
    }
}

impl Store<()> {
    /// A store over one flat tree, with no effects or actions.
    pub fn flat(initial: impl Into<Value>) -> Self {
        Self::new(
            Reducer::Flat(initial.into()),
            (),
            Actions::new(),
            StoreOptions::from_env(),
        )
    }

    /// A combined store with one namespace per top-level key of `initial`.
    pub fn combined(initial: impl Into<Value>) -> Self {
        Self::new(
            Reducer::from_namespaces(&initial.into()),
            (),
            Actions::new(),
            StoreOptions::from_env(),
        )
    }
}

impl<E: Send + Sync + 'static> Store<E> {
    /// Create a store.
    pub fn new(reducer: Reducer, effects: E, actions: Actions<E>, options: StoreOptions) -> Self {
        debug!(
            namespaces = ?reducer.namespaces(),
            actions = actions.len(),
            debug = options.debug,
            "store created"
        );
        let state = reducer.initial_state();
        Self {
            core: Arc::new(StoreCore {
                state: RwLock::new(state),
                commit: Mutex::new(()),
                reducer,
                options,
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
            }),
            effects: Arc::new(effects),
            actions: Arc::new(actions),
        }
    }

    /// The current tree.
    pub fn state(&self) -> Value {
        self.core.state()
    }

    /// Commit one descriptor. Returns what the operation surfaces.
    pub fn dispatch(&self, mutation: Mutation) -> Value {
        self.core.commit(&mutation)
    }

    /// Call `listener` with the new tree after every dispatch.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.core.next_listener.fetch_add(1, Ordering::Relaxed));
        self.core.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.core.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// The effects handed to every action.
    pub fn effects(&self) -> &Arc<E> {
        &self.effects
    }

    /// The options the store was created with.
    pub fn options(&self) -> StoreOptions {
        self.core.options
    }

    /// The reducer descriptors go through.
    pub fn reducer(&self) -> &Reducer {
        &self.core.reducer
    }

    /// The registered actions.
    pub fn actions(&self) -> &Actions<E> {
        &self.actions
    }

    /// A context over a fresh session.
    pub fn context(&self) -> ActionContext<E> {
        let session = Session::new(self.core.clone());
        ActionContext {
            state: session.root(),
            effects: Arc::clone(&self.effects),
        }
    }

    /// Run `body` as an action.
    pub fn run<P, R>(&self, body: impl FnOnce(ActionContext<E>, P) -> R, payload: P) -> R {
        let _span = debug_span!("action").entered();
        body(self.context(), payload)
    }

    /// Run an async `body` as an action.
    ///
    /// Every write is committed when it is made, so other actions running
    /// while this one is suspended see it.
    pub async fn run_async<P, F, Fut>(&self, body: F, payload: P) -> Fut::Output
    where
        F: FnOnce(ActionContext<E>, P) -> Fut,
        Fut: Future,
    {
        body(self.context(), payload)
            .instrument(debug_span!("action"))
            .await
    }

    /// The action registered under `name`, bound to this store.
    pub fn action(&self, name: &str) -> StoreResult<BoundAction<E>> {
        BoundAction::lookup(self, name)
    }
}

impl<E> fmt::Debug for Store<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("reducer", &self.core.reducer)
            .field("options", &self.core.options)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rime_state::path;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_returns_protocol_result() {
        let store = Store::flat(json!({"xs": [1]}));
        assert_eq!(store.dispatch(Mutation::push(path!("xs"), vec![2.into()])), 2i64);
        assert_eq!(store.dispatch(Mutation::delete(path!("xs"))), true);
        assert_eq!(store.state(), json!({}));
    }

    #[test]
    fn test_subscribers_see_each_new_tree() {
        let store = Store::flat(json!({"n": 0}));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |state| sink.lock().push(state["n"].clone()));

        store.dispatch(Mutation::set(path!("n"), 1));
        store.dispatch(Mutation::set(path!("n"), 2));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(Mutation::set(path!("n"), 3));

        assert_eq!(*seen.lock(), vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn test_listener_may_read_the_store() {
        let store = Store::flat(json!({"n": 0}));
        let reads = Arc::new(AtomicUsize::new(0));

        let handle = store.clone();
        let counter = Arc::clone(&reads);
        store.subscribe(move |_| {
            if handle.state()["n"] == 1i64 {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.dispatch(Mutation::set(path!("n"), 1));
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_each_run_gets_a_fresh_session() {
        let store = Store::combined(json!({"foo": {"bar": {"x": 1}}}));
        let first = store.run(|ctx, _| ctx.state.at("foo"), ());
        let second = store.run(|ctx, _| ctx.state.at("foo"), ());
        assert!(!first.ptr_eq(&second));
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn test_options_are_kept() {
        let store = Store::new(
            Reducer::Flat(Value::empty_object()),
            (),
            Actions::new(),
            StoreOptions::default().with_debug(false),
        );
        assert!(!store.options().debug);
    }
}
