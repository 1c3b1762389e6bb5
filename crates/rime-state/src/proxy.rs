//! Mutation-tracking proxies.
//!
//! A [`Proxy`] is a view of one position in a state tree. Reads go to the
//! host's *current* tree every time, so code holding a proxy always sees the
//! latest committed state. Writes never touch the tree: each one becomes a
//! [`Mutation`] handed to the host, which decides how to commit it.
//!
//! Proxies are created through a [`Session`], one per action invocation. The
//! session owns the identity cache that makes two routes to the same node at
//! the same position yield the same proxy.

use crate::array;
use crate::cache::ProxyCache;
use crate::{parse_path, resolve, Comparator, Lens, Mutation, MutationKind, Path, Seg, Value};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Where proxies read state from and send descriptors to.
pub trait Host: Send + Sync {
    /// The current committed tree.
    fn state(&self) -> Value;

    /// Commit one descriptor. Reads made after this returns must observe it.
    fn dispatch(&self, mutation: Mutation);
}

struct SessionInner {
    host: Arc<dyn Host>,
    cache: Mutex<ProxyCache>,
}

/// One action invocation's binding of a host and an identity cache.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct Session(Arc<SessionInner>);

impl Session {
    /// Start a session against `host` with an empty identity cache.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self(Arc::new(SessionInner {
            host,
            cache: Mutex::new(ProxyCache::new()),
        }))
    }

    /// Proxy for the whole tree.
    pub fn root(&self) -> Proxy {
        self.proxy_at(Path::root())
    }

    /// Proxy for the node currently at `path`.
    pub fn proxy_at(&self, path: Path) -> Proxy {
        let node = resolve(&self.state(), &path).clone();
        self.cached(&node, path)
    }

    /// Typed lens at a dot-separated path.
    pub fn lens<T: Lens>(&self, path: &str) -> T::View {
        T::lens(self.proxy_at(parse_path(path)))
    }

    /// Typed lens at the type's bound path (the root when it has none).
    pub fn lens_of<T: Lens>(&self) -> T::View {
        self.lens::<T>(T::PATH)
    }

    /// The host's current tree.
    pub fn state(&self) -> Value {
        self.0.host.state()
    }

    /// Number of entries in the identity cache.
    pub fn cached_proxies(&self) -> usize {
        self.0.cache.lock().len()
    }

    fn dispatch(&self, mutation: Mutation) {
        trace!(kind = %mutation.kind, path = %mutation.path, "intercepted write");
        self.0.host.dispatch(mutation);
    }

    fn cached(&self, node: &Value, path: Path) -> Proxy {
        self.0
            .cache
            .lock()
            .get_or_create(node, &path, || Proxy::new(self.clone(), path.clone()))
    }

    fn rebind(&self, node: &Value, proxy: &Proxy) {
        self.0.cache.lock().insert(node, proxy);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cached_proxies", &self.cached_proxies())
            .finish()
    }
}

pub(crate) struct ProxyNode {
    session: Session,
    path: Path,
}

/// A view of one position in the tree.
#[derive(Clone)]
pub struct Proxy(Arc<ProxyNode>);

/// What reading a key through a proxy yields.
#[derive(Clone, Debug)]
pub enum Entry {
    /// An interior node, wrapped in its proxy.
    Node(Proxy),
    /// A leaf, or `Undefined` when the key is missing.
    Value(Value),
}

impl Entry {
    /// The proxy, when this is a node.
    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Entry::Node(proxy) => Some(proxy),
            Entry::Value(_) => None,
        }
    }

    /// The proxy, when this is a node.
    pub fn into_proxy(self) -> Option<Proxy> {
        match self {
            Entry::Node(proxy) => Some(proxy),
            Entry::Value(_) => None,
        }
    }

    /// Whether this is a node.
    pub fn is_node(&self) -> bool {
        matches!(self, Entry::Node(_))
    }

    /// The plain value; for a node, its current target.
    pub fn value(&self) -> Value {
        match self {
            Entry::Node(proxy) => proxy.value(),
            Entry::Value(value) => value.clone(),
        }
    }
}

impl Proxy {
    pub(crate) fn new(session: Session, path: Path) -> Self {
        Self(Arc::new(ProxyNode { session, path }))
    }

    pub(crate) fn from_node(node: Arc<ProxyNode>) -> Self {
        Self(node)
    }

    pub(crate) fn downgrade(&self) -> Weak<ProxyNode> {
        Arc::downgrade(&self.0)
    }

    /// The path this proxy was reached by.
    pub fn path(&self) -> &Path {
        &self.0.path
    }

    /// The session this proxy belongs to.
    pub fn session(&self) -> &Session {
        &self.0.session
    }

    /// Proxy identity.
    pub fn ptr_eq(&self, other: &Proxy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The current target, unwrapped.
    pub fn value(&self) -> Value {
        self.with_value(Value::clone)
    }

    /// Run `f` against the current target.
    pub fn with_value<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let root = self.session().state();
        f(resolve(&root, self.path()))
    }

    /// Read a child.
    ///
    /// Interior nodes come back as proxies bound to `path + [key]`; the same
    /// node at the same path yields the same proxy while that proxy is alive.
    pub fn get(&self, key: impl Into<Seg>) -> Entry {
        let seg = key.into();
        let child = self.with_value(|target| target.get(&seg).cloned().unwrap_or_default());
        if child.is_container() {
            Entry::Node(self.session().cached(&child, self.path().with_segment(seg)))
        } else {
            Entry::Value(child)
        }
    }

    /// Proxy for a child, whether or not it exists yet.
    pub fn at(&self, key: impl Into<Seg>) -> Proxy {
        let seg = key.into();
        match self.get(seg.clone()) {
            Entry::Node(proxy) => proxy,
            Entry::Value(_) => Proxy::new(self.session().clone(), self.path().with_segment(seg)),
        }
    }

    /// A child's current value, unwrapped.
    pub fn get_value(&self, key: impl Into<Seg>) -> Value {
        let seg = key.into();
        self.with_value(|target| target.get(&seg).cloned().unwrap_or_default())
    }

    /// Assign a child. Returns the assigned value.
    pub fn set(&self, key: impl Into<Seg>, value: impl Into<Value>) -> Value {
        let value = value.into();
        let path = self.path().with_segment(key.into());
        self.session().dispatch(Mutation::set(path, value.clone()));
        value
    }

    /// Remove a child. Always reports success.
    pub fn delete(&self, key: impl Into<Seg>) -> bool {
        let path = self.path().with_segment(key.into());
        self.session().dispatch(Mutation::delete(path));
        true
    }

    /// The target's keys: indices for arrays, names for objects.
    pub fn keys(&self) -> Vec<Seg> {
        self.with_value(|target| match target {
            Value::Array(items) => (0..items.len()).map(Seg::Index).collect(),
            Value::Object(map) => map.keys().map(Seg::key).collect(),
            _ => Vec::new(),
        })
    }

    /// Whether the target has the key.
    pub fn has(&self, key: impl Into<Seg>) -> bool {
        let seg = key.into();
        self.with_value(|target| target.get(&seg).is_some())
    }

    /// The raw value stored under the key, if present.
    pub fn describe(&self, key: impl Into<Seg>) -> Option<Value> {
        let seg = key.into();
        self.with_value(|target| target.get(&seg).cloned())
    }

    /// Number of children of the target.
    pub fn len(&self) -> usize {
        self.with_value(Value::len)
    }

    /// Whether the target has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap this proxy in `T`'s typed lens.
    pub fn lens<T: Lens>(&self) -> T::View {
        T::lens(self.clone())
    }

    // ========================================================================
    // Array mutations
    // ========================================================================

    /// Append items. Returns the new length, or `Undefined` when the target
    /// is a non-array value and is left alone.
    pub fn push<I, V>(&self, items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let len = self.grown_len(items.len());
        self.session().dispatch(Mutation::push(self.path().clone(), items));
        len
    }

    /// Remove the last element and return it.
    pub fn pop(&self) -> Value {
        let last = self.with_value(|target| {
            array::editable(target)
                .and_then(|items| items.last().cloned())
                .unwrap_or_default()
        });
        self.session().dispatch(Mutation::pop(self.path().clone()));
        last
    }

    /// Remove the first element and return it.
    pub fn shift(&self) -> Value {
        let first = self.with_value(|target| {
            array::editable(target)
                .and_then(|items| items.first().cloned())
                .unwrap_or_default()
        });
        self.session().dispatch(Mutation::shift(self.path().clone()));
        first
    }

    /// Prepend items. Returns the new length, or `Undefined` when the
    /// target is a non-array value and is left alone.
    pub fn unshift<I, V>(&self, items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let len = self.grown_len(items.len());
        self.session().dispatch(Mutation::unshift(self.path().clone(), items));
        len
    }

    /// Remove `delete_count` elements at `start` and insert `items` there.
    /// Returns the removed elements as an array.
    ///
    /// A negative `start` counts from the end. Without a count, everything
    /// from `start` onward is removed.
    pub fn splice<I, V>(&self, start: i64, delete_count: Option<usize>, items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let mut args = vec![Value::from(start)];
        match delete_count {
            Some(count) => args.push(Value::from(count)),
            None if !items.is_empty() => {
                let len = self.array_len();
                args.push(Value::from(len - array::relative_index(start, len)));
            }
            None => {}
        }
        args.extend(items);
        self.splice_args(args)
    }

    /// Reverse in place. Returns the proxy for the reversed array.
    pub fn reverse(&self) -> Proxy {
        self.reorder(Mutation::reverse(self.path().clone()))
    }

    /// Sort in the default order. Returns the proxy for the sorted array.
    pub fn sort(&self) -> Proxy {
        self.reorder(Mutation::sort(self.path().clone()))
    }

    /// Sort with a comparator. Returns the proxy for the sorted array.
    pub fn sort_by<F>(&self, compare: F) -> Proxy
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        self.reorder(Mutation::sort_by(self.path().clone(), Comparator::new(compare)))
    }

    /// Copy `start..end` over the elements at `target`. Returns the proxy for
    /// the resulting array.
    pub fn copy_within(&self, target: i64, start: i64, end: Option<i64>) -> Proxy {
        let mut args = vec![Value::from(target), Value::from(start)];
        args.extend(end.map(Value::from));
        self.reorder(Mutation::copy_within(self.path().clone(), args))
    }

    /// Invoke an array method by name with raw arguments.
    ///
    /// Covers the mutating methods (`push`, `shift`, `pop`, `unshift`,
    /// `splice`, `reverse`, `sort`, `copyWithin`); any other name yields
    /// `None`.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Option<Entry> {
        let kind = MutationKind::from_method(method)?;
        let path = self.path().clone();
        Some(match kind {
            MutationKind::Push => Entry::Value(self.push(args)),
            MutationKind::Unshift => Entry::Value(self.unshift(args)),
            MutationKind::Shift => Entry::Value(self.shift()),
            MutationKind::Pop => Entry::Value(self.pop()),
            MutationKind::Splice => Entry::Value(self.splice_args(args)),
            MutationKind::Reverse => Entry::Node(self.reverse()),
            MutationKind::Sort => Entry::Node(self.sort()),
            MutationKind::CopyWithin => Entry::Node(self.reorder(Mutation::copy_within(path, args))),
            MutationKind::Set | MutationKind::Delete | MutationKind::Unknown => return None,
        })
    }

    fn array_len(&self) -> usize {
        self.with_value(|target| target.as_array().map_or(0, <[Value]>::len))
    }

    fn grown_len(&self, added: usize) -> Value {
        self.with_value(|target| {
            array::editable(target).map_or(Value::Undefined, |items| Value::from(items.len() + added))
        })
    }

    fn splice_args(&self, args: Vec<Value>) -> Value {
        let removed = self.with_value(|target| {
            array::editable(target).map(|items| {
                let mut snapshot = items.to_vec();
                Value::array(array::splice(&mut snapshot, &args))
            })
        });
        self.session().dispatch(Mutation::splice(self.path().clone(), args));
        removed.unwrap_or_default()
    }

    fn reorder(&self, mutation: Mutation) -> Proxy {
        self.session().dispatch(mutation);
        let proxy = Proxy::new(self.session().clone(), self.path().clone());
        self.session().rebind(&self.value(), &proxy);
        proxy
    }

    // ========================================================================
    // Read-only transforms
    // ========================================================================

    /// Map over the elements of the current target.
    pub fn map<R>(&self, mut f: impl FnMut(&Value, usize) -> R) -> Vec<R> {
        let target = self.value();
        target
            .as_array()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, item)| f(item, i))
            .collect()
    }

    /// Elements of the current target matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&Value, usize) -> bool) -> Vec<Value> {
        let target = self.value();
        target
            .as_array()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter(|(i, item)| predicate(*item, *i))
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// First element of the current target matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&Value, usize) -> bool) -> Option<Value> {
        let target = self.value();
        target
            .as_array()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .find(|(i, item)| predicate(*item, *i))
            .map(|(_, item)| item.clone())
    }

    /// Fold the elements of the current target.
    pub fn reduce<A>(&self, init: A, mut f: impl FnMut(A, &Value, usize) -> A) -> A {
        let target = self.value();
        target
            .as_array()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .fold(init, |acc, (i, item)| f(acc, item, i))
    }

    /// Visit each element position through the proxy layer.
    ///
    /// The callback receives what [`Proxy::get`] yields for each index, so
    /// writes made through it are intercepted like any other.
    pub fn for_each(&self, mut f: impl FnMut(Entry, usize)) {
        for i in 0..self.len() {
            f(self.get(i), i);
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Proxy").field(&self.0.path.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, DocCell};
    use serde_json::json;

    fn session(doc: serde_json::Value) -> (Arc<DocCell>, Session) {
        let cell = Arc::new(DocCell::new(Value::from(doc)));
        let session = Session::new(cell.clone());
        (cell, session)
    }

    #[test]
    fn test_get_returns_node_or_value() {
        let (_, session) = session(json!({"foo": {"bar": "baz"}}));
        let root = session.root();

        let foo = root.get("foo");
        assert!(foo.is_node());
        assert_eq!(foo.as_proxy().unwrap().path(), &path!("foo"));
        assert_eq!(root.at("foo").get_value("bar"), "baz");
        assert!(root.get_value("missing").is_undefined());
    }

    #[test]
    fn test_same_node_yields_same_proxy() {
        let (_, session) = session(json!({"foo": {"bar": [1]}}));
        let root = session.root();
        let a = root.at("foo").at("bar");
        let b = root.at("foo").at("bar");
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_writes_dispatch_and_reads_see_them() {
        let (cell, session) = session(json!({"foo": {"bar": "baz"}}));
        let foo = session.root().at("foo");

        assert_eq!(foo.set("bar", "qux"), "qux");
        assert_eq!(foo.get_value("bar"), "qux");
        assert_eq!(cell.get()["foo"]["bar"], "qux");

        assert!(foo.delete("bar"));
        assert!(!foo.has("bar"));
    }

    #[test]
    fn test_at_missing_child_allows_writes() {
        let (cell, session) = session(json!({}));
        session.root().at("a").at("b").set("c", 1);
        assert_eq!(cell.get(), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_array_method_results() {
        let (_, session) = session(json!({"list": ["foo", "bar"]}));
        let list = session.root().at("list");

        assert_eq!(list.push(["baz"]), 3i64);
        assert_eq!(list.unshift(["zero"]), 4i64);
        assert_eq!(list.shift(), "zero");
        assert_eq!(list.pop(), "baz");
        assert_eq!(list.splice(1, Some(1), ["baz"]), json!(["bar"]));
        assert_eq!(list.value(), json!(["foo", "baz"]));
    }

    #[test]
    fn test_array_methods_on_non_array_surface_undefined() {
        let (cell, session) = session(json!({"foo": {"bar": "text"}}));
        let bar = session.root().at("foo").at("bar");

        assert!(bar.push(["x"]).is_undefined());
        assert!(bar.unshift(["x"]).is_undefined());
        assert!(bar.splice(0, Some(1), ["x"]).is_undefined());
        assert!(bar.pop().is_undefined());
        assert_eq!(cell.get(), json!({"foo": {"bar": "text"}}));

        let fresh = session.root().at("foo").at("fresh");
        assert_eq!(fresh.push(["x"]), 1i64);
        assert_eq!(cell.get()["foo"]["fresh"], json!(["x"]));
    }

    #[test]
    fn test_splice_without_count() {
        let (_, session) = session(json!({"list": [1, 2, 3, 4]}));
        let list = session.root().at("list");

        assert_eq!(list.splice(-1, None, ["x", "y"]), json!([4]));
        assert_eq!(list.value(), json!([1, 2, 3, "x", "y"]));
        assert_eq!(list.splice(2, None, Vec::<Value>::new()), json!([3, "x", "y"]));
        assert_eq!(list.value(), json!([1, 2]));
    }

    #[test]
    fn test_reordering_returns_cached_proxy() {
        let (_, session) = session(json!({"foo": {"bar": ["foo", "bar"]}}));
        let root = session.root();

        let reversed = root.at("foo").at("bar").reverse();
        assert!(reversed.ptr_eq(&root.at("foo").at("bar")));
        assert_eq!(reversed.value(), json!(["bar", "foo"]));

        let sorted = reversed.sort_by(|a, b| b.as_str().cmp(&a.as_str()));
        assert!(sorted.ptr_eq(&root.at("foo").at("bar")));
        assert_eq!(sorted.value(), json!(["foo", "bar"]));

        let copied = sorted.copy_within(0, 1, None);
        assert_eq!(copied.value(), json!(["bar", "bar"]));
    }

    #[test]
    fn test_call_by_method_name() {
        let (_, session) = session(json!({"list": [3, 1, 2]}));
        let list = session.root().at("list");

        let pushed = list.call("push", vec![4.into()]).unwrap();
        assert_eq!(pushed.value(), 4i64);
        let sorted = list.call("sort", vec![]).unwrap();
        assert!(sorted.is_node());
        assert_eq!(list.value(), json!([1, 2, 3, 4]));
        let copied = list.call("copyWithin", vec![0.into(), 2.into()]).unwrap();
        assert_eq!(copied.value(), json!([3, 4, 3, 4]));
        assert!(list.call("map", vec![]).is_none());
    }

    #[test]
    fn test_read_only_transforms() {
        let (_, session) = session(json!({"n": [1, 2, 3, 4]}));
        let n = session.root().at("n");

        assert_eq!(n.map(|v, _| v.as_i64().unwrap() * 10), [10, 20, 30, 40]);
        assert_eq!(n.filter(|v, _| v.as_i64().unwrap() % 2 == 0).len(), 2);
        assert_eq!(n.find(|v, _| v.as_i64() > Some(2)), Some(Value::from(3)));
        assert_eq!(n.reduce(0, |acc, v, _| acc + v.as_i64().unwrap()), 10);
    }

    #[test]
    fn test_for_each_routes_writes() {
        let (cell, session) = session(json!({"items": [{"done": false}, {"done": false}]}));
        let items = session.root().at("items");

        items.for_each(|entry, _| {
            if let Some(item) = entry.as_proxy() {
                item.set("done", true);
            }
        });
        assert_eq!(cell.get(), json!({"items": [{"done": true}, {"done": true}]}));
    }

    #[test]
    fn test_observational_delegation() {
        let (_, session) = session(json!({"obj": {"a": 1, "b": 2}, "list": ["x"]}));
        let root = session.root();

        assert_eq!(root.at("obj").keys(), [Seg::key("a"), Seg::key("b")]);
        assert_eq!(root.at("list").keys(), [Seg::Index(0)]);
        assert!(root.at("obj").has("a"));
        assert_eq!(root.at("obj").describe("b"), Some(Value::from(2)));
        assert_eq!(root.at("obj").describe("c"), None);
        assert_eq!(root.at("list").len(), 1);
        assert!(!root.at("list").is_empty());
    }

    #[test]
    fn test_proxy_sees_latest_state() {
        let (cell, session) = session(json!({"foo": {"bar": "baz"}}));
        let foo = session.root().at("foo");
        cell.apply(&Mutation::set(path!("foo", "bar"), "changed"));
        assert_eq!(foo.get_value("bar"), "changed");
    }

    #[test]
    fn test_cache_is_per_session() {
        let cell = Arc::new(DocCell::new(Value::from(json!({"foo": {}}))));
        let first = Session::new(cell.clone());
        let second = Session::new(cell);
        assert!(!first.root().at("foo").ptr_eq(&second.root().at("foo")));
    }
}
