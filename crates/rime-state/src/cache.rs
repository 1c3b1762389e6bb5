//! Per-session proxy identity cache.
//!
//! Maps a tree node, at the position it was reached by, to the proxy created
//! for it, so reaching the same node at the same path twice yields the same
//! proxy. One node can sit at several positions at once (after a copy, or
//! after a reorder moves elements), and each position gets its own proxy so
//! writes land where they were made.
//!
//! Entries hold the proxy weakly: a proxy lives only as long as someone
//! holds it. Each entry also keeps its node alive, so the node's handle
//! cannot be recycled while the entry exists.

use crate::proxy::{Proxy, ProxyNode};
use crate::value::NodeId;
use crate::{Path, Value};
use std::collections::HashMap;
use std::sync::Weak;

struct CacheEntry {
    _node: Value,
    proxy: Weak<ProxyNode>,
}

/// Node-and-path to proxy identity map.
#[derive(Default)]
pub struct ProxyCache {
    entries: HashMap<(NodeId, Path), CacheEntry>,
}

impl ProxyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live proxy registered for `node` at `path`, if any.
    pub fn get(&self, node: &Value, path: &Path) -> Option<Proxy> {
        let id = node.node_id()?;
        self.entries
            .get(&(id, path.clone()))
            .and_then(|entry| entry.proxy.upgrade())
            .map(Proxy::from_node)
    }

    /// The proxy registered for `node` at `path`, creating and registering
    /// one with `create` on first encounter.
    ///
    /// Leaves are never cached; `create` runs every time for them.
    pub fn get_or_create(
        &mut self,
        node: &Value,
        path: &Path,
        create: impl FnOnce() -> Proxy,
    ) -> Proxy {
        if node.node_id().is_none() {
            return create();
        }
        if let Some(proxy) = self.get(node, path) {
            return proxy;
        }
        let proxy = create();
        self.insert(node, &proxy);
        proxy
    }

    /// Register `proxy` for `node` at the proxy's own path, replacing any
    /// previous entry there.
    pub fn insert(&mut self, node: &Value, proxy: &Proxy) {
        let Some(id) = node.node_id() else {
            return;
        };
        self.prune();
        self.entries.insert(
            (id, proxy.path().clone()),
            CacheEntry {
                _node: node.clone(),
                proxy: proxy.downgrade(),
            },
        );
    }

    /// Number of entries, dead ones included until the next prune.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose proxy is gone.
    pub fn prune(&mut self) {
        self.entries.retain(|_, entry| entry.proxy.strong_count() > 0);
    }
}

impl std::fmt::Debug for ProxyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, DocCell, Session};
    use serde_json::json;
    use std::sync::Arc;

    fn session() -> Session {
        Session::new(Arc::new(DocCell::new(Value::from(json!({"a": {"b": 1}})))))
    }

    #[test]
    fn test_same_node_same_proxy() {
        let session = session();
        let node = session.state()["a"].clone();
        let at = path!("a");
        let mut cache = ProxyCache::new();

        let first = cache.get_or_create(&node, &at, || Proxy::new(session.clone(), at.clone()));
        let second = cache.get_or_create(&node, &at, || panic!("should be cached"));
        assert!(first.ptr_eq(&second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_node_at_another_path_gets_its_own_proxy() {
        let session = session();
        let node = session.state()["a"].clone();
        let (a, b) = (path!("a"), path!("b"));
        let mut cache = ProxyCache::new();

        let first = cache.get_or_create(&node, &a, || Proxy::new(session.clone(), a.clone()));
        let second = cache.get_or_create(&node, &b, || Proxy::new(session.clone(), b.clone()));
        assert!(!first.ptr_eq(&second));
        assert_eq!(second.path(), &b);
        assert!(cache.get(&node, &a).unwrap().ptr_eq(&first));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_leaves_are_not_cached() {
        let session = session();
        let mut cache = ProxyCache::new();
        let leaf = Value::from(1);
        let at = path!("a", "b");

        let a = cache.get_or_create(&leaf, &at, || Proxy::new(session.clone(), at.clone()));
        let b = cache.get_or_create(&leaf, &at, || Proxy::new(session.clone(), at.clone()));
        assert!(!a.ptr_eq(&b));
        assert!(cache.is_empty());
        assert!(cache.get(&leaf, &at).is_none());
    }

    #[test]
    fn test_dead_entries_are_pruned() {
        let session = session();
        let mut cache = ProxyCache::new();
        let first = Value::from(json!({"x": 1}));
        let second = Value::from(json!({"y": 2}));
        let at = path!("a");

        let proxy = cache.get_or_create(&first, &at, || Proxy::new(session.clone(), at.clone()));
        drop(proxy);
        assert!(cache.get(&first, &at).is_none());

        let _kept = cache.get_or_create(&second, &at, || Proxy::new(session.clone(), at.clone()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_rebinds() {
        let session = session();
        let mut cache = ProxyCache::new();
        let node = Value::from(json!([1]));
        let at = path!("a");

        let old = cache.get_or_create(&node, &at, || Proxy::new(session.clone(), at.clone()));
        let new = Proxy::new(session.clone(), at.clone());
        cache.insert(&node, &new);
        assert!(cache.get(&node, &at).unwrap().ptr_eq(&new));
        assert!(!cache.get(&node, &at).unwrap().ptr_eq(&old));
    }
}
