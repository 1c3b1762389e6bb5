//! Store configuration and the `create` entry point.

use crate::{Actions, Reducer, Store, StoreOptions};
use rime_state::Value;

/// Everything a store is created from.
pub struct Config<E = ()> {
    /// Initial tree. Each top-level key becomes a namespace.
    pub state: Value,
    /// Effects handed to every action.
    pub effects: E,
    /// Registered actions.
    pub actions: Actions<E>,
    /// Store options.
    pub options: StoreOptions,
}

impl Config<()> {
    /// Configuration with no effects.
    pub fn new(state: impl Into<Value>) -> Self {
        Config::with_effects(state, ())
    }
}

impl<E: Send + Sync + 'static> Config<E> {
    /// Configuration with `effects`, no actions, and options read from the
    /// environment.
    pub fn with_effects(state: impl Into<Value>, effects: E) -> Self {
        Self {
            state: state.into(),
            effects,
            actions: Actions::new(),
            options: StoreOptions::from_env(),
        }
    }

    /// Replace the registered actions.
    pub fn actions(mut self, actions: Actions<E>) -> Self {
        self.actions = actions;
        self
    }

    /// Replace the options.
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }
}

/// Create a combined store from `config`.
///
/// ```
/// use rime::{create, Actions, Config, StoreResult, Value};
/// use serde_json::json;
///
/// let mut actions = Actions::new();
/// actions.register("rename", |ctx, payload| -> StoreResult<Value> {
///     ctx.state.at("foo").set("bar", payload);
///     Ok(Value::Undefined)
/// })?;
///
/// let store = create(Config::new(json!({"foo": {"bar": "baz"}})).actions(actions));
/// store.action("rename")?.call("baz2")?;
/// assert_eq!(store.state(), json!({"foo": {"bar": "baz2"}}));
/// # Ok::<(), rime::StoreError>(())
/// ```
pub fn create<E: Send + Sync + 'static>(config: Config<E>) -> Store<E> {
    Store::new(
        Reducer::from_namespaces(&config.state),
        config.effects,
        config.actions,
        config.options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Effects {
        greeting: &'static str,
    }

    #[test]
    fn test_create_uses_top_level_keys_as_namespaces() {
        let store = create(Config::new(json!({"foo": {"bar": "baz"}, "count": 0})));
        assert_eq!(store.reducer().namespaces(), vec!["foo", "count"]);
        assert_eq!(store.state(), json!({"foo": {"bar": "baz"}, "count": 0}));
    }

    #[test]
    fn test_effects_and_options_reach_the_store() {
        let config = Config::with_effects(json!({}), Effects { greeting: "hi" })
            .options(StoreOptions::default().with_debug(false));
        let store = create(config);

        assert_eq!(store.effects().greeting, "hi");
        assert!(!store.options().debug);
        let greeting = store.run(|ctx, _| ctx.effects.greeting, ());
        assert_eq!(greeting, "hi");
    }
}
