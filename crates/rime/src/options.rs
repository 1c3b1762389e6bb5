//! Store options.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable naming the deployment environment.
pub const ENV_VAR: &str = "RIME_ENV";

/// Environment variable overriding [`StoreOptions::debug`].
pub const DEBUG_VAR: &str = "RIME_DEBUG";

/// Options a store is created with.
///
/// Deserializes from partial input; missing fields take their defaults.
///
/// ```
/// use rime::StoreOptions;
///
/// let options: StoreOptions = serde_json::from_str("{}").unwrap();
/// assert!(options.debug);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Log every committed mutation at `debug` level instead of `trace`.
    pub debug: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { debug: true }
    }
}

impl StoreOptions {
    /// Options with `debug` set explicitly.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Options read from the process environment.
    ///
    /// See [`StoreOptions::from_lookup`] for the rules.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Options read through `lookup`.
    ///
    /// Starts from the defaults. `RIME_ENV=production` or `RIME_ENV=test`
    /// turns debugging off; `RIME_DEBUG` (`1`/`true`/`on` or `0`/`false`/`off`)
    /// then overrides it either way. Unrecognised values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(env) = lookup(ENV_VAR) {
            if matches!(env.trim(), "production" | "test") {
                options.debug = false;
            }
        }

        if let Some(flag) = lookup(DEBUG_VAR) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => options.debug = true,
                "0" | "false" | "off" | "no" => options.debug = false,
                other => warn!(value = other, "ignoring unrecognised {DEBUG_VAR}"),
            }
        }

        options
    }
}
