//! Error types for the store and action runner.

use rime_state::RimeError;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the action registry and by actions themselves.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No action is registered under the name.
    #[error("unknown action: {name}")]
    UnknownAction {
        /// The requested name.
        name: String,
    },

    /// An action is already registered under the name.
    #[error("action already registered: {name}")]
    DuplicateAction {
        /// The conflicting name.
        name: String,
    },

    /// A synchronous call was made to an async action.
    #[error("action {name} is async and must be awaited")]
    AsyncAction {
        /// The action name.
        name: String,
    },

    /// A typed lens read or write failed.
    #[error(transparent)]
    Lens(#[from] RimeError),

    /// The action reported a failure of its own.
    #[error("action failed: {0}")]
    Failed(String),
}

impl StoreError {
    /// Create an action failure.
    pub fn failed(message: impl Into<String>) -> Self {
        StoreError::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rime_state::path;

    #[test]
    fn test_error_display() {
        let err = StoreError::UnknownAction {
            name: "todos.add".into(),
        };
        assert_eq!(err.to_string(), "unknown action: todos.add");

        let err = StoreError::failed("empty title");
        assert_eq!(err.to_string(), "action failed: empty title");
    }

    #[test]
    fn test_lens_errors_convert() {
        fn read() -> StoreResult<()> {
            let lookup: Result<(), RimeError> = Err(RimeError::path_not_found(path!("todos", 0)));
            lookup?;
            Ok(())
        }
        let err = read().unwrap_err();
        assert!(matches!(err, StoreError::Lens(RimeError::PathNotFound { .. })));
        assert_eq!(err.to_string(), "path not found: $.todos[0]");
    }
}
