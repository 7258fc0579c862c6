//! Error types for the reactive runtime.

use thiserror::Error;

use crate::reactive::SubscriberId;

/// Errors raised while propagating changes through the reactive graph.
///
/// Plain signal reads never fail. Writes fail only when one of the
/// subscribers they notify fails, which in practice means a computed
/// signal's re-evaluation failed.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// A computation re-entered its own evaluation while it was still running.
    #[error("circular computation detected (subscriber {subscriber:?})")]
    CircularComputation { subscriber: SubscriberId },

    /// Nested computed re-runs went deeper than `RuntimeConfig::max_depth`.
    #[error("maximum evaluation depth of {limit} exceeded")]
    DepthExceeded { limit: usize },

    /// A computation failed with a plain message.
    #[error("{0}")]
    Failed(String),

    /// A computation failed with an arbitrary error.
    #[error(transparent)]
    User(Box<dyn std::error::Error + 'static>),

    /// The runtime configuration could not be parsed.
    #[error("invalid runtime config: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReactiveError {
    /// Build a failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wrap any error raised by user code.
    pub fn user<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::User(Box::new(error))
    }

    /// Whether this is the circular computation failure.
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularComputation { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let err = ReactiveError::CircularComputation {
            subscriber: SubscriberId::new(),
        };
        assert!(err.to_string().starts_with("circular computation detected"));
        assert!(err.is_circular());

        let err = ReactiveError::DepthExceeded { limit: 8 };
        assert_eq!(err.to_string(), "maximum evaluation depth of 8 exceeded");
        assert!(!err.is_circular());
    }

    #[test]
    fn user_errors_are_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ReactiveError::user(io);
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(ReactiveError::failed("nope").to_string(), "nope");
    }
}
