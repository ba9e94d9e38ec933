//! Store error types.

/// Errors that can occur during store operations.
///
/// `NotFound` is an expected outcome of `get` on an absent key;
/// `Connection` means the reconnect budget was exhausted and is the only
/// store error that is allowed to reach the dispatch boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is absent from the primary partition.
    #[error("no key {key} in the primary partition")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The connection to a partition could not be (re)established.
    #[error("store connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Returns `true` if this error means the key was simply absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
