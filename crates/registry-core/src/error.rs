//! Error types for namespace registry operations.
//!
//! This module provides [`RegistryError`], covering every failure mode of the
//! registry. Lookup paths only ever surface [`RegistryError::NotReady`] and
//! [`RegistryError::NotFound`]; store failures are absorbed by the refresh
//! loop and are only visible from `start`.

use std::time::Duration;

/// Error type for namespace registry operations.
///
/// # Example
///
/// ```rust
/// use registry_core::RegistryError;
///
/// fn require_key(key: &str) -> Result<(), RegistryError> {
///     if key.is_empty() {
///         return Err(RegistryError::not_found(key));
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Lookup attempted before the first successful refresh.
    #[error("namespace registry not ready: initial refresh has not completed")]
    NotReady,

    /// The key is absent from the current snapshot.
    #[error("namespace not found: {key}")]
    NotFound {
        /// The name or id that missed.
        key: String,
    },

    /// A metadata store call failed.
    #[error("metadata store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failing call.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A metadata store call exceeded its per-call deadline.
    #[error("metadata store call timed out: {operation} after {timeout:?}")]
    StoreTimeout {
        /// The store operation that timed out.
        operation: &'static str,
        /// The deadline that was exceeded.
        timeout: Duration,
    },
}

impl RegistryError {
    /// Create a `NotFound` error for a missed lookup key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Wrap an arbitrary store error with context.
    pub fn store<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StoreUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a `StoreUnavailable` error without an underlying cause.
    pub fn store_message(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is transient from the caller's point of view.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}
