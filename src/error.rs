//! Error types for XA recovery

use thiserror::Error;

/// Result type for XA operations
pub type XaResult<T> = std::result::Result<T, XaError>;

/// Errors surfaced by XA connection handling and delegated 2PC operations
#[derive(Debug, Error)]
pub enum XaError {
    /// The resource manager could not be reached. Transient; callers are
    /// expected to retry on a later recovery cycle.
    #[error("resource manager unavailable: {0}")]
    ResourceManagerUnavailable(String),

    /// A delegated two-phase-commit operation failed. Propagated verbatim
    /// to the transaction manager, which applies its own outcome policy.
    #[error("xa operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for recovery engine operations
pub type RecoveryResult<T> = std::result::Result<T, RecoveryError>;

/// Errors surfaced by recovery engine lifecycle and helper registration
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("recovery engine failure: {0}")]
    Engine(String),

    /// Helper registration was attempted before the engine's recovery
    /// module existed. Fatal misconfiguration, not retried.
    #[error("recovery module is not registered with the recovery engine")]
    ModuleNotRegistered,
}
