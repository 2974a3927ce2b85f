//! Error types for the client driver.

use std::time::Duration;

use sealframe_core::FrameError;
use thiserror::Error;

/// Errors from session-level operations.
///
/// Per-frame failures stay in [`FrameError`] and convert to drops;
/// variants here drive the session state machine instead.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The MLS bridge failed (non-2xx response, transport error, or a
    /// malformed payload)
    #[error("MLS bridge failure: {reason}")]
    MlsFailure {
        /// What went wrong, for the operator
        reason: String,
    },

    /// An MLS bridge operation exceeded its timeout
    #[error("MLS operation timed out after {elapsed:?}")]
    Timeout {
        /// The configured timeout that elapsed
        elapsed: Duration,
    },

    /// The session was torn down while the operation was in flight
    #[error("session cancelled")]
    Cancelled,

    /// A per-frame error surfaced through a session operation
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl ClientError {
    /// Whether retrying the operation may succeed.
    ///
    /// Bridge failures and timeouts are transient: the session retries
    /// them from `Joining`. Cancellation is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::MlsFailure { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_failures_are_transient() {
        assert!(ClientError::MlsFailure { reason: "503".into() }.is_transient());
        assert!(ClientError::Timeout { elapsed: Duration::from_secs(10) }.is_transient());
    }

    #[test]
    fn cancellation_is_final() {
        assert!(!ClientError::Cancelled.is_transient());
        assert!(!ClientError::Frame(FrameError::AuthFailed).is_transient());
    }
}
