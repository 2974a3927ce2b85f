//! Error types for per-frame operations

use thiserror::Error;

/// Errors from sealing and opening SFrame records.
///
/// Every variant except `CounterExhausted` is handled locally by dropping
/// the frame; `CounterExhausted` halts the sender until an epoch rotation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// AEAD tag mismatch (tampered record or mismatched key material)
    #[error("authentication failed")]
    AuthFailed,

    /// Counter outside the replay window or already seen
    #[error("replayed or stale counter {ctr}")]
    Replay {
        /// The rejected frame counter
        ctr: u64,
    },

    /// Record's key identifier does not belong to the receiving context
    #[error("record for foreign key id {kid}")]
    WrongKey {
        /// The key identifier carried by the record
        kid: u64,
    },

    /// Header bytes do not decode
    #[error("malformed header: {0}")]
    HeaderMalformed(#[from] sealframe_proto::ProtocolError),

    /// Sender frame counter would overflow; an epoch rotation is required
    #[error("sender counter exhausted")]
    CounterExhausted,

    /// Plaintext exceeds the media-pipeline frame bound
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameOversized {
        /// Plaintext length offered
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// No context available for the operation (no epoch installed, or no
    /// receiver derived for the record's sender)
    #[error("no context installed")]
    NoContext,

    /// Session was torn down while the operation was in flight
    #[error("session closed")]
    Cancelled,
}

impl FrameError {
    /// Whether this error must surface to the session manager instead of
    /// being converted to a frame drop.
    ///
    /// `CounterExhausted` forces an epoch rotation; everything else is a
    /// local drop (possibly feeding the resync heuristics).
    pub fn is_session_level(&self) -> bool {
        matches!(self, Self::CounterExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_exhaustion_is_session_level() {
        assert!(FrameError::CounterExhausted.is_session_level());
        assert!(!FrameError::AuthFailed.is_session_level());
        assert!(!FrameError::Replay { ctr: 9 }.is_session_level());
        assert!(!FrameError::NoContext.is_session_level());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            FrameError::WrongKey { kid: 7_012_340_030 }.to_string(),
            "record for foreign key id 7012340030"
        );
        assert_eq!(FrameError::Replay { ctr: 3 }.to_string(), "replayed or stale counter 3");
    }
}
