//! Error types for the Sealframe wire format.
//!
//! Strongly-typed errors for header parsing and record framing. Every
//! variant maps to a frame drop at the session layer; none of them is
//! recoverable by retrying the same bytes.

use thiserror::Error;

/// Errors from header and record parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer ends before the declared header does
    #[error("truncated header: need {expected} bytes, have {actual}")]
    TruncatedHeader {
        /// Bytes the declared header occupies
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// First byte lacks the SFrame marker bit (legacy cleartext?)
    #[error("missing SFrame marker bit")]
    MissingMarker,

    /// Reserved configuration bit set
    #[error("reserved header bit set")]
    ReservedBits,

    /// Record shorter than header plus authentication tag
    #[error("record too short: need {expected} bytes, have {actual}")]
    RecordTooShort {
        /// Minimum bytes for header plus tag
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },
}
