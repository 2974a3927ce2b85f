//! SFrame record framing.
//!
//! Splits a raw record into its header, ciphertext, and tag regions
//! without copying. The header region is exactly the AEAD associated
//! data; the tag is the last 16 bytes.

use std::fmt;

use crate::errors::ProtocolError;
use crate::header::SframeHeader;

/// Authentication tag length in bytes (all registered suites)
pub const TAG_LEN: usize = 16;

/// Borrowed view over a parsed SFrame record.
///
/// # Invariants
///
/// - The header decodes and the record is at least `header + tag` long;
///   both are enforced by [`RecordView::parse`].
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    header: SframeHeader,
    header_len: usize,
    raw: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// Parse a record, validating header and minimum length.
    ///
    /// # Errors
    ///
    /// - Any header decode error (see [`SframeHeader::decode`])
    /// - `RecordTooShort` if the record cannot hold header plus tag
    pub fn parse(raw: &'a [u8]) -> Result<Self, ProtocolError> {
        let (header, header_len) = SframeHeader::decode(raw)?;

        let min = header_len + TAG_LEN;
        if raw.len() < min {
            return Err(ProtocolError::RecordTooShort { expected: min, actual: raw.len() });
        }

        Ok(Self { header, header_len, raw })
    }

    /// Decoded header values.
    #[must_use]
    pub fn header(&self) -> SframeHeader {
        self.header
    }

    /// Header byte string; this is the AEAD associated data.
    #[must_use]
    pub fn header_bytes(&self) -> &'a [u8] {
        &self.raw[..self.header_len]
    }

    /// Ciphertext together with the trailing tag, as the AEAD consumes it.
    #[must_use]
    pub fn ciphertext_and_tag(&self) -> &'a [u8] {
        &self.raw[self.header_len..]
    }

    /// Ciphertext region only.
    #[must_use]
    pub fn ciphertext(&self) -> &'a [u8] {
        &self.raw[self.header_len..self.raw.len() - TAG_LEN]
    }

    /// The 16-byte authentication tag.
    #[must_use]
    pub fn tag(&self) -> &'a [u8] {
        &self.raw[self.raw.len() - TAG_LEN..]
    }
}

/// Owned description of a record, for diagnostics and logging.
///
/// Returned by value so callers can inspect records without any shared
/// "last seen header" state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
    /// Key identifier from the header
    pub kid: u64,
    /// Frame counter from the header
    pub ctr: u64,
    /// Header length in bytes (also the associated-data length)
    pub header_len: usize,
    /// Ciphertext length in bytes
    pub ct_len: usize,
    /// Tag length in bytes
    pub tag_len: usize,
    /// Whole record length in bytes
    pub total_len: usize,
    /// Header bytes as lowercase hex
    pub header_hex: String,
}

impl RecordInfo {
    /// Inspect a raw record.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RecordView::parse`].
    pub fn parse(raw: &[u8]) -> Result<Self, ProtocolError> {
        let view = RecordView::parse(raw)?;
        let header_hex = view.header_bytes().iter().map(|b| format!("{b:02x}")).collect();

        Ok(Self {
            kid: view.header().kid(),
            ctr: view.header().ctr(),
            header_len: view.header_bytes().len(),
            ct_len: view.ciphertext().len(),
            tag_len: TAG_LEN,
            total_len: raw.len(),
            header_hex,
        })
    }
}

impl fmt::Display for RecordInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SFrame[kid={}, ctr={}, aad={}B, ct={}B, tag={}B, header_hex={}]",
            self.kid, self.ctr, self.header_len, self.ct_len, self.tag_len, self.header_hex
        )
    }
}
