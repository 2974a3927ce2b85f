//! Participant naming across the SFU boundary.
//!
//! The SFU does not model MLS; the leaf index travels inside the display
//! name as `identity#leaf_index_decimal`. The string form stops here:
//! everything past this module works with the structured value.

use sealframe_core::LeafIndex;

/// A participant display name, parsed at the SFU boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    /// The participant's identity as shown to users.
    pub identity: String,
    /// MLS leaf index carried in the suffix. `None` when the suffix is
    /// missing or unparseable, which must prevent any subscription rekey
    /// for this participant.
    pub leaf: Option<LeafIndex>,
}

impl DisplayName {
    /// Parse `identity#leaf`. A name without `#`, or whose suffix is not
    /// a decimal leaf index, keeps the whole string as the identity and
    /// carries no leaf.
    pub fn parse(display: &str) -> Self {
        if let Some((identity, suffix)) = display.rsplit_once('#') {
            if let Ok(leaf) = suffix.parse::<LeafIndex>() {
                return Self { identity: identity.to_string(), leaf: Some(leaf) };
            }
        }
        Self { identity: display.to_string(), leaf: None }
    }

    /// Render the wire form `identity#leaf` for the SFU.
    pub fn format(identity: &str, leaf: LeafIndex) -> String {
        format!("{identity}#{leaf}")
    }
}
