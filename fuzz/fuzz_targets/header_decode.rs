//! Fuzz target for SFrame header decoding
//!
//! Feeds arbitrary byte sequences to the header parser to find:
//! - Parser crashes or panics
//! - Integer overflows in length handling
//! - Buffer over-reads
//!
//! The parser must NEVER panic; invalid input returns an error. A header
//! that decodes must also survive a canonical re-encode round trip.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealframe_proto::SframeHeader;

fuzz_target!(|data: &[u8]| {
    let Ok((header, consumed)) = SframeHeader::decode(data) else {
        return;
    };
    assert!(consumed <= data.len());

    // Canonical re-encode must round trip to the same values.
    let bytes = header.to_bytes();
    let (again, _) = SframeHeader::decode(&bytes).expect("canonical encoding must decode");
    assert_eq!(again, header);
});
