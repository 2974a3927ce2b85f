//! Fuzz target for SFrame record framing
//!
//! Parses arbitrary bytes as a full record (header + ciphertext + tag).
//! The parser must never panic, and the reported regions must tile the
//! input exactly.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealframe_proto::{RecordInfo, RecordView, TAG_LEN};

fuzz_target!(|data: &[u8]| {
    let Ok(view) = RecordView::parse(data) else {
        assert!(RecordInfo::parse(data).is_err());
        return;
    };

    let header = view.header_bytes().len();
    assert_eq!(header + view.ciphertext().len() + TAG_LEN, data.len());

    let info = RecordInfo::parse(data).expect("view parsed, info must too");
    assert_eq!(info.total_len, data.len());
    assert_eq!(info.header_len, header);
});
