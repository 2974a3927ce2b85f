//! Fuzz target for the receiver open path
//!
//! Throws arbitrary bytes at a live receiver context. Every input must be
//! rejected cleanly (no panic, no plaintext) because the fuzzer cannot
//! forge a valid tag for the derived key.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealframe_core::{
    CipherSuite, DEFAULT_REPLAY_WINDOW, EpochSecret, MediaKind, ReceiverContext, compute_kid,
};
use sealframe_crypto::derive_sender_material;

fuzz_target!(|data: &[u8]| {
    let suite = CipherSuite::AesGcm128Sha256;
    let secret = EpochSecret::new([0x11; 32]);
    let mut receiver = ReceiverContext::new(
        suite,
        derive_sender_material(&secret, 3, suite),
        compute_kid(7, 1234, 3, MediaKind::Audio),
        compute_kid(7, 1234, 3, MediaKind::Video),
        DEFAULT_REPLAY_WINDOW,
    );

    assert!(receiver.open(data).is_err(), "fuzzer forged a valid record");
});
