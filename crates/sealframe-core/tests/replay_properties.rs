//! Property-based tests for replay protection.
//!
//! Invariants:
//!
//! 1. **Replay rejection**: any record opened once is rejected on a second
//!    delivery
//! 2. **Reordering tolerance**: any permutation of a window-sized batch of
//!    records opens successfully exactly once each

use proptest::prelude::*;
use sealframe_core::{
    CipherSuite, DEFAULT_REPLAY_WINDOW, EpochSecret, FrameError, MediaKind, ReceiverContext,
    SenderContext, compute_kid,
};
use sealframe_crypto::derive_sender_material;

const SUITE: CipherSuite = CipherSuite::AesGcm128Sha256;

fn pair() -> (SenderContext, ReceiverContext) {
    let secret = EpochSecret::new([0x5A; 32]);
    let kid_audio = compute_kid(7, 1234, 3, MediaKind::Audio);
    let kid_video = compute_kid(7, 1234, 3, MediaKind::Video);

    let tx = SenderContext::new(
        SUITE,
        derive_sender_material(&secret, 3, SUITE),
        kid_audio,
        kid_video,
    );
    let rx = ReceiverContext::new(
        SUITE,
        derive_sender_material(&secret, 3, SUITE),
        kid_audio,
        kid_video,
        DEFAULT_REPLAY_WINDOW,
    );
    (tx, rx)
}

#[test]
fn full_window_permutation_opens_exactly_once() {
    // One deterministic pass over a whole window: reverse delivery order
    // is the worst case for the bitmap.
    let (mut tx, mut rx) = pair();

    let records: Vec<_> = (0..DEFAULT_REPLAY_WINDOW)
        .map(|i| tx.seal(MediaKind::Audio, i.to_string().as_bytes()).unwrap())
        .collect();

    for (i, record) in records.iter().enumerate().rev() {
        assert_eq!(rx.open(record).unwrap(), i.to_string().as_bytes(), "record {i}");
    }

    for (i, record) in records.iter().enumerate() {
        assert_eq!(
            rx.open(record),
            Err(FrameError::Replay { ctr: i as u64 }),
            "record {i} must not open twice"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_any_permutation_opens_once(
        order in Just((0..128usize).collect::<Vec<_>>()).prop_shuffle(),
        replay_pick in any::<prop::sample::Index>(),
    ) {
        let (mut tx, mut rx) = pair();

        let records: Vec<_> = (0..order.len())
            .map(|i| tx.seal(MediaKind::Audio, i.to_string().as_bytes()).unwrap())
            .collect();

        for &i in &order {
            let expected = i.to_string();
            prop_assert_eq!(rx.open(&records[i]).unwrap(), expected.as_bytes());
        }

        let again = replay_pick.index(records.len());
        prop_assert_eq!(
            rx.open(&records[again]),
            Err(FrameError::Replay { ctr: again as u64 })
        );
    }

    #[test]
    fn prop_stale_counters_rejected_after_window_advance(
        stale in 0u64..64,
        jump in (2 * DEFAULT_REPLAY_WINDOW as u64)..(3 * DEFAULT_REPLAY_WINDOW as u64),
    ) {
        let (mut tx, mut rx) = pair();

        let old_records: Vec<_> =
            (0..64).map(|_| tx.seal(MediaKind::Audio, b"old").unwrap()).collect();

        // Jump the sender's counter far ahead, then deliver one record so
        // the receiver's window advances past the old batch.
        let mut far = SenderContext::new(
            SUITE,
            derive_sender_material(&EpochSecret::new([0x5A; 32]), 3, SUITE),
            compute_kid(7, 1234, 3, MediaKind::Audio),
            compute_kid(7, 1234, 3, MediaKind::Video),
        )
        .with_counter(jump);
        let ahead = far.seal(MediaKind::Audio, b"ahead").unwrap();
        prop_assert_eq!(rx.open(&ahead).unwrap(), b"ahead");

        // Every old counter now lies at or below highest − window.
        prop_assert_eq!(
            rx.open(&old_records[stale as usize]),
            Err(FrameError::Replay { ctr: stale })
        );
    }
}
