//! End-to-end scenarios for the conference session.
//!
//! Each test follows one concrete flow through seal, transport, and open:
//! in-order delivery, reordering, tampering, epoch rekey, multi-sender
//! routing, and counter exhaustion.

use std::time::Instant;

use sealframe_core::{
    CipherSuite, EpochSecret, EpochInfo, FrameError, MediaKind, Roster, Session, SessionConfig,
    SessionState, compute_kid,
};
use sealframe_proto::RecordView;

const ROOM: u64 = 1234;

fn info(epoch: u64, local_leaf: u32, leaves: &[(u32, &str)]) -> EpochInfo {
    EpochInfo {
        epoch,
        room_id: ROOM,
        group_id: "0badcafe".to_string(),
        local_leaf,
        roster: Roster::from_entries(leaves.iter().map(|&(l, id)| (l, id.to_string()))),
    }
}

fn session_at(epoch: u64, local_leaf: u32, secret: [u8; 32], leaves: &[(u32, &str)]) -> Session {
    let mut session = Session::new(SessionConfig::default());
    session.start().unwrap();
    session.install_epoch(info(epoch, local_leaf, leaves), EpochSecret::new(secret)).unwrap();
    session
}

#[test]
fn one_sender_one_receiver_in_order() {
    // epoch 7, room 1234, sender and receiver both at leaf 3.
    let roster = [(3, "alice")];
    let mut tx = session_at(7, 3, [0x11; 32], &roster);
    let mut rx = session_at(7, 3, [0x11; 32], &roster);

    let r0 = tx.seal_frame(MediaKind::Audio, b"hello").unwrap();
    let r1 = tx.seal_frame(MediaKind::Audio, b"world").unwrap();

    let expected_kid = 7_012_340_030;
    assert_eq!(compute_kid(7, ROOM, 3, MediaKind::Audio), expected_kid);

    let h0 = RecordView::parse(&r0).unwrap().header();
    let h1 = RecordView::parse(&r1).unwrap().header();
    assert_eq!((h0.kid(), h0.ctr()), (expected_kid, 0));
    assert_eq!((h1.kid(), h1.ctr()), (expected_kid, 1));

    let now = Instant::now();
    assert_eq!(rx.open_frame(&r0, now).unwrap(), b"hello");
    assert_eq!(rx.open_frame(&r1, now).unwrap(), b"world");
}

#[test]
fn reordering_within_window() {
    let roster = [(3, "alice")];
    let mut tx = session_at(7, 3, [0x11; 32], &roster);
    let mut rx = session_at(7, 3, [0x11; 32], &roster);

    let records: Vec<_> = (0..5)
        .map(|i| tx.seal_frame(MediaKind::Audio, format!("frame {i}").as_bytes()).unwrap())
        .collect();

    let now = Instant::now();
    for &index in &[4usize, 0, 2, 1, 3] {
        let plaintext = rx.open_frame(&records[index], now).unwrap();
        assert_eq!(plaintext, format!("frame {index}").as_bytes());
    }

    // Second delivery of R2 is a replay.
    assert_eq!(rx.open_frame(&records[2], now), Err(FrameError::Replay { ctr: 2 }));
}

#[test]
fn tampered_tag_fails_authentication() {
    let roster = [(3, "alice")];
    let mut tx = session_at(7, 3, [0x11; 32], &roster);
    let mut rx = session_at(7, 3, [0x11; 32], &roster);

    let mut r0 = tx.seal_frame(MediaKind::Audio, b"hello").unwrap();
    let last = r0.len() - 1;
    r0[last] ^= 0x01;

    let now = Instant::now();
    assert_eq!(rx.open_frame(&r0, now), Err(FrameError::AuthFailed));

    // The failed open left no trace: the original record still opens.
    r0[last] ^= 0x01;
    assert_eq!(rx.open_frame(&r0, now).unwrap(), b"hello");
}

#[test]
fn epoch_change_rekeys_and_isolates() {
    let roster = [(3, "alice")];
    let mut tx = session_at(7, 3, [0x11; 32], &roster);

    let r_old = tx.seal_frame(MediaKind::Audio, b"epoch seven").unwrap();

    // Epoch advances to 8 with a fresh secret; sender reinstalls.
    let now = Instant::now();
    tx.begin_rekey(8, now).unwrap();
    tx.install_epoch(info(8, 3, &roster), EpochSecret::new([0x22; 32])).unwrap();
    let r_new = tx.seal_frame(MediaKind::Audio, b"epoch eight").unwrap();

    // A receiver installed at epoch 8 accepts the new record but refuses
    // the old one as WrongKey (its KID encodes epoch 7), not AuthFailed.
    let mut rx = session_at(8, 3, [0x22; 32], &roster);
    assert_eq!(rx.open_frame(&r_new, now).unwrap(), b"epoch eight");

    let old_kid = compute_kid(7, ROOM, 3, MediaKind::Audio);
    assert_eq!(rx.open_frame(&r_old, now), Err(FrameError::WrongKey { kid: old_kid }));
}

#[test]
fn two_remote_senders_route_by_kid() {
    let roster = [(1, "local"), (3, "bob"), (5, "carol")];
    let mut rx = session_at(7, 1, [0x11; 32], &roster);

    let mut bob = session_at(7, 3, [0x11; 32], &roster);
    let mut carol = session_at(7, 5, [0x11; 32], &roster);

    assert_eq!(compute_kid(7, ROOM, 3, MediaKind::Audio), 7_012_340_030);
    assert_eq!(compute_kid(7, ROOM, 5, MediaKind::Audio), 7_012_340_050);
    assert_eq!(compute_kid(7, ROOM, 5, MediaKind::Video), 7_012_340_051);

    let now = Instant::now();
    let bob_audio = bob.seal_frame(MediaKind::Audio, b"bob audio").unwrap();
    let carol_audio = carol.seal_frame(MediaKind::Audio, b"carol audio").unwrap();
    let carol_video = carol.seal_frame(MediaKind::Video, b"carol video").unwrap();

    assert_eq!(rx.open_frame(&bob_audio, now).unwrap(), b"bob audio");
    assert_eq!(rx.open_frame(&carol_audio, now).unwrap(), b"carol audio");
    assert_eq!(rx.open_frame(&carol_video, now).unwrap(), b"carol video");

    // Carol's video KID ends in ...051 and must land on her context, not
    // Bob's: Bob's counter state is untouched by her frames.
    let bob_next = bob.seal_frame(MediaKind::Audio, b"bob again").unwrap();
    assert_eq!(
        RecordView::parse(&bob_next).unwrap().header().ctr(),
        1,
        "bob's counter advanced only by his own seals"
    );
    assert_eq!(rx.open_frame(&bob_next, now).unwrap(), b"bob again");
}

#[test]
fn frame_from_unknown_sender_is_dropped_silently() {
    let mut rx = session_at(7, 1, [0x11; 32], &[(1, "local")]);

    // Leaf 9 is not in the roster, so no receiver context exists.
    let mut stranger = session_at(7, 9, [0x11; 32], &[(9, "stranger")]);
    let record = stranger.seal_frame(MediaKind::Audio, b"??").unwrap();

    assert_eq!(rx.open_frame(&record, Instant::now()), Err(FrameError::NoContext));
}

#[test]
fn remote_join_enables_decryption_mid_epoch() {
    let mut rx = session_at(7, 1, [0x11; 32], &[(1, "local")]);
    let mut late = session_at(7, 6, [0x11; 32], &[(6, "dave")]);

    let record = late.seal_frame(MediaKind::Video, b"late joiner").unwrap();
    let now = Instant::now();
    assert_eq!(rx.open_frame(&record, now), Err(FrameError::NoContext));

    rx.on_remote_join(6, "dave").unwrap();
    let record = late.seal_frame(MediaKind::Video, b"after join").unwrap();
    assert_eq!(rx.open_frame(&record, now).unwrap(), b"after join");

    rx.on_remote_leave(6);
    let record = late.seal_frame(MediaKind::Video, b"after leave").unwrap();
    assert_eq!(rx.open_frame(&record, now), Err(FrameError::NoContext));
}

#[test]
fn plaintext_bound_is_inclusive() {
    let mut tx = session_at(7, 3, [0x11; 32], &[(3, "alice")]);

    let huge = vec![0u8; 1 << 20];
    assert!(tx.seal_frame(MediaKind::Audio, &huge).is_ok(), "bound is inclusive");

    let over = vec![0u8; (1 << 20) + 1];
    assert_eq!(
        tx.seal_frame(MediaKind::Audio, &over),
        Err(FrameError::FrameOversized { len: (1 << 20) + 1, max: 1 << 20 })
    );
}

#[test]
fn stop_zeroises_and_closes() {
    let mut session = session_at(7, 3, [0x11; 32], &[(3, "alice")]);
    let record = session.seal_frame(MediaKind::Audio, b"before stop").unwrap();

    session.stop();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.receiver_count(), 0);
    assert_eq!(session.seal_frame(MediaKind::Audio, b"x"), Err(FrameError::Cancelled));
    assert_eq!(session.open_frame(&record, Instant::now()), Err(FrameError::Cancelled));
}

#[test]
fn suite_fixed_per_session() {
    // Both ends on the 256-bit suite interoperate; a mismatched end fails
    // authentication (the suite is never carried on the wire).
    let config = SessionConfig { suite: CipherSuite::AesGcm256Sha512, ..Default::default() };

    let mut tx: Session = Session::new(config.clone());
    tx.start().unwrap();
    tx.install_epoch(info(7, 3, &[(3, "alice")]), EpochSecret::new([0x11; 32])).unwrap();

    let mut rx = Session::new(config);
    rx.start().unwrap();
    rx.install_epoch(info(7, 3, &[(3, "alice")]), EpochSecret::new([0x11; 32])).unwrap();

    let record = tx.seal_frame(MediaKind::Audio, b"suite 256").unwrap();
    assert_eq!(rx.open_frame(&record, Instant::now()).unwrap(), b"suite 256");

    let mut mismatched = session_at(7, 3, [0x11; 32], &[(3, "alice")]);
    let record = tx.seal_frame(MediaKind::Audio, b"suite 256").unwrap();
    assert_eq!(mismatched.open_frame(&record, Instant::now()), Err(FrameError::AuthFailed));
}
