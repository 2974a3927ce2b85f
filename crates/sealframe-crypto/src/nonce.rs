//! Deterministic nonce construction
//!
//! The AEAD nonce is derived from the per-sender salt and the frame
//! counter, so a (key, counter) pair maps to exactly one nonce. Counter
//! monotonicity in the sender context is what makes nonces unique.

use crate::key_schedule::SALT_SIZE;
use crate::suite::NONCE_SIZE;

/// Build the 12-byte AEAD nonce for a frame.
///
/// `nonce = salt XOR (00 00 00 00 ‖ counter_be_8)`: the counter is
/// zero-padded on the left to 12 bytes before the XOR.
pub fn build_nonce(salt: &[u8; SALT_SIZE], counter: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = *salt;
    for (n, c) in nonce[NONCE_SIZE - 8..].iter_mut().zip(counter.to_be_bytes()) {
        *n ^= c;
    }
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counter_yields_salt() {
        let salt = [0xA5u8; SALT_SIZE];
        assert_eq!(build_nonce(&salt, 0), salt);
    }

    #[test]
    fn counter_xors_low_eight_bytes() {
        let salt = [0u8; SALT_SIZE];
        let nonce = build_nonce(&salt, 0x0102_0304_0506_0708);

        assert_eq!(&nonce[..4], &[0, 0, 0, 0], "high 4 bytes untouched");
        assert_eq!(&nonce[4..], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn distinct_counters_distinct_nonces() {
        let salt = [0x3Cu8; SALT_SIZE];

        let mut seen = std::collections::HashSet::new();
        for ctr in 0..1000u64 {
            assert!(seen.insert(build_nonce(&salt, ctr)), "nonce repeated at ctr {ctr}");
        }
        assert!(seen.insert(build_nonce(&salt, u64::MAX)));
    }

    #[test]
    fn xor_is_involutive() {
        let salt = [0x77u8; SALT_SIZE];
        let nonce = build_nonce(&salt, 42);

        // XORing the counter in again recovers the salt.
        let mut back = nonce;
        for (n, c) in back[NONCE_SIZE - 8..].iter_mut().zip(42u64.to_be_bytes()) {
            *n ^= c;
        }
        assert_eq!(back, salt);
    }
}
