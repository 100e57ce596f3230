use proptest::prelude::*;

use skillrepo::core::hash;

proptest! {
    #[test]
    fn digest_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(hash::digest_bytes(&bytes), hash::digest_bytes(&bytes));
    }

    #[test]
    fn digest_is_lowercase_hex(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let digest = hash::digest_bytes(&bytes);
        prop_assert_eq!(digest.len(), 64);
        prop_assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn appending_a_byte_changes_digest(bytes in prop::collection::vec(any::<u8>(), 0..256), extra in any::<u8>()) {
        let mut longer = bytes.clone();
        longer.push(extra);
        prop_assert_ne!(hash::digest_bytes(&bytes), hash::digest_bytes(&longer));
    }
}
