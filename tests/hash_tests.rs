use cryptonight0::{hash, try_hash, CryptoNight, Digest};
use proptest::prelude::*;

#[test]
fn validate_samples() {
    validate_sample(
        b"",
        b"eb14e8a833fac6fe9a43b57b336789c46ffe93f2868452240720607b14387e11",
    );
    validate_sample(
        b"This is a test",
        b"a084f01d1437a09c6985401b60d43554ae105802c5f5d8a9b3253649c0be6605",
    );
    validate_sample(
        &hex::decode("6465206f6d6e69627573206475626974616e64756d").unwrap(),
        b"2f8e3df40bd11f9ac90c743ca8e32bb391da4fb98612aa3b6cdc639ee00b31f5",
    );
}

fn validate_sample(input: &[u8], expected_hex: &[u8]) {
    let expected = hex::decode(expected_hex).unwrap();

    let via_digest = CryptoNight::digest(input);
    assert_eq!(via_digest.as_slice(), expected.as_slice());

    let via_hash = hash(input).unwrap();
    assert_eq!(via_hash.as_slice(), expected.as_slice());
}

proptest! {
    #[test]
    fn hash_is_deterministic(input in proptest::collection::vec(any::<u8>(), 0..=1024)) {
        prop_assert_eq!(hash(&input).unwrap(), hash(&input).unwrap());
    }

    #[test]
    fn try_hash_with_full_range_target_is_always_truthy(
        blob in proptest::collection::vec(any::<u8>(), 0..=256),
        nonce in any::<u32>(),
    ) {
        let (met, _) = try_hash(&blob, nonce, u64::MAX).unwrap();
        prop_assert!(met);
    }

    #[test]
    fn nonced_try_hash_matches_manual_blob_mutation(
        blob in proptest::collection::vec(any::<u8>(), 43..=256),
        nonce in any::<u32>(),
    ) {
        let (_, via_nonce) = try_hash(&blob, nonce, u64::MAX).unwrap();

        let mut patched = blob.clone();
        patched[39..43].copy_from_slice(&nonce.to_le_bytes());
        let via_mutation = hash(&patched).unwrap();

        prop_assert_eq!(via_nonce, via_mutation);
    }
}
