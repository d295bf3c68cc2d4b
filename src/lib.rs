//! An implementation of the [CryptoNight][1] v0 (cn/0) digest algorithm.
//!
//! # Usage
//!
//! ```
//! # use hex_literal::hex;
//! use cryptonight0::{CryptoNight, Digest};
//!
//! // Create the CryptoNight hasher
//! let mut hasher = CryptoNight::new();
//!
//! // Input some data into the hasher
//! hasher.input(b"This is ");
//!
//! // Insert more data as needed.
//! hasher.input("a test");
//!
//! // Finalize the result. This will temporarily allocate a 2MB buffer.
//! let result = hasher.result();
//!
//! assert_eq!(result[..], hex!("a084f01d1437a09c6985401b60d43554ae105802c5f5d8a9b3253649c0be6605")[..]);
//! ```
//!
//! Be sure to refer to the [RustCrypto/hashes][2] readme for more
//! information about the `Digest` traits.
//!
//! For direct, allocation-explicit use there is also [`hash`], the one-shot
//! entry point this whole crate is built around, plus [`cn_slow_hash`] and
//! [`try_hash`] for hosts that want the reference `cn_slow_hash` signature
//! or the mining convenience entry point, respectively.
//!
//! [1]: https://cryptonote.org/cns/cns008.txt
//! [2]: https://github.com/RustCrypto/hashes
use std::alloc::{alloc, Layout};
use std::convert::TryInto;

use blake_hash::Blake256;
use digest::generic_array::typenum::{U136, U32};
use digest::generic_array::GenericArray;
pub use digest::{BlockInput, Digest, FixedOutput, Input, Reset};
use groestl::Groestl256;
use jh_x86_64::Jh256;
use skein_hash::Skein512;

pub use crate::error::{Error, Result};

mod aes;
mod error;
mod keccak;
mod u64p;

/// Number of outer main-loop iterations (§4.3.2): each iteration performs
/// one AES sub-step and one multiply sub-step, for `MAIN_LOOP_ITERATIONS
/// * 2` operations total.
const MAIN_LOOP_ITERATIONS: usize = 262_144;

/// Size, in bytes, of the internal mining buffer [`try_hash`] patches a
/// nonce into.
const TRY_HASH_BUFFER_SIZE: usize = 256;

/// Byte offset of the little-endian nonce field within a mining blob.
const TRY_HASH_NONCE_OFFSET: usize = 39;

/// Minimum blob length for [`try_hash`] to patch in a nonce at all;
/// shorter blobs are hashed unmodified.
const TRY_HASH_MIN_NONCED_LEN: usize = 43;

/// CryptoNight v0 implementation.
#[derive(Debug, Default, Clone)]
pub struct CryptoNight {
    buffer: Vec<u8>,
}

impl CryptoNight {
    /// Alignment requirement for the scratch pad.
    pub const SP_ALIGNMENT: usize = 16;
    /// Scratch pad size.
    pub const SP_SIZE: usize = 1 << 21;

    /// Creates a new, empty hasher.
    pub fn new() -> Self {
        Default::default()
    }

    /// Compute a digest with a provided buffer.
    ///
    /// This method performs no allocations, as opposed to the
    /// `fixed_result` method. However, the scratchpad should be of
    /// proper length and alignment. See the `SP_ALIGNMENT` and `SP_SIZE`
    /// constants for the exact requirements.
    ///
    /// See also: `Digest::fixed_result()`.
    ///
    /// # Panics
    ///
    /// If the buffer provided is not acceptable, this method will panic.
    pub fn fixed_result_with_buffer(
        self,
        scratchpad: &mut [u8],
    ) -> GenericArray<u8, <Self as FixedOutput>::OutputSize> {
        assert_eq!(scratchpad.as_ptr() as usize & (Self::SP_ALIGNMENT - 1), 0);
        assert_eq!(scratchpad.len(), Self::SP_SIZE);

        let mut state = keccak::keccak1600(&self.buffer);

        aes::digest_main(&mut state, scratchpad);
        keccak::keccakf_state(&mut state);

        hash_final_state(&state)
    }

    /// Compute a digest with a provided buffer.
    ///
    /// This method performs no allocations, as opposed to the `digest`
    /// method. However, the scratchpad should be of proper length and
    /// alignment. See the `SP_ALIGNMENT` and `SP_SIZE` constants for the
    /// exact requirements.
    ///
    /// See also: `Digest::digest()`.
    ///
    /// # Panics
    ///
    /// If the buffer provided is not acceptable, this method will panic.
    pub fn digest_with_buffer<B>(
        data: B,
        scratchpad: &mut [u8],
    ) -> GenericArray<u8, <Self as FixedOutput>::OutputSize>
    where
        B: AsRef<[u8]>,
    {
        let mut hasher: Self = Default::default();
        Input::input(&mut hasher, data);
        hasher.fixed_result_with_buffer(scratchpad)
    }

    /// Allocate a reusable scratchpad for use with the `_with_buffer`
    /// methods.
    ///
    /// The resulting buffer is guaranteed to be on the heap, 16-byte
    /// aligned, and of `SP_SIZE` bytes. Its contents are undefined.
    ///
    /// # Usage
    /// ```
    /// # use cryptonight0::CryptoNight;
    /// let mut buffer = CryptoNight::allocate_scratchpad();
    ///
    /// CryptoNight::digest_with_buffer(b"Your data", buffer.as_mut());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails. Prefer [`hash`] (or
    /// `try_new_scratchpad` internally) for a fallible equivalent.
    pub fn allocate_scratchpad() -> impl AsMut<[u8]> {
        try_new_scratchpad().expect("failed to allocate CryptoNight scratchpad")
    }
}

/// Acquires a fresh, 16-byte-aligned, `CryptoNight::SP_SIZE`-byte
/// scratchpad, or reports [`Error::AllocationFailure`] if the allocator
/// cannot satisfy the request. The scratchpad is not zeroed: every byte
/// is overwritten during initialization before it is ever read.
fn try_new_scratchpad() -> Result<Vec<u8>> {
    let layout = Layout::from_size_align(CryptoNight::SP_SIZE, CryptoNight::SP_ALIGNMENT)
        .expect("SP_SIZE/SP_ALIGNMENT are fixed, valid layout parameters");

    unsafe {
        let ptr = alloc(layout);
        if ptr.is_null() {
            return Err(Error::AllocationFailure {
                size: CryptoNight::SP_SIZE,
            });
        }

        Ok(Vec::from_raw_parts(ptr, CryptoNight::SP_SIZE, CryptoNight::SP_SIZE))
    }
}

fn hash_final_state(state: &[u8; 200]) -> GenericArray<u8, U32> {
    match state[0] & 3 {
        0 => Blake256::digest(state),
        1 => Groestl256::digest(state),
        2 => Jh256::digest(state),
        3 => Skein512::digest(state),
        x => unreachable!("invalid finalizer selector {}", x),
    }
}

/// The top-level driver (§4.5): hashes `input` with Keccak-1600, runs the
/// memory-hard scratchpad engine, and dispatches to one of the four
/// finalizer hashes selected by the low two bits of the permuted state.
///
/// This is the one-shot, allocation-explicit core the rest of the crate's
/// API (the `Digest` impl, `cn_slow_hash`, `try_hash`) is built on.
pub fn hash(input: &[u8]) -> Result<[u8; 32]> {
    let mut scratchpad = try_new_scratchpad()?;
    let mut state = keccak::keccak1600(input);

    aes::digest_main(&mut state, &mut scratchpad);
    keccak::keccakf_state(&mut state);

    Ok(hash_final_state(&state).into())
}

/// The host-visible `cn_slow_hash` entry point (§6).
///
/// Only `variant == 0` is supported, matching this crate's cn/0-only
/// scope; any other variant, or `prehashed = true` for any variant, is
/// rejected with [`Error::UnsupportedVariant`] rather than silently
/// ignored. `height` is accepted for signature compatibility with the
/// reference interface and is unused at variant 0.
pub fn cn_slow_hash(data: &[u8], variant: u8, prehashed: bool, _height: u64) -> Result<[u8; 32]> {
    if variant != 0 || prehashed {
        return Err(Error::UnsupportedVariant(variant));
    }

    hash(data)
}

/// The convenience mining entry point (§6).
///
/// Copies `blob` into a 256-byte internal buffer, patches `nonce` in
/// little-endian at byte offset 39 if `blob` is at least 43 bytes long
/// (otherwise hashing it unmodified), hashes the result, and compares
/// the little-endian 64-bit word at digest bytes `[24..32)` against
/// `target`. Returns the digest unconditionally alongside whether it met
/// the target (`< target`, strictly).
pub fn try_hash(blob: &[u8], nonce: u32, target: u64) -> Result<(bool, [u8; 32])> {
    if blob.len() > TRY_HASH_BUFFER_SIZE {
        return Err(Error::InvalidInputLength {
            len: blob.len(),
            max: TRY_HASH_BUFFER_SIZE,
        });
    }

    let mut input = [0u8; TRY_HASH_BUFFER_SIZE];
    input[..blob.len()].copy_from_slice(blob);

    if blob.len() >= TRY_HASH_MIN_NONCED_LEN {
        let nonce_field = TRY_HASH_NONCE_OFFSET..TRY_HASH_NONCE_OFFSET + 4;
        input[nonce_field].copy_from_slice(&nonce.to_le_bytes());
    }

    let digest = hash(&input[..blob.len()])?;
    let window = u64::from_le_bytes(digest[24..32].try_into().unwrap());

    Ok((window < target, digest))
}

impl Input for CryptoNight {
    fn input<B: AsRef<[u8]>>(&mut self, data: B) {
        self.buffer.extend_from_slice(data.as_ref());
    }
}

impl Reset for CryptoNight {
    fn reset(&mut self) {
        self.buffer.clear();
    }
}

impl BlockInput for CryptoNight {
    // Keccak-1600's rate: 1088 bits.
    type BlockSize = U136;
}

impl FixedOutput for CryptoNight {
    type OutputSize = U32;

    fn fixed_result(self) -> GenericArray<u8, Self::OutputSize> {
        let mut scratchpad = Self::allocate_scratchpad();

        self.fixed_result_with_buffer(scratchpad.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_output_is_32_bytes() {
        assert_eq!(hash(b"").unwrap().len(), 32);
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash(b"repeat me").unwrap(), hash(b"repeat me").unwrap());
    }

    #[test]
    fn hash_is_sensitive_to_a_single_bit() {
        assert_ne!(
            hash(b"This is a test").unwrap(),
            hash(b"This is a tesu").unwrap()
        );
    }

    #[test]
    fn cn_slow_hash_rejects_other_variants() {
        assert_eq!(
            cn_slow_hash(b"x", 1, false, 0),
            Err(Error::UnsupportedVariant(1))
        );
    }

    #[test]
    fn cn_slow_hash_rejects_prehashed() {
        assert_eq!(
            cn_slow_hash(b"x", 0, true, 0),
            Err(Error::UnsupportedVariant(0))
        );
    }

    #[test]
    fn cn_slow_hash_matches_hash_for_variant_zero() {
        assert_eq!(
            cn_slow_hash(b"This is a test", 0, false, 0).unwrap(),
            hash(b"This is a test").unwrap()
        );
    }

    #[test]
    fn try_hash_rejects_oversized_blobs() {
        let blob = vec![0u8; 257];
        assert_eq!(
            try_hash(&blob, 0, u64::MAX),
            Err(Error::InvalidInputLength { len: 257, max: 256 })
        );
    }

    #[test]
    fn try_hash_with_full_range_target_always_succeeds() {
        let blob = vec![0u8; 64];
        let (met, _) = try_hash(&blob, 1234, u64::MAX).unwrap();
        assert!(met);
    }

    #[test]
    fn try_hash_never_meets_a_zero_target() {
        let blob = vec![0u8; 64];
        let (met, _) = try_hash(&blob, 1234, 0).unwrap();
        assert!(!met);
    }

    #[test]
    fn try_hash_nonce_patch_matches_manual_offset_write() {
        let mut blob = vec![0u8; 64];
        for (i, b) in blob.iter_mut().enumerate() {
            *b = i as u8;
        }

        let nonce = 0xdead_beefu32;
        let (_, via_nonce) = try_hash(&blob, nonce, u64::MAX).unwrap();

        let mut patched = blob.clone();
        patched[39..43].copy_from_slice(&nonce.to_le_bytes());
        let via_manual_patch = hash(&patched).unwrap();

        assert_eq!(via_nonce, via_manual_patch);
    }

    #[test]
    fn try_hash_leaves_short_blobs_unmodified() {
        let blob = vec![0xAAu8; 10];
        let (_, via_nonce) = try_hash(&blob, 0xdead_beef, u64::MAX).unwrap();
        let via_unmodified = hash(&blob).unwrap();
        assert_eq!(via_nonce, via_unmodified);
    }
}
