//! Keccak-f[1600] and the Keccak-1600 absorbing sponge.
//!
//! CryptoNight needs the raw, untruncated 200-byte Keccak state both as
//! its initial hashing step and as its final permutation, so this module
//! implements the sponge directly instead of delegating to a SHA-3 crate.
//! Padding here is the original Keccak scheme (`0x01` / `0x80`), not the
//! later SHA-3 domain-separated padding.
use std::convert::TryInto;

/// Number of rounds in the full Keccak-f[1600] permutation.
const ROUNDS: usize = 24;

/// Round constants for the ι step, one per round.
const RC: [u64; ROUNDS] = [
    0x0000000000000001, 0x0000000000008082, 0x800000000000808a,
    0x8000000080008000, 0x000000000000808b, 0x0000000080000001,
    0x8000000080008081, 0x8000000000008009, 0x000000000000008a,
    0x0000000000000088, 0x0000000080008009, 0x000000008000000a,
    0x000000008000808b, 0x800000000000008b, 0x8000000000008089,
    0x8000000000008003, 0x8000000000008002, 0x8000000000000080,
    0x000000000000800a, 0x800000008000000a, 0x8000000080008081,
    0x8000000000008080, 0x0000000080000001, 0x8000000080008008,
];

/// Lane permutation used by the combined ρ/π step.
const PILN: [usize; ROUNDS] = [
    10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1,
];

/// Rotation offsets matching `PILN`, one per lane move.
const ROTC: [u32; ROUNDS] = [
    1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44,
];

/// Rate of the Keccak-1600 sponge in bytes (1088 bits).
const RATE: usize = 136;

/// Applies the 24-round Keccak-f[1600] permutation to a 25-lane state.
///
/// Lanes are plain `u64` words; callers are responsible for loading and
/// storing them little-endian.
pub fn keccakf(state: &mut [u64; 25]) {
    for round in 0..ROUNDS {
        // Theta
        let mut bc = [0u64; 5];
        for i in 0..5 {
            bc[i] = state[i] ^ state[i + 5] ^ state[i + 10] ^ state[i + 15] ^ state[i + 20];
        }
        for i in 0..5 {
            let t = bc[(i + 4) % 5] ^ bc[(i + 1) % 5].rotate_left(1);
            for j in (0..25).step_by(5) {
                state[j + i] ^= t;
            }
        }

        // Rho and Pi
        let mut t = state[1];
        for i in 0..ROUNDS {
            let j = PILN[i];
            let temp = state[j];
            state[j] = t.rotate_left(ROTC[i]);
            t = temp;
        }

        // Chi
        for j in (0..25).step_by(5) {
            let mut tmp = [0u64; 5];
            tmp.copy_from_slice(&state[j..j + 5]);
            for i in 0..5 {
                state[j + i] = tmp[i] ^ (!tmp[(i + 1) % 5] & tmp[(i + 2) % 5]);
            }
        }

        // Iota
        state[0] ^= RC[round];
    }
}

fn absorb(lanes: &mut [u64; 25], block: &[u8; RATE]) {
    for (lane, chunk) in lanes.iter_mut().zip(block.chunks_exact(8)) {
        *lane ^= u64::from_le_bytes(chunk.try_into().unwrap());
    }
}

/// Hashes `input` with Keccak-1600 (rate 1088 bits, capacity 512 bits,
/// original pre-SHA-3 padding) and returns the full 200-byte state.
///
/// This is not a conventional digest: no truncation is applied. The
/// complete permutation state is what CryptoNight's downstream stages
/// operate on.
pub fn keccak1600(input: &[u8]) -> [u8; 200] {
    let mut lanes = [0u64; 25];

    let mut chunks = input.chunks_exact(RATE);
    for block in &mut chunks {
        absorb(&mut lanes, block.try_into().unwrap());
        keccakf(&mut lanes);
    }

    let remainder = chunks.remainder();
    let mut last = [0u8; RATE];
    last[..remainder.len()].copy_from_slice(remainder);
    last[remainder.len()] = 0x01;
    last[RATE - 1] |= 0x80;
    absorb(&mut lanes, &last);
    keccakf(&mut lanes);

    let mut state = [0u8; 200];
    for (i, lane) in lanes.iter().enumerate() {
        state[i * 8..i * 8 + 8].copy_from_slice(&lane.to_le_bytes());
    }
    state
}

/// Applies [`keccakf`] to a 200-byte state buffer, decoding/encoding each
/// lane little-endian rather than aliasing the buffer directly. This is
/// what the CryptoNight driver uses for its final permutation step, so
/// that behavior is identical regardless of host endianness.
pub fn keccakf_state(state: &mut [u8; 200]) {
    let mut lanes = [0u64; 25];
    for (lane, chunk) in lanes.iter_mut().zip(state.chunks_exact(8)) {
        *lane = u64::from_le_bytes(chunk.try_into().unwrap());
    }

    keccakf(&mut lanes);

    for (chunk, lane) in state.chunks_exact_mut(8).zip(lanes.iter()) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
}
