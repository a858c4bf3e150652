//! Crate-wide constants for the placeholder cipher and the proof systems.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Prefix of every proof emitted by [`crate::proof::PrefixProof`].
pub const PREFIX_PROOF_TAG: &str = "proof_";

/// Number of ciphertext characters copied into a prefix proof.
pub const PREFIX_PROOF_LEN: usize = 10;

/// Prefix of every proof emitted by [`crate::proof::PoseidonBinding`].
pub const POSEIDON_PROOF_TAG: &str = "poseidon:";

/// Bytes packed into one field element when absorbing ciphertext.
///
/// 31 bytes always fit below the BN254 scalar modulus, so packing is injective.
pub const POSEIDON_CHUNK_BYTES: usize = 31;

// Poseidon sponge configuration.
//
// Width-3 sponge (rate=2, capacity=1), the same instantiation the commitment
// code has always used. Parameters are derived, not audited.
pub const POSEIDON_RATE: usize = 2;
pub const POSEIDON_CAPACITY: usize = 1;

pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Poseidon S-box exponent (alpha).
pub const POSEIDON_ALPHA: u64 = 5;

/// Deterministically derive Poseidon parameters for BN254::Fr.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits = Fr::MODULUS_BIT_SIZE as u64;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        POSEIDON_RATE,
        POSEIDON_FULL_ROUNDS as u64,
        POSEIDON_PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        POSEIDON_CAPACITY,
    )
}
