//! Proof systems for encrypted claim fields.
//!
//! Neither implementation here is zero-knowledge. [`PrefixProof`] is the
//! template the contract currently accepts. [`PoseidonBinding`] binds the proof to the whole
//! ciphertext through a Poseidon commitment. Both sit behind [`ProofSystem`],
//! so a real validity proof can replace them without touching callers.

use crate::constants::{
    poseidon_config, POSEIDON_CHUNK_BYTES, POSEIDON_PROOF_TAG, PREFIX_PROOF_LEN, PREFIX_PROOF_TAG,
};
use crate::types::{CryptoError, EncryptedField, FrHex, Proof};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::PrimeField;

/// Capability interface for attesting an encrypted field.
///
/// `generate` MUST be a pure function of the field.
pub trait ProofSystem: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, field: &EncryptedField) -> Result<Proof, CryptoError>;

    fn verify(&self, field: &EncryptedField, proof: &Proof) -> bool {
        match self.generate(field) {
            Ok(expected) => expected == *proof,
            Err(_) => false,
        }
    }
}

/// `proof_` followed by the first ten characters of the ciphertext.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixProof;

impl ProofSystem for PrefixProof {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn generate(&self, field: &EncryptedField) -> Result<Proof, CryptoError> {
        let head: String = field.as_str().chars().take(PREFIX_PROOF_LEN).collect();
        Ok(Proof::new(format!("{PREFIX_PROOF_TAG}{head}")))
    }
}

/// Poseidon commitment over the ciphertext bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoseidonBinding;

impl PoseidonBinding {
    /// Commitment to the raw ciphertext bytes.
    ///
    /// The byte length is absorbed first so inputs differing only in trailing
    /// zero bytes do not collide.
    pub fn commit(bytes: &[u8]) -> Fr {
        let cfg = poseidon_config();
        let mut sponge = PoseidonSponge::<Fr>::new(&cfg);

        sponge.absorb(&Fr::from(bytes.len() as u64));
        for chunk in bytes.chunks(POSEIDON_CHUNK_BYTES) {
            sponge.absorb(&Fr::from_le_bytes_mod_order(chunk));
        }

        let out: Vec<Fr> = sponge.squeeze_field_elements(1);
        out[0]
    }
}

impl ProofSystem for PoseidonBinding {
    fn name(&self) -> &'static str {
        "poseidon"
    }

    fn generate(&self, field: &EncryptedField) -> Result<Proof, CryptoError> {
        let commitment = Self::commit(field.as_str().as_bytes());
        let hex = FrHex::from_fr(&commitment)?;
        Ok(Proof::new(format!("{POSEIDON_PROOF_TAG}{}", hex.hex)))
    }

    fn verify(&self, field: &EncryptedField, proof: &Proof) -> bool {
        let Some(hex) = proof.as_str().strip_prefix(POSEIDON_PROOF_TAG) else {
            return false;
        };
        let Ok(claimed) = (FrHex { hex: hex.to_string() }).to_fr() else {
            return false;
        };
        claimed == Self::commit(field.as_str().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_proof_uses_first_ten_characters() {
        let field = EncryptedField::new("QUJDREVGR0hJSktM");
        assert_eq!(PrefixProof.generate(&field).unwrap().as_str(), "proof_QUJDREVGR0");
    }

    #[test]
    fn prefix_proof_of_short_field_keeps_whole_field() {
        let field = EncryptedField::new("NTAw");
        assert_eq!(PrefixProof.generate(&field).unwrap().as_str(), "proof_NTAw");

        let empty = EncryptedField::new("");
        assert_eq!(PrefixProof.generate(&empty).unwrap().as_str(), "proof_");
    }

    #[test]
    fn equal_fields_yield_equal_proofs() {
        let a = EncryptedField::new("UE9MLTE=");
        let b = EncryptedField::new("UE9MLTE=");
        assert_eq!(PrefixProof.generate(&a).unwrap(), PrefixProof.generate(&b).unwrap());
        assert_eq!(PoseidonBinding.generate(&a).unwrap(), PoseidonBinding.generate(&b).unwrap());
    }

    #[test]
    fn prefix_proof_verifies_only_its_own_field() {
        let field = EncryptedField::new("NTAw");
        let proof = PrefixProof.generate(&field).unwrap();
        assert!(PrefixProof.verify(&field, &proof));
        assert!(!PrefixProof.verify(&EncryptedField::new("NjAw"), &proof));
    }

    #[test]
    fn poseidon_proof_binds_the_full_ciphertext() {
        // Same first ten characters, different tails.
        let a = EncryptedField::new("QUJDREVGR0hJSktM");
        let b = EncryptedField::new("QUJDREVGR0hJSktN");

        let pa = PoseidonBinding.generate(&a).unwrap();
        let pb = PoseidonBinding.generate(&b).unwrap();

        assert!(pa.as_str().starts_with(POSEIDON_PROOF_TAG));
        assert_ne!(pa, pb);
        assert!(PoseidonBinding.verify(&a, &pa));
        assert!(!PoseidonBinding.verify(&b, &pa));
    }

    #[test]
    fn poseidon_commitment_separates_lengths() {
        assert_ne!(PoseidonBinding::commit(&[0u8]), PoseidonBinding::commit(&[0u8, 0u8]));
    }

    #[test]
    fn poseidon_rejects_foreign_proofs() {
        let field = EncryptedField::new("NTAw");
        let prefix = PrefixProof.generate(&field).unwrap();
        assert!(!PoseidonBinding.verify(&field, &prefix));
        assert!(!PoseidonBinding.verify(&field, &Proof::new("poseidon:zz")));
    }
}
