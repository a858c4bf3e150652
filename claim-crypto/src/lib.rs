//! Crypto layer for FHELock encrypted claims.
//!
//! This crate contains:
//! - The field cipher interface and its Base64 placeholder.
//! - Proof systems that attest an encrypted field to the claims contract.
//! - Shared opaque types for ciphertexts and proofs.

pub mod cipher;
pub mod constants;
pub mod proof;
pub mod types;

pub use cipher::{Base64Placeholder, FieldCipher};
pub use proof::{PoseidonBinding, PrefixProof, ProofSystem};
pub use types::{CryptoError, EncryptedField, Proof};
