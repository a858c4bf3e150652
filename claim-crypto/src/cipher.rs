//! Field encryption.
//!
//! SECURITY NOTE (placeholder): [`Base64Placeholder`] is a reversible text
//! encoding, not encryption. Anyone can decode it. It stands in for a
//! homomorphic scheme until one is wired in behind [`FieldCipher`].

use crate::types::{CryptoError, EncryptedField};
use base64::Engine;

/// Capability interface for turning plaintext claim fields into ciphertext.
pub trait FieldCipher: Send + Sync {
    /// Short scheme identifier, surfaced in logs and the status endpoint.
    fn scheme(&self) -> &'static str;

    fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CryptoError>;

    fn decrypt(&self, field: &EncryptedField) -> Result<String, CryptoError>;
}

/// Standard-alphabet, padded Base64 of the UTF-8 plaintext.
#[derive(Clone, Copy, Debug, Default)]
pub struct Base64Placeholder;

impl FieldCipher for Base64Placeholder {
    fn scheme(&self) -> &'static str {
        "base64-placeholder"
    }

    fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CryptoError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        Ok(EncryptedField::new(b64.encode(plaintext.as_bytes())))
    }

    fn decrypt(&self, field: &EncryptedField) -> Result<String, CryptoError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        let bytes = b64
            .decode(field.as_str())
            .map_err(|e| CryptoError::Encoding(format!("{e}")))?;
        String::from_utf8(bytes).map_err(|_| CryptoError::Utf8)
    }
}
