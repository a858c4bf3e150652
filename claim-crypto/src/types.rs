//! Types shared between the cipher, the proof systems, and their callers.

use ark_bn254::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(String),

    #[error("decrypted bytes are not valid UTF-8")]
    Utf8,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("proof generation failed: {0}")]
    Proof(String),
}

/// Ciphertext of a single claim field.
///
/// Opaque to everything except the cipher that produced it. On the wire it
/// travels as the UTF-8 bytes of the inner string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedField(String);

impl EncryptedField {
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self(ciphertext.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    /// Rebuild a field from contract-held bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let s = std::str::from_utf8(bytes).map_err(|_| CryptoError::Utf8)?;
        Ok(Self(s.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attestation accompanying one [`EncryptedField`].
///
/// Consumed once by a submission and never persisted by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(String);

impl Proof {
    pub fn new(proof: impl Into<String>) -> Self {
        Self(proof.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let s = std::str::from_utf8(bytes).map_err(|_| CryptoError::Utf8)?;
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON-friendly representation of a field element.
///
/// Fr values are hex strings of arkworks' canonical compressed encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrHex {
    pub hex: String,
}

impl FrHex {
    pub fn from_fr(x: &Fr) -> Result<Self, CryptoError> {
        let mut bytes = Vec::new();
        x.serialize_compressed(&mut bytes)
            .map_err(|e| CryptoError::Serialization(format!("{e}")))?;
        Ok(Self { hex: hex::encode(bytes) })
    }

    pub fn to_fr(&self) -> Result<Fr, CryptoError> {
        let bytes = hex::decode(&self.hex).map_err(|e| CryptoError::Serialization(format!("invalid hex: {e}")))?;
        Fr::deserialize_compressed(&bytes[..])
            .map_err(|e| CryptoError::Serialization(format!("invalid field bytes: {e}")))
    }
}
