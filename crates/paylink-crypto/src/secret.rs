//! Shared secret handling and passphrase-based key derivation.
//!
//! Both ends of the handshake are provisioned with the same passphrase via
//! configuration. The passphrase is never used as a raw key: it is stretched
//! to a 256-bit cipher key with BLAKE3 key derivation under a fixed,
//! versioned context string, so both devices deterministically agree on the
//! key without exchanging any material.
//!
//! ## Security Notes
//!
//! - The passphrase and the derived key are zeroized on drop
//! - Neither type ever prints its contents via `Debug`
//! - This subsystem does not generate, rotate, or persist the secret

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of the derived cipher key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Domain-separation context for passphrase-to-key derivation.
///
/// Versioned so a future cipher change cannot silently reuse old keys.
const KEY_DERIVE_CONTEXT: &str = "PAYLINK-v1.QR.cipher-key";

/// A pre-shared passphrase supplied by external configuration.
///
/// The passphrase is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    passphrase: String,
}

impl SharedSecret {
    /// Create a shared secret from a configured passphrase.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EmptySecret` if the passphrase is empty.
    pub fn new(passphrase: impl Into<String>) -> Result<Self> {
        let passphrase = passphrase.into();
        if passphrase.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self { passphrase })
    }

    /// Derive the 256-bit cipher key from the passphrase.
    ///
    /// Deterministic: the same passphrase always yields the same key, which
    /// is what lets two devices interoperate with no key exchange.
    pub fn derive_key(&self) -> CipherKey {
        let bytes = blake3::derive_key(KEY_DERIVE_CONTEXT, self.passphrase.as_bytes());
        CipherKey { bytes }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

/// A 256-bit symmetric key derived from the shared secret.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte slice.
    ///
    /// # Security
    ///
    /// Be careful with this - avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CipherKey([REDACTED])")
    }
}
