//! XChaCha20-Poly1305 symmetric encryption with text armoring.
//!
//! Provides AEAD encryption with 256-bit keys and 192-bit nonces, plus the
//! base64 armor used to carry ciphertext through a QR code (the only
//! device-to-device boundary in the handshake is a scanned string).
//!
//! ## Security Notes
//!
//! - Nonces are randomly generated using OsRng and prepended to the ciphertext
//! - The Poly1305 tag authenticates the payload; any tampering fails decryption
//! - NEVER reuse a nonce with the same key

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::secret::CipherKey;
use crate::{CryptoError, Result};

/// Size of nonce in bytes (192 bits for XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A 192-bit nonce for XChaCha20-Poly1305.
#[derive(Clone, Serialize, Deserialize)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 24 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce as a byte slice.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

/// Encrypted data with nonce prepended.
///
/// Binary format: `[nonce (24 bytes)][ciphertext + tag]`.
/// Armored format: standard base64 of the binary form.
#[derive(Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The nonce used for encryption.
    pub nonce: Nonce,
    /// The ciphertext with authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Get the total size of the encrypted data in binary form.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Check if the encrypted data is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Serialize to bytes (nonce || ciphertext).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.len());
        result.extend_from_slice(self.nonce.as_bytes());
        result.extend_from_slice(&self.ciphertext);
        result
    }

    /// Deserialize from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is too short to contain a nonce and tag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption);
        }
        let nonce = Nonce::from_bytes(&bytes[..NONCE_SIZE])?;
        let ciphertext = bytes[NONCE_SIZE..].to_vec();
        Ok(Self { nonce, ciphertext })
    }

    /// Armor the encrypted data as a base64 string suitable for a QR code.
    pub fn to_armored(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// De-armor encrypted data from a base64 string.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArmor` if the input is not valid base64,
    /// or `CryptoError::Decryption` if it is too short to be a ciphertext.
    pub fn from_armored(armored: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(armored.trim())
            .map_err(|e| CryptoError::InvalidArmor(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypt plaintext using XChaCha20-Poly1305.
///
/// Returns encrypted data containing the nonce and ciphertext with
/// authentication tag.
///
/// # Example
///
/// ```
/// use paylink_crypto::{encrypt, decrypt, SharedSecret};
///
/// let key = SharedSecret::new("demo passphrase").unwrap().derive_key();
/// let plaintext = b"hello";
///
/// let encrypted = encrypt(&key, plaintext).unwrap();
/// let decrypted = decrypt(&key, &encrypted).unwrap();
///
/// assert_eq!(plaintext.as_slice(), decrypted.as_slice());
/// ```
pub fn encrypt(key: &CipherKey, plaintext: &[u8]) -> Result<EncryptedData> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();
    let xnonce = XNonce::from_slice(nonce.as_bytes());

    let ciphertext = cipher
        .encrypt(xnonce, plaintext)
        .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))?;

    Ok(EncryptedData { nonce, ciphertext })
}

/// Decrypt ciphertext using XChaCha20-Poly1305.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if:
/// - The ciphertext has been tampered with
/// - The wrong key is used
/// - The ciphertext format is invalid
pub fn decrypt(key: &CipherKey, encrypted: &EncryptedData) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let xnonce = XNonce::from_slice(encrypted.nonce.as_bytes());

    cipher
        .decrypt(xnonce, encrypted.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SharedSecret;

    fn test_key() -> CipherKey {
        SharedSecret::new("test passphrase").unwrap().derive_key()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = b"Hello, PAYLINK!";

        let encrypted = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();

        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_decrypt_fails_with_wrong_key() {
        let key1 = SharedSecret::new("secret-one").unwrap().derive_key();
        let key2 = SharedSecret::new("secret-two").unwrap().derive_key();
        let plaintext = b"Secret message";

        let encrypted = encrypt(&key1, plaintext).unwrap();
        let result = decrypt(&key2, &encrypted);

        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_decrypt_fails_with_tampered_ciphertext() {
        let key = test_key();
        let plaintext = b"Secret message";

        let mut encrypted = encrypt(&key, plaintext).unwrap();
        // Tamper with the ciphertext
        if let Some(byte) = encrypted.ciphertext.get_mut(0) {
            *byte ^= 0xFF;
        }
        let result = decrypt(&key, &encrypted);

        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertext() {
        let key = test_key();
        let plaintext = b"Same message";

        let encrypted1 = encrypt(&key, plaintext).unwrap();
        let encrypted2 = encrypt(&key, plaintext).unwrap();

        assert_ne!(encrypted1.nonce.as_bytes(), encrypted2.nonce.as_bytes());
        assert_ne!(encrypted1.ciphertext, encrypted2.ciphertext);
    }

    #[test]
    fn test_armor_roundtrip() {
        let key = test_key();
        let plaintext = b"Armored payload";

        let encrypted = encrypt(&key, plaintext).unwrap();
        let armored = encrypted.to_armored();
        let restored = EncryptedData::from_armored(&armored).unwrap();

        assert_eq!(encrypted.nonce.as_bytes(), restored.nonce.as_bytes());
        assert_eq!(encrypted.ciphertext, restored.ciphertext);

        let decrypted = decrypt(&key, &restored).unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_armor_tolerates_surrounding_whitespace() {
        let key = test_key();
        let encrypted = encrypt(&key, b"payload").unwrap();
        let armored = format!("  {}\n", encrypted.to_armored());

        let restored = EncryptedData::from_armored(&armored).unwrap();
        assert_eq!(decrypt(&key, &restored).unwrap(), b"payload");
    }

    #[test]
    fn test_from_armored_rejects_non_base64() {
        let result = EncryptedData::from_armored("not base64 at all!!!");
        assert!(matches!(result, Err(CryptoError::InvalidArmor(_))));
    }

    #[test]
    fn test_from_armored_rejects_short_input() {
        // Valid base64, but decodes to fewer bytes than nonce + tag
        let short = BASE64.encode([0u8; 8]);
        let result = EncryptedData::from_armored(&short);
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_nonce_from_bytes_invalid_length() {
        let result = Nonce::from_bytes(&[0u8; 12]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key();
        let encrypted = encrypt(&key, b"").unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_encrypted_data_len() {
        let key = test_key();
        let plaintext = b"Hello";
        let encrypted = encrypt(&key, plaintext).unwrap();

        assert_eq!(encrypted.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }
}
