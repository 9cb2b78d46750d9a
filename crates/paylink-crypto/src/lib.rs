//! # paylink-crypto
//!
//! Cryptographic primitives for the PAYLINK proximity payment handshake.
//!
//! This crate provides:
//! - **XChaCha20-Poly1305** authenticated symmetric encryption
//! - **BLAKE3** passphrase-to-key derivation for the pre-shared secret
//! - Base64 armoring for carrying ciphertext through a QR code
//!
//! ## Security
//!
//! All secret data uses `zeroize` for secure memory cleanup. The shared
//! passphrase and derived key never appear in `Debug` output.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod secret;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use secret::{CipherKey, SharedSecret, KEY_SIZE};
pub use symmetric::{decrypt, encrypt, EncryptedData, Nonce, NONCE_SIZE, TAG_SIZE};
