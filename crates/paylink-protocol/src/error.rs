//! Error types for protocol operations.

use thiserror::Error;

/// Errors that can occur during protocol operations.
///
/// The decoder converts every variant into a `ScanResult` rejection; nothing
/// here escapes to the scanning session as a panic.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] paylink_crypto::CryptoError),

    /// Decrypted payload is not valid envelope JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Envelope violates a structural invariant.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Scanned input exceeds the accepted payload length.
    #[error("Payload too large: {len} characters exceeds maximum {max}")]
    PayloadTooLarge {
        /// Length of the scanned input.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
