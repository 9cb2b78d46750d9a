//! The encrypted payment envelope exchanged through a QR code.
//!
//! A `PaymentEnvelope` names the receiving account and the moment it was
//! encoded. It is constructed fresh on every refresh, sealed into an armored
//! ciphertext for display, and discarded; only the ciphertext crosses the
//! device boundary.
//!
//! ## Plaintext schema
//!
//! ```json
//! {
//!   "app": "PAYLINK-QR-v1",
//!   "receiver_account_no": "777733334444",
//!   "time_created": "2024-06-11T14:20:00Z"
//! }
//! ```
//!
//! ## Validation
//!
//! Parsing fails closed: unknown fields, missing fields, mis-typed fields and
//! an empty account identifier all reject the envelope. The application tag
//! and the age check are evaluated by the decoder after a successful parse,
//! so a foreign-but-honest envelope is distinguishable from a garbled one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use paylink_crypto::CipherKey;

use crate::error::{ProtocolError, Result};
use crate::limits::{APP_ID, EXPIRY_WINDOW_SECS, MAX_ARMORED_LEN, MAX_CLOCK_SKEW_SECS};

/// The plaintext payload identifying a receiving account, sealed into the
/// QR ciphertext.
///
/// Immutable after construction. Each envelope is independent and
/// self-validating through its embedded timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentEnvelope {
    /// Fixed application tag; anything other than [`APP_ID`] is foreign.
    app: String,

    /// Account identifier funds should be routed to. Opaque to this
    /// subsystem beyond being non-empty.
    receiver_account_no: String,

    /// Moment the envelope was encoded (RFC 3339 on the wire).
    time_created: DateTime<Utc>,
}

impl PaymentEnvelope {
    /// Construct a fresh envelope for the given account.
    ///
    /// `now` must be read from the wall clock at encode time, never cached,
    /// so successive envelopes carry strictly increasing timestamps.
    pub fn new(receiver_account_no: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            app: APP_ID.to_string(),
            receiver_account_no: receiver_account_no.into(),
            time_created: now,
        }
    }

    /// Get the application tag.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Get the receiving account identifier.
    pub fn receiver_account_no(&self) -> &str {
        &self.receiver_account_no
    }

    /// Get the encoding timestamp.
    pub fn time_created(&self) -> DateTime<Utc> {
        self.time_created
    }

    /// Signed age of the envelope at `now`. Negative if the envelope claims
    /// to come from the future.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.time_created)
    }

    /// Whether the envelope tag belongs to a different application.
    pub fn is_foreign(&self) -> bool {
        self.app != APP_ID
    }

    /// Whether the envelope is outside its validity window at `now`.
    ///
    /// An age of exactly [`EXPIRY_WINDOW_SECS`] is still valid; rejection is
    /// strictly beyond the window. A timestamp further than
    /// [`MAX_CLOCK_SKEW_SECS`] in the future cannot have been freshly
    /// encoded and is treated as expired as well.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let age = self.age_at(now);
        age > Duration::seconds(EXPIRY_WINDOW_SECS)
            || age < -Duration::seconds(MAX_CLOCK_SKEW_SECS)
    }

    /// Validate structural invariants after a parse.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidPayload` if the account identifier is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        if self.receiver_account_no.is_empty() {
            return Err(ProtocolError::InvalidPayload(
                "receiver_account_no is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Seal the envelope into an armored ciphertext string for QR display.
    ///
    /// The plaintext JSON buffer is transient; only the ciphertext survives
    /// this call.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or encryption fails.
    pub fn seal(&self, key: &CipherKey) -> Result<String> {
        let plaintext =
            serde_json::to_vec(self).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        let encrypted = paylink_crypto::encrypt(key, &plaintext)?;
        Ok(encrypted.to_armored())
    }

    /// Open an armored ciphertext string captured from a QR code.
    ///
    /// The input length is checked before any decoding work, the ciphertext
    /// is decrypted and authenticated, and the plaintext is parsed against
    /// the strict schema. Adversarial input yields an error, never a panic.
    ///
    /// Note: this does NOT evaluate the application tag or the age; callers
    /// decide how to surface [`Self::is_foreign`] and [`Self::is_expired_at`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the input exceeds [`MAX_ARMORED_LEN`]
    /// - `ProtocolError::Crypto` if de-armoring or decryption fails
    /// - `ProtocolError::Serialization` if the plaintext is not envelope JSON
    /// - `ProtocolError::InvalidPayload` if a structural invariant fails
    pub fn open(key: &CipherKey, raw: &str) -> Result<Self> {
        if raw.len() > MAX_ARMORED_LEN {
            return Err(ProtocolError::PayloadTooLarge {
                len: raw.len(),
                max: MAX_ARMORED_LEN,
            });
        }

        let encrypted = paylink_crypto::EncryptedData::from_armored(raw)?;
        let plaintext = paylink_crypto::decrypt(key, &encrypted)?;

        let envelope: Self = serde_json::from_slice(&plaintext)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;

        envelope.validate()?;
        Ok(envelope)
    }
}
