//! Payload decoder: the paying device's side of the handshake.
//!
//! Consumes one captured string per scan event, produces exactly one
//! [`ScanResult`], and suppresses rapid duplicate reads of the same physical
//! code behind a short cooldown.
//!
//! ## State machine
//!
//! ```text
//! Armed --(capture)--> Processing --(classify, synchronous)--> CoolingDown --(timeout)--> Armed
//! ```
//!
//! Processing happens synchronously inside [`PayloadDecoder::handle_scan`],
//! so at most one scan is ever in flight and at most one result is emitted
//! per capture. The cooldown re-arms by time; every rejection is recoverable
//! and the scanning session never terminates.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use paylink_crypto::{CipherKey, SharedSecret};

use crate::envelope::PaymentEnvelope;
use crate::limits::SCAN_COOLDOWN_MILLIS;

/// Outcome of decoding a captured QR string.
///
/// Transient: consumed immediately by the calling screen to proceed to
/// transfer entry or show an error, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanResult {
    /// Valid payload; funds should be routed to this account.
    Accepted {
        /// The receiving account identifier from the envelope.
        receiver_account_no: String,
    },
    /// Decrypted cleanly but belongs to a different application.
    RejectedForeignApp,
    /// Valid envelope whose age exceeds the validity window.
    ///
    /// A hard rejection: an expired envelope never yields an account, so a
    /// replayed or stale code cannot reach the transfer flow.
    RejectedExpired,
    /// Did not decrypt, or decrypted to something other than an envelope.
    RejectedMalformed,
}

/// Scan suppression state.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ScanState {
    /// Ready to accept a capture.
    Armed,
    /// Recently processed a capture; ignoring scans until `until`.
    CoolingDown {
        until: DateTime<Utc>,
    },
}

/// Serialized consumer of captured QR strings.
pub struct PayloadDecoder {
    key: CipherKey,
    state: ScanState,
}

impl PayloadDecoder {
    /// Create a decoder for the given shared secret.
    pub fn new(secret: &SharedSecret) -> Self {
        Self {
            key: secret.derive_key(),
            state: ScanState::Armed,
        }
    }

    /// Process one captured string.
    ///
    /// Returns `None` when the capture arrives inside the cooldown window
    /// (the scan is ignored, no result is emitted), otherwise exactly one
    /// [`ScanResult`]. Whatever the outcome, the decoder cools down for
    /// [`SCAN_COOLDOWN_MILLIS`] before accepting the next capture.
    ///
    /// Never panics on adversarial input: wrong secrets, garbled captures
    /// and foreign payloads all map to rejection variants.
    pub fn handle_scan(&mut self, raw: &str, now: DateTime<Utc>) -> Option<ScanResult> {
        if let ScanState::CoolingDown { until } = self.state {
            if now < until {
                debug!("scan ignored during cooldown");
                return None;
            }
        }

        let result = self.classify(raw, now);
        self.state = ScanState::CoolingDown {
            until: now + Duration::milliseconds(SCAN_COOLDOWN_MILLIS),
        };
        Some(result)
    }

    /// Whether the decoder would currently accept a capture.
    pub fn is_armed(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            ScanState::Armed => true,
            ScanState::CoolingDown { until } => now >= until,
        }
    }

    /// Decrypt and validate a capture. Expiry is evaluated strictly before
    /// acceptance - an expired envelope can never reach the transfer flow.
    fn classify(&self, raw: &str, now: DateTime<Utc>) -> ScanResult {
        let envelope = match PaymentEnvelope::open(&self.key, raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "scan rejected: malformed payload");
                return ScanResult::RejectedMalformed;
            }
        };

        if envelope.is_foreign() {
            debug!(app = envelope.app(), "scan rejected: foreign application tag");
            return ScanResult::RejectedForeignApp;
        }

        if envelope.is_expired_at(now) {
            warn!(
                age_ms = envelope.age_at(now).num_milliseconds(),
                "scan rejected: payload outside validity window"
            );
            return ScanResult::RejectedExpired;
        }

        debug!("scan accepted");
        ScanResult::Accepted {
            receiver_account_no: envelope.receiver_account_no().to_string(),
        }
    }
}
