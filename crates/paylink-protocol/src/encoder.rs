//! Payload encoder: the receiving device's side of the handshake.
//!
//! Produces a fresh sealed payload on demand and on a fixed cadence, and
//! exposes it for QR rendering together with a countdown to the next
//! scheduled refresh.
//!
//! The encoder is an explicit state machine driven by an injected clock:
//! the host calls [`PayloadEncoder::tick`] once per second (a UI timer, a
//! tokio interval) and passes the current wall-clock time. Teardown is
//! simply "stop calling tick" - the encoder holds no timers, tasks or I/O
//! of its own, so there is nothing to cancel or leak when the hosting
//! screen goes away.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use paylink_crypto::{CipherKey, SharedSecret};

use crate::envelope::PaymentEnvelope;
use crate::limits::REFRESH_INTERVAL_SECS;

/// Observable encoder state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderState {
    /// No payload can be produced (missing account or seal failure).
    ///
    /// The host shows a waiting indicator; the encoder retries on the next
    /// tick or manual refresh rather than surfacing an error.
    Unavailable,

    /// A sealed payload is live and ready for QR rendering.
    Live {
        /// Armored ciphertext to render as a QR code.
        payload: String,
        /// When the payload was encoded.
        time_created: DateTime<Utc>,
    },
}

/// Timer-driven producer of rotating payment payloads.
pub struct PayloadEncoder {
    key: CipherKey,
    state: EncoderState,
    /// Seconds until the next scheduled refresh (the user-visible countdown).
    countdown: u64,
}

impl PayloadEncoder {
    /// Create an encoder for the given shared secret.
    ///
    /// Starts [`EncoderState::Unavailable`] with a full countdown; the host
    /// performs the first [`Self::refresh`] when the account is known.
    pub fn new(secret: &SharedSecret) -> Self {
        Self {
            key: secret.derive_key(),
            state: EncoderState::Unavailable,
            countdown: REFRESH_INTERVAL_SECS,
        }
    }

    /// Encode a fresh payload now, scheduled or manual.
    ///
    /// Resets the countdown to the full interval in every case, so a manual
    /// refresh pushes the next scheduled one out by a full period. `now` is
    /// read at encode time by the caller, never cached, which keeps
    /// `time_created` strictly increasing across refreshes.
    ///
    /// An empty `account_no` or a seal failure leaves the encoder
    /// [`EncoderState::Unavailable`]; neither is an error to the caller.
    pub fn refresh(&mut self, account_no: &str, now: DateTime<Utc>) -> &EncoderState {
        self.countdown = REFRESH_INTERVAL_SECS;

        if account_no.is_empty() {
            warn!("no receiving account selected, payload unavailable");
            self.state = EncoderState::Unavailable;
            return &self.state;
        }

        let envelope = PaymentEnvelope::new(account_no, now);
        match envelope.seal(&self.key) {
            Ok(payload) => {
                debug!(time_created = %now, "sealed fresh payment payload");
                self.state = EncoderState::Live {
                    payload,
                    time_created: now,
                };
            }
            Err(e) => {
                error!(error = %e, "failed to seal payment payload");
                self.state = EncoderState::Unavailable;
            }
        }
        &self.state
    }

    /// Advance the 1 Hz countdown; refreshes when it runs out.
    ///
    /// Also retries immediately while unavailable, so the encoder recovers
    /// as soon as an account is selected instead of waiting out the
    /// interval.
    pub fn tick(&mut self, account_no: &str, now: DateTime<Utc>) -> &EncoderState {
        if self.countdown <= 1 || self.state == EncoderState::Unavailable {
            return self.refresh(account_no, now);
        }
        self.countdown -= 1;
        &self.state
    }

    /// Current state.
    pub fn state(&self) -> &EncoderState {
        &self.state
    }

    /// The live armored payload, if any.
    pub fn payload(&self) -> Option<&str> {
        match &self.state {
            EncoderState::Live { payload, .. } => Some(payload),
            EncoderState::Unavailable => None,
        }
    }

    /// Seconds remaining until the next scheduled refresh.
    pub fn countdown_secs(&self) -> u64 {
        self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use paylink_crypto::SharedSecret;

    fn test_secret() -> SharedSecret {
        SharedSecret::new("encoder test secret").unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 11, 14, 20, 0).unwrap()
    }

    #[test]
    fn test_starts_unavailable() {
        let encoder = PayloadEncoder::new(&test_secret());
        assert_eq!(encoder.state(), &EncoderState::Unavailable);
        assert_eq!(encoder.payload(), None);
        assert_eq!(encoder.countdown_secs(), REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn test_refresh_goes_live() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("777733334444", t0());

        match encoder.state() {
            EncoderState::Live { time_created, .. } => assert_eq!(*time_created, t0()),
            EncoderState::Unavailable => panic!("expected live state"),
        }
        assert!(encoder.payload().is_some());
        assert_eq!(encoder.countdown_secs(), REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn test_empty_account_is_unavailable_not_error() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("", t0());
        assert_eq!(encoder.state(), &EncoderState::Unavailable);

        // Recovers on the next refresh once an account is selected
        encoder.refresh("777733334444", t0() + Duration::seconds(1));
        assert!(encoder.payload().is_some());
    }

    #[test]
    fn test_unavailable_retries_on_tick() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("", t0());
        assert_eq!(encoder.state(), &EncoderState::Unavailable);

        encoder.tick("777733334444", t0() + Duration::seconds(1));
        assert!(encoder.payload().is_some());
    }

    #[test]
    fn test_countdown_ticks_down() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("123", t0());

        encoder.tick("123", t0() + Duration::seconds(1));
        encoder.tick("123", t0() + Duration::seconds(2));
        assert_eq!(encoder.countdown_secs(), REFRESH_INTERVAL_SECS - 2);
    }

    #[test]
    fn test_scheduled_refresh_after_full_interval() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("123", t0());
        let first = encoder.payload().unwrap().to_string();

        let mut refreshed_at = None;
        for i in 1..=REFRESH_INTERVAL_SECS {
            let now = t0() + Duration::seconds(i as i64);
            encoder.tick("123", now);
            if encoder.payload() != Some(first.as_str()) && refreshed_at.is_none() {
                refreshed_at = Some((i, now));
            }
        }

        let (_, refresh_time) = refreshed_at.expect("payload should rotate within one interval");
        match encoder.state() {
            EncoderState::Live { time_created, .. } => {
                // The rotated payload carries the tick time, strictly newer
                assert_eq!(*time_created, refresh_time);
                assert!(*time_created > t0());
            }
            EncoderState::Unavailable => panic!("expected live state"),
        }
        assert_eq!(encoder.countdown_secs(), REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn test_time_created_strictly_increases_across_rotations() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("123", t0());

        let mut stamps = vec![t0()];
        for i in 1..=(3 * REFRESH_INTERVAL_SECS) {
            encoder.tick("123", t0() + Duration::seconds(i as i64));
            if let EncoderState::Live { time_created, .. } = encoder.state() {
                if *time_created != *stamps.last().unwrap() {
                    stamps.push(*time_created);
                }
            }
        }

        assert!(stamps.len() >= 3, "expected at least two rotations");
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_manual_refresh_resets_countdown() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("123", t0());

        for i in 1..=10 {
            encoder.tick("123", t0() + Duration::seconds(i));
        }
        assert_eq!(encoder.countdown_secs(), REFRESH_INTERVAL_SECS - 10);

        // Manual refresh: countdown snaps back to the full interval
        encoder.refresh("123", t0() + Duration::seconds(11));
        assert_eq!(encoder.countdown_secs(), REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn test_manual_refresh_after_tick_is_strictly_newer() {
        let mut encoder = PayloadEncoder::new(&test_secret());
        encoder.refresh("123", t0());
        encoder.tick("123", t0() + Duration::seconds(1));

        encoder.refresh("123", t0() + Duration::seconds(2));
        match encoder.state() {
            EncoderState::Live { time_created, .. } => {
                assert_eq!(*time_created, t0() + Duration::seconds(2));
            }
            EncoderState::Unavailable => panic!("expected live state"),
        }
    }
}
