//! Protocol limits and constants.
//!
//! These are protocol parameters, not free configuration: encoder and
//! decoder must use identical values or the two devices will not
//! interoperate.

/// Application tag embedded in every envelope.
///
/// An envelope carrying any other value is foreign and rejected.
pub const APP_ID: &str = "PAYLINK-QR-v1";

/// Seconds between scheduled payload refreshes on the encoder.
pub const REFRESH_INTERVAL_SECS: u64 = 30;

/// Maximum envelope age in seconds at decode time.
///
/// Governs protocol validity (replay window). Independent of the scan
/// cooldown, which is a UX concern.
pub const EXPIRY_WINDOW_SECS: i64 = 45;

/// Milliseconds the decoder suppresses re-scanning after processing a code.
///
/// Prevents immediately re-reading the same physical QR code. Independent
/// of the expiry window, which is a security concern.
pub const SCAN_COOLDOWN_MILLIS: i64 = 2000;

/// Maximum accepted length of a scanned armored payload, in characters.
///
/// Checked before any base64 or cipher work to bound the cost of feeding
/// the decoder arbitrary camera captures. Generous for this protocol: a
/// real payload is well under 300 characters.
pub const MAX_ARMORED_LEN: usize = 4096;

/// Tolerated forward clock drift of `time_created`, in seconds.
///
/// A payload stamped further than this in the payer's future cannot have
/// been freshly encoded and is treated as expired.
pub const MAX_CLOCK_SKEW_SECS: i64 = 5;
