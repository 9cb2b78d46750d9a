//! # paylink-protocol
//!
//! The PAYLINK proximity payment QR handshake.
//!
//! Two cooperating roles run the protocol on different devices:
//!
//! - [`PayloadEncoder`] (payee): builds a [`PaymentEnvelope`] naming the
//!   receiving account, seals it with the shared secret, and rotates the
//!   resulting QR payload on a fixed cadence.
//! - [`PayloadDecoder`] (payer): consumes captured QR strings one at a time
//!   and yields a [`ScanResult`] - the receiving account on success, a
//!   distinct rejection otherwise.
//!
//! The only artifact crossing the device boundary is the armored ciphertext
//! string; QR image rendering and camera capture belong to the host.
//!
//! ## Protocol properties
//!
//! - Payloads are authenticated: tampering or a wrong secret rejects
//! - Payloads expire [`limits::EXPIRY_WINDOW_SECS`] after encoding (hard gate)
//! - Payloads are scoped to this application via [`limits::APP_ID`]
//! - Scans are serialized with a cooldown against duplicate reads
//!
//! Both state machines are clock-injected (`now` parameters, `tick`
//! methods): hosts drive them from real timers and tests from fixed
//! timestamps.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoder;
pub mod encoder;
pub mod envelope;
pub mod error;
pub mod limits;

pub use decoder::{PayloadDecoder, ScanResult};
pub use encoder::{EncoderState, PayloadEncoder};
pub use envelope::PaymentEnvelope;
pub use error::{ProtocolError, Result};
