//! # Device Transport Layer
//!
//! Ships a packed blob to the remote over a serial link.
//!
//! ## Available Transports
//!
//! - [`serial`]: USB serial (raw tty) with the write/verify handshake
//!
//! The transport never retries: a bad handshake byte or a failed verify is
//! reported as a distinct failure and the only recovery is to run the tool
//! again.

pub mod serial;

pub use serial::SerialTransport;
