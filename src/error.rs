//! # Error Types
//!
//! This module defines error types used throughout the remotepack library.
//!
//! Two classes of failure exist:
//!
//! - **Authoring errors** (unknown action or option names, images with too
//!   many colours): raised from entity constructors, before anything reaches
//!   the [`Package`](crate::pack::Package).
//! - **Resolution errors** (references to entities that were never appended):
//!   collected individually during resolution and raised once, as a single
//!   [`PackError::Unresolved`] listing every missing reference in the build.

use thiserror::Error;

/// Main error type for remotepack operations
#[derive(Debug, Error)]
pub enum PackError {
    /// A device option referred to an action name the device never declared
    #[error("{owner} has unrecognised action name '{name}'")]
    UnknownAction { owner: String, name: String },

    /// A device state named an option the target device does not have
    #[error("{owner} has unrecognised option name '{name}'")]
    UnknownOption { owner: String, name: String },

    /// One or more references could not be resolved to offsets.
    ///
    /// Raised by [`Package::pack`](crate::pack::Package::pack) after the
    /// whole graph has been resolved, so every missing reference in a build
    /// is reported in one pass.
    #[error("packing failed with {} unresolved reference(s):\n  {}", .0.len(), .0.join("\n  "))]
    Unresolved(Vec<String>),

    /// Image processing error (load failure, too many distinct colours)
    #[error("Image error: {0}")]
    Image(String),

    /// Transport-level errors (handshake, verify, connection)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
