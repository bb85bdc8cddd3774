//! Frame synchronization and typed channel decoding for serial byte streams.
//!
//! framelock recovers structured sensor samples from an unreliable byte
//! stream: it locates a configurable sync word, assembles fixed-size
//! frames across read boundaries, verifies trailing checksums and decodes
//! typed numeric channels.
//!
//! # Crate Structure
//!
//! - [`frame`] — Sync-word search, frame assembly, checksums, value decoding
//! - [`settings`] — Flat key-value layout persistence (behind `settings` feature)

/// Re-export frame types.
pub mod frame {
    pub use framelock_frame::*;
}

/// Re-export settings types (requires `settings` feature).
#[cfg(feature = "settings")]
pub mod settings {
    pub use framelock_settings::*;
}
