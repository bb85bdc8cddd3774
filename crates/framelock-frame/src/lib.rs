//! Sync-word frame recovery and typed channel decoding for raw byte streams.
//!
//! This is the core value-add layer of framelock. A serial link delivers an
//! unreliable byte stream; this crate turns it back into structured sample
//! records:
//!
//! - [`SyncMatcher`] locates the frame-start marker with a KMP search
//! - [`FrameAssembler`] buffers the stream, waits out partial frames and
//!   drops noise between them
//! - [`checksum`] verifies any of ten trailing checksum/CRC variants
//! - [`decode_value`] reads typed channel values (ten numeric formats,
//!   both byte orders) out of recovered frames
//!
//! No partial reads, no buffer management in user code.

pub mod assembler;
pub mod checksum;
pub mod config;
pub mod error;
pub mod sync;
pub mod value;

pub use assembler::{FrameAssembler, SampleRecord};
pub use checksum::{checksum, ChecksumAlgorithm};
pub use config::{ChannelMapping, ChecksumConfig, FrameFormat};
pub use error::{ConfigError, Result};
pub use sync::SyncMatcher;
pub use value::{decode_value, ByteOrder, SampleFormat};
