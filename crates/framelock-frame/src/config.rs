//! Frame layout configuration: sync word, channel map, checksum placement.
//!
//! Configuration is owned by the caller and only read by the assembler
//! during a parsing pass. Any mutation must go through the assembler's
//! setters (or be followed by a `reset`), since buffered parse state is
//! meaningless after a layout change.

use crate::checksum::ChecksumAlgorithm;
use crate::error::{ConfigError, Result};
use crate::value::{ByteOrder, SampleFormat};

/// Where and how to decode one channel inside a frame.
///
/// Offsets are 0-based over the complete frame, sync word included. The
/// byte length is derived from the format and not independently settable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub byte_offset: usize,
    pub format: SampleFormat,
    pub byte_order: ByteOrder,
    pub enabled: bool,
}

impl ChannelMapping {
    /// Default mapping for a freshly added channel at `index`.
    pub fn for_index(index: usize) -> Self {
        Self {
            byte_offset: index,
            format: SampleFormat::U8,
            byte_order: ByteOrder::Little,
            enabled: true,
        }
    }

    /// Number of frame bytes this channel occupies.
    pub fn byte_length(&self) -> usize {
        self.format.byte_size()
    }

    /// One past the last frame byte this channel occupies.
    pub fn byte_end(&self) -> usize {
        self.byte_offset + self.byte_length()
    }
}

impl Default for ChannelMapping {
    fn default() -> Self {
        Self::for_index(0)
    }
}

/// Placement and algorithm of the trailing checksum.
///
/// `enabled` is independent of `algorithm` so the choice survives being
/// toggled off. `start_byte`/`end_byte` are 0-based inclusive indices over
/// the complete frame; out-of-range values are clamped at computation
/// time rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumConfig {
    pub algorithm: ChecksumAlgorithm,
    pub enabled: bool,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Byte order of the checksum value on the wire.
    pub byte_order: ByteOrder,
}

impl ChecksumConfig {
    /// Wire width of the checksum field: 0 when disabled.
    pub fn output_size(&self) -> usize {
        if self.enabled {
            self.algorithm.output_size()
        } else {
            0
        }
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            algorithm: ChecksumAlgorithm::None,
            enabled: false,
            start_byte: 0,
            end_byte: 0,
            byte_order: ByteOrder::Little,
        }
    }
}

/// Complete frame layout: sync word, total wire length, checksum, channels.
///
/// The payload size is derived, never stored:
/// `total_length - sync_word.len() - checksum width`, floored to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFormat {
    pub sync_word: Vec<u8>,
    pub total_length: usize,
    pub checksum: ChecksumConfig,
    pub channels: Vec<ChannelMapping>,
}

impl FrameFormat {
    /// Layout with `num_channels` default channel mappings.
    pub fn new(sync_word: impl Into<Vec<u8>>, total_length: usize, num_channels: usize) -> Self {
        let mut format = Self {
            sync_word: sync_word.into(),
            total_length,
            checksum: ChecksumConfig::default(),
            channels: Vec::new(),
        };
        format.set_num_channels(num_channels);
        format
    }

    /// Payload bytes between sync word and checksum, floored to 1.
    pub fn payload_size(&self) -> usize {
        let overhead = self.sync_word.len() + self.checksum.output_size();
        if self.total_length > overhead {
            self.total_length - overhead
        } else {
            1
        }
    }

    /// Channel-addressable span: sync word + payload, checksum excluded.
    pub fn frame_size(&self) -> usize {
        self.sync_word.len() + self.payload_size()
    }

    /// Bytes one complete frame occupies on the wire, checksum included.
    pub fn wire_size(&self) -> usize {
        self.frame_size() + self.checksum.output_size()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Grow or shrink the channel list.
    ///
    /// Growing appends default mappings; shrinking truncates. Existing
    /// channels keep their configuration in both directions.
    pub fn set_num_channels(&mut self, num: usize) {
        if num < self.channels.len() {
            self.channels.truncate(num);
        } else {
            for index in self.channels.len()..num {
                self.channels.push(ChannelMapping::for_index(index));
            }
        }
    }

    /// Check the layout, reporting the first problem found.
    ///
    /// Overlaps are reported for the first conflicting pair in increasing
    /// `(i, j)` order; bounds violations for the lowest offending channel
    /// index. Disabled channels are validated too: a broken mapping should
    /// surface before the channel is switched on.
    pub fn validate(&self) -> Result<()> {
        if self.sync_word.is_empty() {
            return Err(ConfigError::EmptySyncWord);
        }

        for i in 0..self.channels.len() {
            for j in i + 1..self.channels.len() {
                let a = &self.channels[i];
                let b = &self.channels[j];
                if a.byte_offset < b.byte_end() && a.byte_end() > b.byte_offset {
                    return Err(ConfigError::ChannelOverlap { first: i, second: j });
                }
            }
        }

        let frame_size = self.frame_size();
        for (index, channel) in self.channels.iter().enumerate() {
            if channel.byte_end() > frame_size {
                return Err(ConfigError::ChannelOutOfBounds {
                    channel: index,
                    frame_size,
                });
            }
        }

        Ok(())
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self {
            sync_word: Vec::new(),
            total_length: 0,
            checksum: ChecksumConfig::default(),
            channels: Vec::new(),
        }
    }
}
