//! Stream synchronization and frame extraction.
//!
//! The assembler owns the rolling receive buffer. Bytes go in whenever the
//! transport has them; complete, checksum-verified frames come out as
//! decoded sample records. Reads are batched: one `process` call scans the
//! whole buffer with a KMP search instead of re-matching the sync word at
//! every byte, which keeps the per-pass cost at O(buffer + sync word).

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::checksum::checksum;
use crate::config::{ChecksumConfig, FrameFormat};
use crate::error::ConfigError;
use crate::sync::SyncMatcher;
use crate::value::{decode_value, ByteOrder};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Channel values decoded from one recovered frame.
///
/// Disabled channels hold `None`: they are skipped during extraction, and
/// whether to repeat the previous value or substitute zero is the
/// caller's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    values: Vec<Option<f64>>,
}

impl SampleRecord {
    /// One slot per configured channel, in channel-index order.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value of one channel, `None` if disabled or out of range.
    pub fn value(&self, channel: usize) -> Option<f64> {
        self.values.get(channel).copied().flatten()
    }

    pub fn num_channels(&self) -> usize {
        self.values.len()
    }
}

/// Recovers framed samples from an unreliable byte stream.
///
/// All parsing state (buffered tail, partial frames) lives here; the
/// [`FrameFormat`] snapshot is only read during a pass. Layout changes go
/// through the setters (or [`FrameAssembler::configure`]), which swap the
/// snapshot atomically and reset parsing state: byte positions within a
/// frame are meaningless after a layout change.
pub struct FrameAssembler {
    format: FrameFormat,
    matcher: SyncMatcher,
    buf: BytesMut,
    paused: bool,
    validation_error: Option<ConfigError>,
}

impl FrameAssembler {
    /// Create an assembler for the given frame layout.
    ///
    /// An invalid layout is accepted but suspends processing until
    /// corrected; see [`FrameAssembler::last_validation_error`].
    pub fn new(format: FrameFormat) -> Self {
        let matcher = SyncMatcher::new(format.sync_word.clone());
        let validation_error = format.validate().err();
        Self {
            format,
            matcher,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            paused: false,
            validation_error,
        }
    }

    /// Replace the whole layout snapshot and reset parsing state.
    pub fn configure(&mut self, format: FrameFormat) {
        self.format = format;
        self.matcher.set_pattern(self.format.sync_word.clone());
        self.validation_error = self.format.validate().err();
        self.reset();
    }

    /// Replace the sync word.
    pub fn set_sync_word(&mut self, sync_word: impl Into<Vec<u8>>) {
        let mut format = self.format.clone();
        format.sync_word = sync_word.into();
        self.configure(format);
    }

    /// Grow or shrink the channel list, preserving existing mappings.
    pub fn set_num_channels(&mut self, num: usize) {
        let mut format = self.format.clone();
        format.set_num_channels(num);
        self.configure(format);
    }

    /// Replace the total wire length of a frame.
    pub fn set_total_length(&mut self, total_length: usize) {
        let mut format = self.format.clone();
        format.total_length = total_length;
        self.configure(format);
    }

    /// Replace the checksum configuration.
    pub fn set_checksum(&mut self, config: ChecksumConfig) {
        let mut format = self.format.clone();
        format.checksum = config;
        self.configure(format);
    }

    /// Current layout snapshot.
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub fn num_channels(&self) -> usize {
        self.format.num_channels()
    }

    /// The configuration problem currently suspending processing, if any.
    pub fn last_validation_error(&self) -> Option<&ConfigError> {
        self.validation_error.as_ref()
    }

    /// Discard buffered parse state; the configuration is kept.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Stop accumulating. Incoming bytes are still drained so the
    /// transport side does not back up, but nothing is parsed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume accumulating and parsing.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Feed received bytes and extract every complete frame.
    ///
    /// Returns the number of input bytes consumed (always the full input:
    /// bytes are buffered, or drained and discarded while paused or while
    /// the configuration is invalid) and the sample records recovered, in
    /// stream order. Partial frames survive in the buffer until the next
    /// call; noise in front of a sync word is dropped.
    pub fn process(&mut self, bytes: &[u8]) -> (usize, Vec<SampleRecord>) {
        if self.validation_error.is_some() || self.paused {
            return (bytes.len(), Vec::new());
        }

        self.buf.extend_from_slice(bytes);

        let wire_size = self.format.wire_size();
        let sync_len = self.format.sync_word.len();
        let mut samples = Vec::new();

        while self.buf.len() >= wire_size {
            match self.matcher.search(&self.buf, 0) {
                None => {
                    // No frame start anywhere. Keep only the longest tail
                    // that could still be a sync-word prefix straddling
                    // the read boundary; everything before it is noise.
                    let keep = (sync_len - 1).min(self.buf.len());
                    let discard = self.buf.len() - keep;
                    debug!(discarded = discard, "no sync word found, dropping noise");
                    self.buf.advance(discard);
                    break;
                }
                Some(pos) if pos + wire_size > self.buf.len() => {
                    // Sync word found but the frame is still arriving.
                    break;
                }
                Some(pos) => {
                    if pos > 0 {
                        debug!(skipped = pos, "noise before sync word");
                    }
                    let frame = &self.buf[pos..pos + wire_size];
                    if self.verify_checksum(frame) {
                        samples.push(self.extract_channels(frame));
                    }
                    self.buf.advance(pos + wire_size);
                }
            }
        }

        (bytes.len(), samples)
    }

    /// Compare the trailing checksum bytes against the value computed over
    /// the configured range of the frame body. Always passes when the
    /// checksum is disabled.
    fn verify_checksum(&self, frame: &[u8]) -> bool {
        let width = self.format.checksum.output_size();
        if width == 0 {
            return true;
        }

        let body = &frame[..frame.len() - width];
        let computed = self.body_checksum(body);
        let received = &frame[frame.len() - width..];

        for (i, &wire_byte) in received.iter().enumerate() {
            let shift = if self.format.checksum.byte_order == ByteOrder::Little {
                i * 8
            } else {
                (width - 1 - i) * 8
            };
            if wire_byte != ((computed >> shift) & 0xFF) as u8 {
                warn!(
                    algorithm = %self.format.checksum.algorithm,
                    computed,
                    received = ?received,
                    "checksum mismatch, dropping frame"
                );
                return false;
            }
        }

        true
    }

    /// Checksum over the configured `[start_byte, end_byte]` range of the
    /// frame body (sync word included). Out-of-range indices are clamped:
    /// a start past the end restarts at 0, the end saturates at the last
    /// byte, and an inverted range computes 0.
    fn body_checksum(&self, body: &[u8]) -> u32 {
        let mut start = self.format.checksum.start_byte;
        let mut end = self.format.checksum.end_byte;

        if start >= body.len() {
            start = 0;
        }
        if end >= body.len() {
            end = body.len() - 1;
        }
        if end < start {
            return 0;
        }

        checksum(self.format.checksum.algorithm, &body[start..=end])
    }

    fn extract_channels(&self, frame: &[u8]) -> SampleRecord {
        let values = self
            .format
            .channels
            .iter()
            .map(|ch| {
                if !ch.enabled {
                    return None;
                }
                Some(match frame.get(ch.byte_offset..ch.byte_end()) {
                    Some(bytes) => decode_value(ch.format, ch.byte_order, bytes),
                    None => 0.0,
                })
            })
            .collect();

        SampleRecord { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumAlgorithm;
    use crate::config::ChannelMapping;
    use crate::value::{ByteOrder, SampleFormat};

    /// sync AA BB, 4-byte payload, one u16-LE channel at offset 2.
    fn basic_format() -> FrameFormat {
        let mut format = FrameFormat::new([0xAA, 0xBB], 6, 1);
        format.channels[0] = ChannelMapping {
            byte_offset: 2,
            format: SampleFormat::U16,
            byte_order: ByteOrder::Little,
            enabled: true,
        };
        format
    }

    /// sync AA BB, 2-byte payload, SUM8 over the frame body, u16-LE at 2.
    fn checksummed_format() -> FrameFormat {
        let mut format = FrameFormat::new([0xAA, 0xBB], 5, 1);
        format.checksum = ChecksumConfig {
            algorithm: ChecksumAlgorithm::Sum8,
            enabled: true,
            start_byte: 0,
            end_byte: 3,
            byte_order: ByteOrder::Little,
        };
        format.channels[0] = ChannelMapping {
            byte_offset: 2,
            format: SampleFormat::U16,
            byte_order: ByteOrder::Little,
            enabled: true,
        };
        format
    }

    #[test]
    fn single_frame_round_trip() {
        let mut assembler = FrameAssembler::new(basic_format());

        let (consumed, samples) =
            assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);

        assert_eq!(consumed, 6);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn multiple_frames_in_one_read() {
        let mut assembler = FrameAssembler::new(basic_format());

        let mut wire = Vec::new();
        wire.extend_from_slice(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        wire.extend_from_slice(&[0xAA, 0xBB, 0x39, 0x30, 0x00, 0x00]);

        let (consumed, samples) = assembler.process(&wire);

        assert_eq!(consumed, 12);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value(0), Some(1234.0));
        assert_eq!(samples[1].value(0), Some(12345.0));
    }

    #[test]
    fn resynchronizes_after_noise() {
        let mut assembler = FrameAssembler::new(basic_format());

        let mut wire = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        wire.extend_from_slice(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);

        let (_, samples) = assembler.process(&wire);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn partial_frame_survives_across_reads() {
        let mut assembler = FrameAssembler::new(basic_format());

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn partial_frame_after_noise_survives() {
        let mut assembler = FrameAssembler::new(basic_format());

        // Buffer is frame-sized, but the matched frame start is too late
        // for a complete frame: nothing may be discarded.
        let (_, samples) = assembler.process(&[0x00, 0x00, 0xAA, 0xBB, 0xD2, 0x04]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0x00, 0x00]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn sync_word_straddling_reads_is_found() {
        let mut assembler = FrameAssembler::new(basic_format());

        // No full sync word here; the trailing 0xAA must be retained.
        let (_, samples) = assembler.process(&[0x01, 0x02, 0x03, 0x04, 0x05, 0xAA]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn single_byte_sync_word_keeps_no_tail() {
        let mut format = FrameFormat::new([0xAA], 3, 1);
        format.channels[0] = ChannelMapping {
            byte_offset: 1,
            format: SampleFormat::U16,
            byte_order: ByteOrder::Little,
            enabled: true,
        };
        let mut assembler = FrameAssembler::new(format);

        let (_, samples) = assembler.process(&[0x01, 0x02, 0x03]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0xAA, 0xD2, 0x04]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn checksum_accepts_valid_frame() {
        let mut assembler = FrameAssembler::new(checksummed_format());

        // SUM8(AA BB D2 04) = 0x3B.
        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x3B]);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn corrupted_frame_is_dropped_and_stream_continues() {
        let mut assembler = FrameAssembler::new(checksummed_format());

        let mut wire = Vec::new();
        // One payload byte flipped: checksum no longer matches.
        wire.extend_from_slice(&[0xAA, 0xBB, 0xD3, 0x04, 0x3B]);
        wire.extend_from_slice(&[0xAA, 0xBB, 0xD2, 0x04, 0x3B]);

        let (_, samples) = assembler.process(&wire);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn checksum_byte_order_is_respected() {
        // CRC16-CCITT(AA BB D2 04) = 0xBF12.
        let mut format = FrameFormat::new([0xAA, 0xBB], 6, 0);
        format.checksum = ChecksumConfig {
            algorithm: ChecksumAlgorithm::Crc16Ccitt,
            enabled: true,
            start_byte: 0,
            end_byte: 3,
            byte_order: ByteOrder::Big,
        };
        let mut assembler = FrameAssembler::new(format.clone());

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0xBF, 0x12]);
        assert_eq!(samples.len(), 1);

        // The same wire bytes fail under the opposite order.
        format.checksum.byte_order = ByteOrder::Little;
        let mut assembler = FrameAssembler::new(format);
        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0xBF, 0x12]);
        assert!(samples.is_empty());
    }

    #[test]
    fn checksum_range_is_clamped() {
        let mut format = checksummed_format();
        // Start past the frame restarts at 0; end clamps to the last body
        // byte. Net effect: same range as the valid configuration.
        format.checksum.start_byte = 100;
        format.checksum.end_byte = 100;
        let mut assembler = FrameAssembler::new(format);

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x3B]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn enabled_checksum_with_none_algorithm_is_inert() {
        let mut format = basic_format();
        format.checksum.enabled = true;
        format.checksum.algorithm = ChecksumAlgorithm::None;
        let mut assembler = FrameAssembler::new(format);

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn disabled_channel_is_skipped_not_zero_filled() {
        let mut format = FrameFormat::new([0xAA, 0xBB], 6, 2);
        format.channels[0] = ChannelMapping {
            byte_offset: 2,
            format: SampleFormat::U8,
            byte_order: ByteOrder::Little,
            enabled: true,
        };
        format.channels[1] = ChannelMapping {
            byte_offset: 3,
            format: SampleFormat::U8,
            byte_order: ByteOrder::Little,
            enabled: false,
        };
        let mut assembler = FrameAssembler::new(format);

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0x07, 0x09, 0x00, 0x00]);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(7.0));
        assert_eq!(samples[0].value(1), None);
        assert_eq!(samples[0].values(), &[Some(7.0), None]);
    }

    #[test]
    fn invalid_configuration_discards_bytes() {
        let mut assembler = FrameAssembler::new(FrameFormat::new(Vec::new(), 6, 1));
        assert_eq!(
            assembler.last_validation_error(),
            Some(&ConfigError::EmptySyncWord)
        );

        // Drained, not buffered.
        let (consumed, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(consumed, 6);
        assert!(samples.is_empty());

        // Recovery is automatic once the configuration is corrected, and
        // the previously discarded bytes stay discarded.
        assembler.set_sync_word([0xAA, 0xBB]);
        assert!(assembler.last_validation_error().is_none());

        let (_, samples) = assembler.process(&[0xD2, 0x04, 0x00, 0x00]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn overlapping_channels_surface_an_error() {
        let mut format = FrameFormat::new([0xAA, 0xBB], 8, 2);
        format.channels[0] = ChannelMapping {
            byte_offset: 2,
            format: SampleFormat::U16,
            byte_order: ByteOrder::Little,
            enabled: true,
        };
        format.channels[1] = ChannelMapping {
            byte_offset: 3,
            format: SampleFormat::U16,
            byte_order: ByteOrder::Little,
            enabled: true,
        };
        let assembler = FrameAssembler::new(format);

        let error = assembler.last_validation_error().expect("must be invalid");
        assert_eq!(
            error.to_string(),
            "channel 0 and 1 have overlapping byte ranges"
        );
    }

    #[test]
    fn paused_assembler_drains_without_parsing() {
        let mut assembler = FrameAssembler::new(basic_format());

        assembler.pause();
        assert!(assembler.is_paused());

        let (consumed, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(consumed, 6);
        assert!(samples.is_empty());

        // The paused bytes were drained, not buffered: resuming starts
        // from a clean slate.
        assembler.resume();
        let (_, samples) = assembler.process(&[0xD2, 0x04, 0x00, 0x00]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn reconfiguration_resets_parse_state() {
        let mut assembler = FrameAssembler::new(basic_format());

        // Half a frame in the buffer, then the layout changes.
        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2]);
        assert!(samples.is_empty());

        assembler.set_total_length(6);

        // The stale partial frame is gone; a fresh complete frame decodes.
        let (_, samples) = assembler.process(&[0x04, 0x00, 0x00]);
        assert!(samples.is_empty());

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn set_num_channels_preserves_existing_mappings() {
        let mut assembler = FrameAssembler::new(basic_format());
        assembler.set_num_channels(3);

        assert_eq!(assembler.num_channels(), 3);
        assert_eq!(assembler.format().channels[0].byte_offset, 2);
        assert_eq!(assembler.format().channels[0].format, SampleFormat::U16);

        assembler.set_num_channels(1);
        assert_eq!(assembler.num_channels(), 1);
        assert_eq!(assembler.format().channels[0].format, SampleFormat::U16);
    }

    #[test]
    fn sync_word_change_invalidates_in_flight_state() {
        let mut assembler = FrameAssembler::new(basic_format());

        let (_, samples) = assembler.process(&[0xAA, 0xBB, 0xD2]);
        assert!(samples.is_empty());

        assembler.set_sync_word([0xCC, 0xDD]);

        let (_, samples) = assembler.process(&[0xCC, 0xDD, 0xD2, 0x04, 0x00, 0x00]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(0), Some(1234.0));
    }

    #[test]
    fn frames_split_across_many_small_reads() {
        let mut assembler = FrameAssembler::new(basic_format());
        let wire = [0xAA, 0xBB, 0xD2, 0x04, 0x00, 0x00];

        let mut total = Vec::new();
        for &byte in &wire {
            let (_, samples) = assembler.process(&[byte]);
            total.extend(samples);
        }

        assert_eq!(total.len(), 1);
        assert_eq!(total[0].value(0), Some(1234.0));
    }
}
