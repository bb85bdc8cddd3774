//! Flat key-value form of a [`FrameFormat`].
//!
//! The representation is deliberately simple for compatibility: string
//! keys and string values, sync word as hex without separators, one
//! record of keys per channel, checksum algorithm identified by its
//! stable name with `"None"` meaning disabled. Keys absent from the map
//! fall back to defaults; present-but-malformed values are rejected.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use framelock_frame::{ByteOrder, ChannelMapping, ChecksumAlgorithm, FrameFormat, SampleFormat};

use crate::error::{Result, SettingsError};

pub const KEY_SYNC_WORD: &str = "sync_word";
pub const KEY_TOTAL_FRAME_LENGTH: &str = "total_frame_length";
pub const KEY_NUM_CHANNELS: &str = "num_channels";
pub const KEY_CHECKSUM_ENABLED: &str = "checksum.enabled";
pub const KEY_CHECKSUM_ALGORITHM: &str = "checksum.algorithm";
pub const KEY_CHECKSUM_START_BYTE: &str = "checksum.start_byte";
pub const KEY_CHECKSUM_END_BYTE: &str = "checksum.end_byte";
pub const KEY_CHECKSUM_ENDIANNESS: &str = "checksum.endianness";

fn channel_key(index: usize, field: &str) -> String {
    format!("channel.{index}.{field}")
}

/// Serialize a frame layout into the flat map.
pub fn to_map(format: &FrameFormat) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    map.insert(KEY_SYNC_WORD.to_string(), to_hex(&format.sync_word));
    map.insert(
        KEY_TOTAL_FRAME_LENGTH.to_string(),
        format.total_length.to_string(),
    );
    map.insert(
        KEY_NUM_CHANNELS.to_string(),
        format.num_channels().to_string(),
    );

    map.insert(
        KEY_CHECKSUM_ENABLED.to_string(),
        format.checksum.enabled.to_string(),
    );
    map.insert(
        KEY_CHECKSUM_ALGORITHM.to_string(),
        format.checksum.algorithm.as_str().to_string(),
    );
    map.insert(
        KEY_CHECKSUM_START_BYTE.to_string(),
        format.checksum.start_byte.to_string(),
    );
    map.insert(
        KEY_CHECKSUM_END_BYTE.to_string(),
        format.checksum.end_byte.to_string(),
    );
    map.insert(
        KEY_CHECKSUM_ENDIANNESS.to_string(),
        format.checksum.byte_order.as_str().to_string(),
    );

    for (index, channel) in format.channels.iter().enumerate() {
        map.insert(
            channel_key(index, "byte_offset"),
            channel.byte_offset.to_string(),
        );
        // Derived from the format; written for record completeness.
        map.insert(
            channel_key(index, "byte_length"),
            channel.byte_length().to_string(),
        );
        map.insert(
            channel_key(index, "format"),
            channel.format.as_str().to_string(),
        );
        map.insert(
            channel_key(index, "endianness"),
            channel.byte_order.as_str().to_string(),
        );
        map.insert(channel_key(index, "enabled"), channel.enabled.to_string());
    }

    map
}

/// Restore a frame layout from the flat map.
///
/// Missing keys keep their defaults, matching how partially written
/// settings have always been treated. An unknown checksum algorithm name
/// selects `None` (disabled); other malformed values are errors.
pub fn from_map(map: &BTreeMap<String, String>) -> Result<FrameFormat> {
    let mut format = FrameFormat::default();

    if let Some(value) = map.get(KEY_SYNC_WORD) {
        format.sync_word = parse_hex(KEY_SYNC_WORD, value)?;
    }
    if let Some(total) = parse_field::<usize>(map, KEY_TOTAL_FRAME_LENGTH)? {
        format.total_length = total;
    }

    if let Some(enabled) = parse_bool(map, KEY_CHECKSUM_ENABLED)? {
        format.checksum.enabled = enabled;
    }
    if let Some(name) = map.get(KEY_CHECKSUM_ALGORITHM) {
        format.checksum.algorithm = ChecksumAlgorithm::from_name(name);
    }
    if let Some(start) = parse_field::<usize>(map, KEY_CHECKSUM_START_BYTE)? {
        format.checksum.start_byte = start;
    }
    if let Some(end) = parse_field::<usize>(map, KEY_CHECKSUM_END_BYTE)? {
        format.checksum.end_byte = end;
    }
    if let Some(order) = parse_byte_order(map, KEY_CHECKSUM_ENDIANNESS)? {
        format.checksum.byte_order = order;
    }

    let num_channels = parse_field::<usize>(map, KEY_NUM_CHANNELS)?.unwrap_or(0);
    format.set_num_channels(num_channels);

    for index in 0..num_channels {
        let channel = &mut format.channels[index];

        let key = channel_key(index, "byte_offset");
        if let Some(offset) = parse_field::<usize>(map, &key)? {
            channel.byte_offset = offset;
        }
        let key = channel_key(index, "format");
        if let Some(value) = map.get(&key) {
            channel.format =
                SampleFormat::from_name(value).ok_or_else(|| SettingsError::InvalidValue {
                    key,
                    value: value.clone(),
                })?;
        }
        let key = channel_key(index, "endianness");
        if let Some(order) = parse_byte_order(map, &key)? {
            channel.byte_order = order;
        }
        let key = channel_key(index, "enabled");
        if let Some(enabled) = parse_bool(map, &key)? {
            channel.enabled = enabled;
        }
        // channel.<i>.byte_length is accepted but ignored: the length is
        // derived from the format.
    }

    Ok(format)
}

/// Write a frame layout to a JSON settings file.
pub fn write_file(path: &Path, format: &FrameFormat) -> Result<()> {
    let map = to_map(format);
    let json = serde_json::to_string_pretty(&map)?;
    std::fs::write(path, json)
        .map_err(|err| SettingsError::LoadFailed(format!("{}: {err}", path.display())))
}

/// Read a frame layout from a JSON settings file.
pub fn read_file(path: &Path) -> Result<FrameFormat> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| SettingsError::LoadFailed(format!("{}: {err}", path.display())))?;
    let map: BTreeMap<String, String> = serde_json::from_str(&content)?;
    from_map(&map)
}

fn parse_field<T: FromStr>(map: &BTreeMap<String, String>, key: &str) -> Result<Option<T>> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| SettingsError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
            }),
    }
}

fn parse_bool(map: &BTreeMap<String, String>, key: &str) -> Result<Option<bool>> {
    match map.get(key).map(String::as_str) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_byte_order(map: &BTreeMap<String, String>, key: &str) -> Result<Option<ByteOrder>> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => {
            ByteOrder::from_name(value).map(Some).ok_or_else(|| {
                SettingsError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                }
            })
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn parse_hex(key: &str, value: &str) -> Result<Vec<u8>> {
    let invalid = || SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    if value.len() % 2 != 0 {
        return Err(invalid());
    }

    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| invalid()))
        .collect()
}
