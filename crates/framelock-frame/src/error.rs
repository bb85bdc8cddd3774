/// Configuration problems that suspend frame processing.
///
/// These are persistent states, not per-frame conditions: the assembler
/// refuses to buffer bytes until the configuration is corrected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The sync word has no bytes; frames cannot be located.
    #[error("sync word is empty")]
    EmptySyncWord,

    /// Two channels claim intersecting byte ranges.
    #[error("channel {first} and {second} have overlapping byte ranges")]
    ChannelOverlap { first: usize, second: usize },

    /// A channel's byte range runs past the end of the frame.
    #[error("channel {channel} extends beyond the frame size ({frame_size} bytes)")]
    ChannelOutOfBounds { channel: usize, frame_size: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
