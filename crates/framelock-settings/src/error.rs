/// Errors that can occur while persisting or restoring a frame layout.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("failed to load settings: {0}")]
    LoadFailed(String),

    /// A stored value could not be interpreted.
    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: String, value: String },

    /// The settings file is not valid JSON.
    #[error("settings are not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
