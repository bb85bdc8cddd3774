//! Flat key-value persistence for framelock frame layouts.
//!
//! A [`framelock_frame::FrameFormat`] round-trips through a
//! `BTreeMap<String, String>`: sync word as a hex string, one record of
//! keys per channel, checksum algorithm identified by its stable name.
//! JSON file helpers sit on top of the map form.

pub mod error;
pub mod persist;

pub use error::{Result, SettingsError};
pub use persist::{from_map, read_file, to_map, write_file};
