//! Wire codecs for packet trees.
//!
//! Scenes are plain `serde` values, so any self-describing format works. JSON
//! is the readable default; MessagePack is the compact binary alternative.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SceneIoError;

/// On-disk encoding of a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// MessagePack.
    MessagePack,
}

impl Format {
    /// Pick the format from a file extension: `.json`, or `.msgpack`/`.mpk`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "msgpack" | "mpk" => Some(Self::MessagePack),
            _ => None,
        }
    }

    /// The preferred file extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::MessagePack => "msgpack",
        }
    }
}

/// Encode a value in the given format.
///
/// # Errors
///
/// Returns [`SceneIoError::Json`] or [`SceneIoError::Encode`] if
/// serialisation fails.
pub fn encode<T: Serialize>(format: Format, value: &T) -> Result<Vec<u8>, SceneIoError> {
    match format {
        Format::Json => Ok(serde_json::to_vec_pretty(value)?),
        Format::MessagePack => Ok(rmp_serde::to_vec_named(value)?),
    }
}

/// Decode a value from bytes in the given format.
///
/// # Errors
///
/// Returns [`SceneIoError::Json`] or [`SceneIoError::Decode`] if
/// deserialisation fails.
pub fn decode<T: DeserializeOwned>(format: Format, bytes: &[u8]) -> Result<T, SceneIoError> {
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::MessagePack => Ok(rmp_serde::from_slice(bytes)?),
    }
}
