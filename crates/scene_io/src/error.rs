//! Persistence error types.

use std::path::PathBuf;

use scene_core::PacketError;

/// Errors that can occur while saving or loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneIoError {
    /// A node or component failed to stream its fields.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// A component packet carried a type tag nobody registered.
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),

    /// A loaded component could not be attached, usually a duplicate name.
    #[error("node '{node}' rejected component '{component}'")]
    ComponentRejected {
        /// Full name of the node being loaded.
        node: String,
        /// Name of the rejected component.
        component: String,
    },

    /// A loaded child could not be attached, usually a duplicate name.
    #[error("node '{node}' rejected child '{child}'")]
    ChildRejected {
        /// Full name of the node being loaded.
        node: String,
        /// Name of the rejected child.
        child: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack encoding failed.
    #[error("failed to encode MessagePack: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding failed.
    #[error("failed to decode MessagePack: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Reading or writing a scene file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension does not name a known format.
    #[error("cannot infer scene format from '{}'", .0.display())]
    UnknownFormat(PathBuf),
}
