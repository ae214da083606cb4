//! # scene_io
//!
//! Saving and loading whole scene trees.
//!
//! This crate provides:
//!
//! - [`registry`]: the component type registry that turns a persisted
//!   `type` tag back into a fresh behavior.
//! - [`serializer`]: [`SceneSerializer`], which walks a node tree into nested
//!   packets and rebuilds it.
//! - [`codec`]: JSON and MessagePack encoding of packet trees.
//! - [`error`]: [`SceneIoError`].

pub mod codec;
pub mod error;
pub mod registry;
pub mod serializer;

pub use codec::{Format, decode, encode};
pub use error::SceneIoError;
pub use registry::{BehaviorFactory, ComponentRegistry};
pub use serializer::SceneSerializer;
