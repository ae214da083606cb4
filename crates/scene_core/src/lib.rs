//! # scene_core
//!
//! The scene graph core: a tree of positioned [`Node`]s, each carrying named
//! [`Component`]s with their own lifecycle.
//!
//! This crate provides:
//!
//! - [`SceneContext`]: unique ids and the auto-naming counter.
//! - [`IoPacket`]: the bidirectional named-field stream shared by nodes and
//!   components.
//! - [`Component`] and the [`Behavior`] trait concrete components implement.
//! - [`Node`]: the tree itself, with cascading enable/disable, deferred
//!   removal and parent/scene relative transforms.
//!
//! All of it is single-threaded: handles are `Rc` based and mutation from
//! outside the frame update must happen between frames.

pub mod component;
pub mod ident;
pub mod node;
pub mod packet;

pub use component::{AsAny, Behavior, Component, ComponentContext, ComponentEvent, TypedComponent};
pub use ident::SceneContext;
pub use node::{Node, NodeHooks, PlainNode, RelativeTo, WeakNode};
pub use packet::{Direction, IoPacket, PacketError};
pub use scene_math::{Quat, Transform, Vec3};
