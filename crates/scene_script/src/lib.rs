//! # scene_script
//!
//! The adapter layer an embedded script runtime talks to.
//!
//! This crate provides:
//!
//! - [`ScriptValue`]: the dynamic value passed across the boundary.
//! - [`ScriptObject`]: a class name plus named properties and methods backed
//!   by closures over a node or component handle.
//! - [`Scriptable`]: the single conversion from a scene entity to its
//!   script object.
//! - [`ScriptEnv`]: script-side construction of nodes and components.
//!
//! Scene entities never hold on to their script objects; a fresh object is
//! built on every conversion and merely wraps a handle.

pub mod bindings;
pub mod env;
pub mod error;
pub mod object;
pub mod value;

pub use bindings::{Scriptable, component_object, node_object};
pub use env::ScriptEnv;
pub use error::ScriptError;
pub use object::{Args, ScriptObject, ScriptObjectBuilder, ScriptTarget};
pub use value::ScriptValue;
