//! Whole-tree persistence.
//!
//! A saved node is one packet: the node's own fields, then a `components`
//! list of component packets (each led by its `type` tag), then a `children`
//! list of node packets of the same shape.
//!
//! Loading reverses this. The `type` tag is read before anything else so the
//! registry can build the right behavior, which then streams the rest of the
//! packet itself.

use std::fs;
use std::path::Path;

use scene_core::{Component, IoPacket, Node, PacketError, SceneContext};
use serde_json::Value;
use tracing::{debug, info};

use crate::codec::{self, Format};
use crate::error::SceneIoError;
use crate::registry::ComponentRegistry;

const COMPONENTS: &str = "components";
const CHILDREN: &str = "children";

/// Saves node trees and rebuilds them through a [`ComponentRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct SceneSerializer<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> SceneSerializer<'a> {
    /// Create a serializer that resolves component types through `registry`.
    #[must_use]
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Write `node`, its components and its subtree into a packet.
    ///
    /// Children marked with [`Node::kill`] are left out.
    ///
    /// # Errors
    ///
    /// Returns [`SceneIoError::Packet`] if any node or component fails to
    /// stream.
    pub fn save(&self, node: &Node) -> Result<IoPacket, SceneIoError> {
        let mut packet = IoPacket::serializing();
        node.serialize(&mut packet)?;

        let components = node
            .components()
            .iter()
            .map(|component| {
                let mut out = IoPacket::serializing();
                component.serialize(&mut out)?;
                Ok(out)
            })
            .collect::<Result<Vec<_>, PacketError>>()?;
        packet.write_packets(COMPONENTS, components)?;

        let children = node
            .children()
            .iter()
            .filter(|child| !child.is_killed())
            .map(|child| self.save(child))
            .collect::<Result<Vec<_>, _>>()?;
        packet.write_packets(CHILDREN, children)?;
        Ok(packet)
    }

    /// Rebuild a detached, uninitialized node tree from a packet.
    ///
    /// Components and children are attached as they are read. Initialize the
    /// returned root (or attach it under an initialized node) to enable the
    /// tree; entities saved as disabled stay disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SceneIoError::UnknownComponentType`] for an unregistered
    /// `type` tag, [`SceneIoError::Packet`] for missing or malformed fields,
    /// and a rejection error if two entities share a name.
    pub fn load(&self, ctx: &SceneContext, packet: IoPacket) -> Result<Node, SceneIoError> {
        let mut packet = packet.into_deserializing();
        // Read the name up front so the node never draws an automatic one.
        let name: String = packet.read("name")?;
        let node = Node::new(ctx, name);
        node.serialize(&mut packet)?;

        for component_packet in packet.read_packets(COMPONENTS)? {
            let component = self.load_component(ctx, component_packet)?;
            let component_name = component.name();
            if node.add_component(component).is_none() {
                return Err(SceneIoError::ComponentRejected {
                    node: node.full_name(),
                    component: component_name,
                });
            }
        }

        for child_packet in packet.read_packets(CHILDREN)? {
            let child = self.load(ctx, child_packet)?;
            let child_name = child.name();
            if node.add_child_node(child).is_none() {
                return Err(SceneIoError::ChildRejected {
                    node: node.full_name(),
                    child: child_name,
                });
            }
        }

        debug!(node = %node.name(), "node loaded");
        Ok(node)
    }

    /// Rebuild one detached component from its packet.
    ///
    /// # Errors
    ///
    /// See [`SceneSerializer::load`].
    pub fn load_component(&self, ctx: &SceneContext, packet: IoPacket) -> Result<Component, SceneIoError> {
        let mut packet = packet.into_deserializing();
        let type_name: String = packet.read("type")?;
        let behavior = self
            .registry
            .create(&type_name)
            .ok_or_else(|| SceneIoError::UnknownComponentType(type_name.clone()))?;
        // The placeholder name is replaced by the streamed one.
        let component = Component::from_boxed(ctx, type_name, behavior);
        component.serialize(&mut packet)?;
        Ok(component)
    }

    /// Save `node` and encode it.
    ///
    /// # Errors
    ///
    /// See [`SceneSerializer::save`] and [`codec::encode`].
    pub fn save_to_bytes(&self, node: &Node, format: Format) -> Result<Vec<u8>, SceneIoError> {
        codec::encode(format, &self.save(node)?.into_value())
    }

    /// Decode bytes and load the tree they hold.
    ///
    /// # Errors
    ///
    /// See [`SceneSerializer::load`] and [`codec::decode`].
    pub fn load_from_bytes(&self, ctx: &SceneContext, format: Format, bytes: &[u8]) -> Result<Node, SceneIoError> {
        let value: Value = codec::decode(format, bytes)?;
        self.load(ctx, IoPacket::from_value(value)?)
    }

    /// Save `node` to `path`, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`SceneIoError::UnknownFormat`] for an unrecognised extension,
    /// [`SceneIoError::Io`] if the file cannot be written, or any save error.
    pub fn save_to_file(&self, node: &Node, path: &Path) -> Result<(), SceneIoError> {
        let format = Format::from_path(path).ok_or_else(|| SceneIoError::UnknownFormat(path.to_path_buf()))?;
        let bytes = self.save_to_bytes(node, format)?;
        fs::write(path, &bytes)?;
        info!(path = %path.display(), ?format, bytes = bytes.len(), "scene saved");
        Ok(())
    }

    /// Load a tree from `path`, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`SceneIoError::UnknownFormat`] for an unrecognised extension,
    /// [`SceneIoError::Io`] if the file cannot be read, or any load error.
    pub fn load_from_file(&self, ctx: &SceneContext, path: &Path) -> Result<Node, SceneIoError> {
        let format = Format::from_path(path).ok_or_else(|| SceneIoError::UnknownFormat(path.to_path_buf()))?;
        let bytes = fs::read(path)?;
        let node = self.load_from_bytes(ctx, format, &bytes)?;
        info!(path = %path.display(), ?format, root = %node.name(), "scene loaded");
        Ok(node)
    }
}
