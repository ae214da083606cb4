//! Adapters from scene entities to script objects.
//!
//! Property and method names follow script conventions (`camelCase`). Every
//! binding closes over a cloned entity handle, so an object stays usable after
//! the entity is detached from the tree.

use scene_core::{Component, Node, RelativeTo};

use crate::error::ScriptError;
use crate::object::{Args, ScriptObject, ScriptTarget};
use crate::value::ScriptValue;

/// Conversion of a scene entity into its script object.
pub trait Scriptable {
    /// Build a fresh script object wrapping `self`.
    fn to_script_object(&self) -> ScriptObject;
}

impl Scriptable for Node {
    fn to_script_object(&self) -> ScriptObject {
        node_object(self)
    }
}

impl Scriptable for Component {
    fn to_script_object(&self) -> ScriptObject {
        component_object(self)
    }
}

type NodeMethod = fn(&Node, &Args<'_>) -> Result<ScriptValue, ScriptError>;
type NodeSetter = fn(&Node, ScriptValue) -> Result<(), ScriptError>;

fn node_getter(node: &Node, get: fn(&Node) -> ScriptValue) -> impl Fn() -> ScriptValue + 'static {
    let node = node.clone();
    move || get(&node)
}

fn node_setter(node: &Node, set: NodeSetter) -> impl Fn(ScriptValue) -> Result<(), ScriptError> + 'static {
    let node = node.clone();
    move |value| set(&node, value)
}

fn node_method(node: &Node, call: NodeMethod) -> impl Fn(&Args<'_>) -> Result<ScriptValue, ScriptError> + 'static {
    let node = node.clone();
    move |args: &Args<'_>| call(&node, args)
}

fn invalid(property: &str, expected: &'static str, found: &ScriptValue) -> ScriptError {
    ScriptError::InvalidValue {
        property: property.to_string(),
        expected,
        found: found.type_label(),
    }
}

fn set_parent(node: &Node, value: ScriptValue) -> Result<(), ScriptError> {
    match &value {
        ScriptValue::Undefined => {
            node.set_parent(None);
            Ok(())
        }
        ScriptValue::Object(object) => {
            let parent = object.as_node().ok_or_else(|| invalid("parent", "Node", &value))?;
            if node.set_parent(Some(parent)) {
                Ok(())
            } else {
                Err(ScriptError::Rejected(format!(
                    "'{}' cannot become a child of '{}'",
                    node.full_name(),
                    parent.full_name()
                )))
            }
        }
        other => Err(invalid("parent", "Node", other)),
    }
}

/// Build the script object for a node.
#[must_use]
pub fn node_object(node: &Node) -> ScriptObject {
    ScriptObject::builder("Node")
        .target(ScriptTarget::Node(node.clone()))
        .property("name", node_getter(node, |n| n.name().into()))
        .property("fullName", node_getter(node, |n| n.full_name().into()))
        .property_rw(
            "parent",
            node_getter(node, |n| n.parent().map(|p| node_object(&p)).into()),
            node_setter(node, set_parent),
        )
        .property("isEnabled", node_getter(node, |n| n.is_enabled().into()))
        .property_rw(
            "position",
            node_getter(node, |n| n.position(RelativeTo::Parent).into()),
            node_setter(node, |n, value| {
                let position = value.as_vector().ok_or_else(|| invalid("position", "vector", &value))?;
                n.set_position(position, RelativeTo::Parent);
                Ok(())
            }),
        )
        .property_rw(
            "rotation",
            node_getter(node, |n| n.rotation(RelativeTo::Parent).into()),
            node_setter(node, |n, value| {
                let rotation = value.as_rotation().ok_or_else(|| invalid("rotation", "rotation", &value))?;
                n.set_rotation(rotation, RelativeTo::Parent);
                Ok(())
            }),
        )
        .property_rw(
            "scale",
            node_getter(node, |n| n.scale(RelativeTo::Parent).into()),
            node_setter(node, |n, value| {
                let scale = value.as_vector().ok_or_else(|| invalid("scale", "vector", &value))?;
                n.set_scale(scale, RelativeTo::Parent);
                Ok(())
            }),
        )
        .method(
            "addChildNode",
            node_method(node, |n, args| {
                Ok(n.add_child_node(args.node(0)?).map(|c| node_object(&c)).into())
            }),
        )
        .method(
            "findChildNode",
            node_method(node, |n, args| {
                let found = n.find_child_node(&args.string(0)?, args.bool_or(1, true)?);
                Ok(found.map(|c| node_object(&c)).into())
            }),
        )
        .method(
            "removeChildNode",
            node_method(node, |n, args| {
                n.remove_child_node(&args.string(0)?);
                Ok(ScriptValue::Undefined)
            }),
        )
        .method(
            "addComponent",
            node_method(node, |n, args| {
                Ok(n.add_component(args.component(0)?).map(|c| component_object(&c)).into())
            }),
        )
        .method(
            "findComponent",
            node_method(node, |n, args| {
                Ok(n.component(&args.string(0)?).map(|c| component_object(&c)).into())
            }),
        )
        .method(
            "hasComponent",
            node_method(node, |n, args| Ok(n.has_component(&args.string(0)?).into())),
        )
        .method(
            "removeComponent",
            node_method(node, |n, args| {
                n.remove_component(&args.string(0)?);
                Ok(ScriptValue::Undefined)
            }),
        )
        .method(
            "enable",
            node_method(node, |n, _| {
                n.enable();
                Ok(ScriptValue::Undefined)
            }),
        )
        .method(
            "disable",
            node_method(node, |n, _| {
                n.disable();
                Ok(ScriptValue::Undefined)
            }),
        )
        .method(
            "kill",
            node_method(node, |n, _| {
                n.kill();
                Ok(ScriptValue::Undefined)
            }),
        )
        .method(
            "setPosition",
            node_method(node, |n, args| {
                let relative_to = if args.bool_or(1, false)? {
                    RelativeTo::Scene
                } else {
                    RelativeTo::Parent
                };
                n.set_position(args.vector(0)?, relative_to);
                Ok(ScriptValue::Undefined)
            }),
        )
        .build()
}

/// Build the script object for a component.
#[must_use]
pub fn component_object(component: &Component) -> ScriptObject {
    let getter = |get: fn(&Component) -> ScriptValue| {
        let component = component.clone();
        move || get(&component)
    };
    let toggle = |enable: bool| {
        let component = component.clone();
        move |_: &Args<'_>| {
            if enable {
                component.enable();
            } else {
                component.disable();
            }
            Ok(ScriptValue::Undefined)
        }
    };

    ScriptObject::builder("Component")
        .target(ScriptTarget::Component(component.clone()))
        .property("name", getter(|c| c.name().into()))
        .property("fullName", getter(|c| c.full_name().into()))
        .property("node", getter(|c| c.node().map(|n| node_object(&n)).into()))
        .property("isEnabled", getter(|c| c.is_enabled().into()))
        .property("isInitialized", getter(|c| c.is_initialized().into()))
        .property("type", getter(|c| c.type_name().into()))
        .method("enable", toggle(true))
        .method("disable", toggle(false))
        .build()
}

#[cfg(test)]
mod tests {
    use scene_core::{Behavior, SceneContext, Vec3};

    use super::*;

    #[derive(Debug)]
    struct Lamp;

    impl Behavior for Lamp {
        fn type_name(&self) -> &'static str {
            "Lamp"
        }
    }

    fn scene(ctx: &SceneContext) -> (Node, Node) {
        let root = Node::new(ctx, "root");
        root.initialize();
        let room = root.add_child_node(Node::new(ctx, "room")).unwrap();
        room.add_component(Component::new(ctx, "lamp", Lamp)).unwrap();
        (root, room)
    }

    #[test]
    fn test_node_properties() {
        let ctx = SceneContext::new();
        let (root, room) = scene(&ctx);
        let object = room.to_script_object();
        assert_eq!(object.class_name(), "Node");
        assert_eq!(object.get("fullName").unwrap().as_str(), Some("root/room"));
        assert_eq!(object.get("isEnabled").unwrap().as_bool(), Some(true));

        let parent = object.get("parent").unwrap();
        assert!(parent.as_object().unwrap().same_target(&root.to_script_object()));
        assert!(root.to_script_object().get("parent").unwrap().is_undefined());

        object.set("position", Vec3::new(1.0, 0.0, 0.0).into()).unwrap();
        assert_eq!(room.position(RelativeTo::Parent), Vec3::X);
        assert!(matches!(
            object.set("name", "x".into()),
            Err(ScriptError::ReadOnly { .. })
        ));
        assert!(matches!(
            object.set("position", 3.0.into()),
            Err(ScriptError::InvalidValue { expected: "vector", .. })
        ));
    }

    #[test]
    fn test_reparent_through_property() {
        let ctx = SceneContext::new();
        let (root, room) = scene(&ctx);
        let hall = root.add_child_node(Node::new(&ctx, "hall")).unwrap();
        let object = room.to_script_object();

        object.set("parent", hall.to_script_object().into()).unwrap();
        assert_eq!(room.full_name(), "root/hall/room");

        let err = hall
            .to_script_object()
            .set("parent", room.to_script_object().into())
            .unwrap_err();
        assert!(matches!(err, ScriptError::Rejected(_)));

        object.set("parent", ScriptValue::Undefined).unwrap();
        assert!(room.parent().is_none());
    }

    #[test]
    fn test_node_methods() {
        let ctx = SceneContext::new();
        let (root, room) = scene(&ctx);
        let object = root.to_script_object();

        let found = object.call("findChildNode", &["room".into()]).unwrap();
        assert!(found.as_object().unwrap().same_target(&room.to_script_object()));
        assert!(object
            .call("findChildNode", &["room".into(), false.into()])
            .unwrap()
            .as_object()
            .is_some());
        assert!(object.call("findChildNode", &["attic".into()]).unwrap().is_undefined());

        let room_object = found.as_object().unwrap();
        assert_eq!(room_object.call("hasComponent", &["lamp".into()]).unwrap().as_bool(), Some(true));
        let lamp = room_object.call("findComponent", &["lamp".into()]).unwrap();
        assert_eq!(lamp.as_object().unwrap().get("type").unwrap().as_str(), Some("Lamp"));

        room_object.call("disable", &[]).unwrap();
        assert!(!room.is_enabled());
        room_object.call("enable", &[]).unwrap();
        assert!(room.is_enabled());

        room_object
            .call("setPosition", &[Vec3::new(0.0, 5.0, 0.0).into(), true.into()])
            .unwrap();
        assert_eq!(room.position(RelativeTo::Scene), Vec3::new(0.0, 5.0, 0.0));

        room_object.call("removeComponent", &["lamp".into()]).unwrap();
        assert!(!room.has_component("lamp"));

        room_object.call("kill", &[]).unwrap();
        assert!(room.is_killed());
        object.call("removeChildNode", &["room".into()]).unwrap();
        assert!(!root.has_child_node("room"));
    }

    #[test]
    fn test_add_child_and_component_from_script() {
        let ctx = SceneContext::new();
        let (root, room) = scene(&ctx);
        let shelf = Node::new(&ctx, "shelf");
        let added = room
            .to_script_object()
            .call("addChildNode", &[shelf.to_script_object().into()])
            .unwrap();
        assert_eq!(added.as_object().unwrap().get("fullName").unwrap().as_str(), Some("root/room/shelf"));

        let bulb = Component::new(&ctx, "bulb", Lamp);
        let attached = shelf
            .to_script_object()
            .call("addComponent", &[bulb.to_script_object().into()])
            .unwrap();
        assert!(attached.as_object().unwrap().same_target(&bulb.to_script_object()));
        assert!(bulb.is_enabled());

        // Duplicate names come back undefined.
        let duplicate = Component::new(&ctx, "bulb", Lamp);
        let result = shelf
            .to_script_object()
            .call("addComponent", &[duplicate.to_script_object().into()])
            .unwrap();
        assert!(result.is_undefined());

        let err = root
            .to_script_object()
            .call("addComponent", &[room.to_script_object().into()])
            .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::BadArgument { expected: "Component", found: "Node", .. }
        ));
    }

    #[test]
    fn test_component_object() {
        let ctx = SceneContext::new();
        let (_root, room) = scene(&ctx);
        let lamp = room.component("lamp").unwrap();
        let object = lamp.to_script_object();

        assert_eq!(object.get("fullName").unwrap().as_str(), Some("root/room/lamp"));
        assert_eq!(object.get("isInitialized").unwrap().as_bool(), Some(true));
        let owner = object.get("node").unwrap();
        assert!(owner.as_object().unwrap().same_target(&room.to_script_object()));

        object.call("disable", &[]).unwrap();
        assert!(!lamp.is_enabled());
        assert_eq!(object.get("isEnabled").unwrap().as_bool(), Some(false));
        object.call("enable", &[]).unwrap();
        assert!(lamp.is_enabled());
        assert!(matches!(object.call("kill", &[]), Err(ScriptError::UnknownMethod { .. })));
    }
}
