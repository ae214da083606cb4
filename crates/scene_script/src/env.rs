//! Script-side construction of scene entities.

use std::rc::Rc;

use scene_core::{Component, Node, SceneContext};
use scene_io::ComponentRegistry;
use tracing::debug;

use crate::bindings::{Scriptable, component_object, node_object};
use crate::error::ScriptError;
use crate::object::ScriptObject;
use crate::value::ScriptValue;

/// What a script runtime needs to create new entities: the scene context for
/// names and ids, and the registry for component types.
#[derive(Debug, Clone)]
pub struct ScriptEnv {
    ctx: SceneContext,
    registry: Rc<ComponentRegistry>,
}

impl ScriptEnv {
    /// Create an environment.
    #[must_use]
    pub fn new(ctx: SceneContext, registry: Rc<ComponentRegistry>) -> Self {
        Self { ctx, registry }
    }

    /// The scene context new entities draw names and ids from.
    #[must_use]
    pub fn context(&self) -> &SceneContext {
        &self.ctx
    }

    /// Create a detached node. An empty name gets an automatic one.
    #[must_use]
    pub fn create_node(&self, name: &str) -> ScriptObject {
        node_object(&Node::new(&self.ctx, name))
    }

    /// Create a detached component of a registered type. Attach it with the
    /// node object's `addComponent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownComponentType`] if `type_name` is not
    /// registered.
    pub fn create_component(&self, type_name: &str, name: &str) -> Result<ScriptObject, ScriptError> {
        let behavior = self
            .registry
            .create(type_name)
            .ok_or_else(|| ScriptError::UnknownComponentType(type_name.to_string()))?;
        let component = Component::from_boxed(&self.ctx, name, behavior);
        debug!(component = %component.name(), %type_name, "component created from script");
        Ok(component_object(&component))
    }
}

impl Scriptable for ScriptEnv {
    /// A `Scene` object exposing `createNode(name?)` and
    /// `createComponent(type, name?)`.
    fn to_script_object(&self) -> ScriptObject {
        let nodes = self.clone();
        let components = self.clone();
        ScriptObject::builder("Scene")
            .method("createNode", move |args| {
                Ok(nodes.create_node(&args.string_or(0, "")?).into())
            })
            .method("createComponent", move |args| {
                let object = components.create_component(&args.string(0)?, &args.string_or(1, "")?)?;
                Ok(ScriptValue::Object(object))
            })
            .build()
    }
}
