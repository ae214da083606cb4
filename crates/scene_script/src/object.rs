//! Script objects: a class name plus closure-backed properties and methods.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use scene_core::{Component, Node};
use scene_math::Vec3;

use crate::error::ScriptError;
use crate::value::ScriptValue;

type Getter = Rc<dyn Fn() -> ScriptValue>;
type Setter = Rc<dyn Fn(ScriptValue) -> Result<(), ScriptError>>;
type Method = Rc<dyn Fn(&Args<'_>) -> Result<ScriptValue, ScriptError>>;

struct Property {
    getter: Getter,
    setter: Option<Setter>,
}

/// The scene entity a script object stands for.
#[derive(Clone, Debug)]
pub enum ScriptTarget {
    /// A node and its subtree.
    Node(Node),
    /// A component attached to, or waiting for, a node.
    Component(Component),
}

struct ObjectInner {
    class_name: &'static str,
    target: Option<ScriptTarget>,
    properties: BTreeMap<&'static str, Property>,
    methods: BTreeMap<&'static str, Method>,
}

/// A script-visible object. Cloning shares the bindings.
#[derive(Clone)]
pub struct ScriptObject(Rc<ObjectInner>);

impl ScriptObject {
    /// Start building an object of the given class.
    #[must_use]
    pub fn builder(class_name: &'static str) -> ScriptObjectBuilder {
        ScriptObjectBuilder {
            inner: ObjectInner {
                class_name,
                target: None,
                properties: BTreeMap::new(),
                methods: BTreeMap::new(),
            },
        }
    }

    /// Returns the class name, e.g. `"Node"`.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.0.class_name
    }

    /// The wrapped scene entity, if any.
    #[must_use]
    pub fn target(&self) -> Option<&ScriptTarget> {
        self.0.target.as_ref()
    }

    /// The wrapped node, if this object stands for one.
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self.target()? {
            ScriptTarget::Node(node) => Some(node),
            ScriptTarget::Component(_) => None,
        }
    }

    /// The wrapped component, if this object stands for one.
    #[must_use]
    pub fn as_component(&self) -> Option<&Component> {
        match self.target()? {
            ScriptTarget::Component(component) => Some(component),
            ScriptTarget::Node(_) => None,
        }
    }

    /// Returns `true` if both objects wrap the same entity.
    #[must_use]
    pub fn same_target(&self, other: &ScriptObject) -> bool {
        match (self.target(), other.target()) {
            (Some(ScriptTarget::Node(a)), Some(ScriptTarget::Node(b))) => a.ptr_eq(b),
            (Some(ScriptTarget::Component(a)), Some(ScriptTarget::Component(b))) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Read a property.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownProperty`] if there is no such property.
    pub fn get(&self, name: &str) -> Result<ScriptValue, ScriptError> {
        let property = self.property(name)?;
        Ok((property.getter)())
    }

    /// Assign a property.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownProperty`], [`ScriptError::ReadOnly`],
    /// or whatever the setter reports for an unsuitable value.
    pub fn set(&self, name: &str, value: ScriptValue) -> Result<(), ScriptError> {
        let property = self.property(name)?;
        let setter = property.setter.as_ref().ok_or_else(|| ScriptError::ReadOnly {
            class: self.0.class_name,
            name: name.to_string(),
        })?;
        setter(value)
    }

    /// Call a method.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownMethod`] or whatever the method reports.
    pub fn call(&self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
        let (method_name, method) = self.0.methods.get_key_value(name).ok_or_else(|| ScriptError::UnknownMethod {
            class: self.0.class_name,
            name: name.to_string(),
        })?;
        method(&Args {
            method: *method_name,
            values: args,
        })
    }

    /// Property names in sorted order.
    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.properties.keys().copied()
    }

    /// Method names in sorted order.
    pub fn method_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.methods.keys().copied()
    }

    /// Returns `true` if the property exists.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.0.properties.contains_key(name)
    }

    /// Returns `true` if the method exists.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.0.methods.contains_key(name)
    }

    fn property(&self, name: &str) -> Result<&Property, ScriptError> {
        self.0.properties.get(name).ok_or_else(|| ScriptError::UnknownProperty {
            class: self.0.class_name,
            name: name.to_string(),
        })
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptObject")
            .field("class", &self.0.class_name)
            .field("target", &self.0.target)
            .finish_non_exhaustive()
    }
}

/// Collects bindings for a [`ScriptObject`].
pub struct ScriptObjectBuilder {
    inner: ObjectInner,
}

impl ScriptObjectBuilder {
    /// Set the wrapped entity.
    #[must_use]
    pub fn target(mut self, target: ScriptTarget) -> Self {
        self.inner.target = Some(target);
        self
    }

    /// Add a read-only property.
    #[must_use]
    pub fn property(mut self, name: &'static str, getter: impl Fn() -> ScriptValue + 'static) -> Self {
        self.inner.properties.insert(
            name,
            Property {
                getter: Rc::new(getter),
                setter: None,
            },
        );
        self
    }

    /// Add a read-write property.
    #[must_use]
    pub fn property_rw(
        mut self,
        name: &'static str,
        getter: impl Fn() -> ScriptValue + 'static,
        setter: impl Fn(ScriptValue) -> Result<(), ScriptError> + 'static,
    ) -> Self {
        self.inner.properties.insert(
            name,
            Property {
                getter: Rc::new(getter),
                setter: Some(Rc::new(setter)),
            },
        );
        self
    }

    /// Add a method.
    #[must_use]
    pub fn method(
        mut self,
        name: &'static str,
        method: impl Fn(&Args<'_>) -> Result<ScriptValue, ScriptError> + 'static,
    ) -> Self {
        self.inner.methods.insert(name, Rc::new(method));
        self
    }

    /// Finish the object.
    #[must_use]
    pub fn build(self) -> ScriptObject {
        ScriptObject(Rc::new(self.inner))
    }
}

/// Positional arguments of one method call, with typed accessors that
/// report [`ScriptError::BadArgument`] on a mismatch.
#[derive(Debug)]
pub struct Args<'a> {
    method: &'static str,
    values: &'a [ScriptValue],
}

impl Args<'_> {
    /// Number of arguments passed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no arguments were passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw argument, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScriptValue> {
        self.values.get(index)
    }

    /// A required string.
    ///
    /// # Errors
    ///
    /// [`ScriptError::BadArgument`] if absent or not a string.
    pub fn string(&self, index: usize) -> Result<String, ScriptError> {
        match self.get(index) {
            Some(ScriptValue::String(s)) => Ok(s.clone()),
            other => Err(self.bad(index, "string", other)),
        }
    }

    /// An optional string.
    ///
    /// # Errors
    ///
    /// [`ScriptError::BadArgument`] if present but not a string.
    pub fn string_or(&self, index: usize, default: &str) -> Result<String, ScriptError> {
        match self.get(index) {
            None | Some(ScriptValue::Undefined) => Ok(default.to_string()),
            _ => self.string(index),
        }
    }

    /// An optional bool.
    ///
    /// # Errors
    ///
    /// [`ScriptError::BadArgument`] if present but not a bool.
    pub fn bool_or(&self, index: usize, default: bool) -> Result<bool, ScriptError> {
        match self.get(index) {
            None | Some(ScriptValue::Undefined) => Ok(default),
            Some(ScriptValue::Bool(v)) => Ok(*v),
            other => Err(self.bad(index, "bool", other)),
        }
    }

    /// A required vector.
    ///
    /// # Errors
    ///
    /// [`ScriptError::BadArgument`] if absent or not a vector.
    pub fn vector(&self, index: usize) -> Result<Vec3, ScriptError> {
        match self.get(index) {
            Some(ScriptValue::Vector(v)) => Ok(*v),
            other => Err(self.bad(index, "vector", other)),
        }
    }

    /// A required node object.
    ///
    /// # Errors
    ///
    /// [`ScriptError::BadArgument`] if absent or not a node object.
    pub fn node(&self, index: usize) -> Result<Node, ScriptError> {
        match self.get(index) {
            Some(ScriptValue::Object(object)) => object.as_node().cloned().ok_or_else(|| self.bad_object(index, "Node", object)),
            other => Err(self.bad(index, "Node", other)),
        }
    }

    /// A required component object.
    ///
    /// # Errors
    ///
    /// [`ScriptError::BadArgument`] if absent or not a component object.
    pub fn component(&self, index: usize) -> Result<Component, ScriptError> {
        match self.get(index) {
            Some(ScriptValue::Object(object)) => object
                .as_component()
                .cloned()
                .ok_or_else(|| self.bad_object(index, "Component", object)),
            other => Err(self.bad(index, "Component", other)),
        }
    }

    fn bad(&self, index: usize, expected: &'static str, found: Option<&ScriptValue>) -> ScriptError {
        ScriptError::BadArgument {
            method: self.method.to_string(),
            index,
            expected,
            found: found.map_or("undefined", ScriptValue::type_label),
        }
    }

    fn bad_object(&self, index: usize, expected: &'static str, found: &ScriptObject) -> ScriptError {
        ScriptError::BadArgument {
            method: self.method.to_string(),
            index,
            expected,
            found: found.class_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn counter() -> (ScriptObject, Rc<Cell<f64>>) {
        let value = Rc::new(Cell::new(0.0));
        let (get, set, add) = (Rc::clone(&value), Rc::clone(&value), Rc::clone(&value));
        let object = ScriptObject::builder("Counter")
            .property_rw(
                "value",
                move || get.get().into(),
                move |v| match v {
                    ScriptValue::Number(n) => {
                        set.set(n);
                        Ok(())
                    }
                    other => Err(ScriptError::InvalidValue {
                        property: "value".into(),
                        expected: "number",
                        found: other.type_label(),
                    }),
                },
            )
            .property("label", || "counter".into())
            .method("bump", move |args| {
                let by = if args.bool_or(0, false)? { 10.0 } else { 1.0 };
                add.set(add.get() + by);
                Ok(add.get().into())
            })
            .build();
        (object, value)
    }

    #[test]
    fn test_get_set_call() {
        let (object, value) = counter();
        object.set("value", 2.0.into()).unwrap();
        assert_eq!(value.get(), 2.0);
        assert_eq!(object.call("bump", &[]).unwrap().as_number(), Some(3.0));
        assert_eq!(object.call("bump", &[true.into()]).unwrap().as_number(), Some(13.0));
        assert_eq!(object.get("label").unwrap().as_str(), Some("counter"));
    }

    #[test]
    fn test_errors() {
        let (object, _) = counter();
        assert!(matches!(object.get("nope"), Err(ScriptError::UnknownProperty { .. })));
        assert!(matches!(object.call("nope", &[]), Err(ScriptError::UnknownMethod { .. })));
        assert!(matches!(
            object.set("label", "x".into()),
            Err(ScriptError::ReadOnly { class: "Counter", .. })
        ));
        assert!(matches!(
            object.set("value", true.into()),
            Err(ScriptError::InvalidValue { found: "bool", .. })
        ));
        let err = object.call("bump", &["yes".into()]).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::BadArgument { index: 0, expected: "bool", found: "string", .. }
        ));
    }

    #[test]
    fn test_introspection() {
        let (object, _) = counter();
        assert_eq!(object.class_name(), "Counter");
        assert_eq!(object.property_names().collect::<Vec<_>>(), ["label", "value"]);
        assert!(object.has_method("bump"));
        assert!(object.target().is_none());
    }
}
