//! Nodes: the positioned, named elements of the scene tree.
//!
//! A [`Node`] owns its children and its components, both keyed by name, and
//! holds a weak reference to its parent. Its full name is the chain of names
//! from the root joined with `/`.
//!
//! Enabling and disabling cascade down the tree. A node (or component) that
//! was disabled directly stays disabled when an ancestor is re-enabled, until
//! it is enabled directly again.
//!
//! Removal requested from inside a frame is deferred: [`Node::kill`] marks the
//! node and its parent reaps it after the children have been updated.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use scene_math::{Quat, Transform, Vec3, rotation_between};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::component::{AsAny, Behavior, Component, TypedComponent};
use crate::ident::SceneContext;
use crate::packet::{IoPacket, PacketError};

/// Reference frame for transform accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelativeTo {
    /// Relative to the parent node (local space).
    #[default]
    Parent,
    /// Relative to the scene root (world space).
    Scene,
}

/// Extension hooks for specialized node kinds.
///
/// Hooks are not re-entered: a hook that triggers the same hook on the same
/// node again is skipped for the nested call.
pub trait NodeHooks: AsAny {
    /// Called when the node becomes initialized.
    fn on_initialize(&mut self, _node: &Node) {}

    /// Called when the node returns to uninitialized.
    fn on_deinitialize(&mut self, _node: &Node) {}

    /// Called after the node and its subtree were enabled.
    fn on_enable(&mut self, _node: &Node) {}

    /// Called after the node and its subtree were disabled.
    fn on_disable(&mut self, _node: &Node) {}

    /// Called every frame after the node's components were updated.
    fn on_update(&mut self, _node: &Node, _dt: f64) {}

    /// Stream additional node fields, after the base fields.
    ///
    /// # Errors
    ///
    /// Propagate any [`PacketError`] from the packet.
    fn on_serialize(&mut self, _packet: &mut IoPacket) -> Result<(), PacketError> {
        Ok(())
    }
}

/// A node with no extra behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainNode;

impl NodeHooks for PlainNode {}

type TransformListener = Rc<dyn Fn(&Node)>;

struct NodeData {
    name: String,
    id: Uuid,
    transform: Transform,
    parent: WeakNode,
    children: BTreeMap<String, Node>,
    components: BTreeMap<String, Component>,
    enabled: bool,
    initialized: bool,
    user_disabled: bool,
    /// Set while a component pass runs; transform changes are only recorded.
    updating: bool,
    transform_dirty: bool,
    killed: bool,
}

struct NodeShared {
    data: RefCell<NodeData>,
    hooks: RefCell<Box<dyn NodeHooks>>,
    listeners: RefCell<Vec<TransformListener>>,
}

/// Shared handle to a scene node.
#[derive(Clone)]
pub struct Node(Rc<NodeShared>);

/// Non-owning reference to a [`Node`].
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeShared>);

impl WeakNode {
    /// The node, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => write!(f, "WeakNode({})", node.name()),
            None => f.write_str("WeakNode(<dropped>)"),
        }
    }
}

fn hooks_any(hooks: &dyn NodeHooks) -> &dyn Any {
    hooks.as_any()
}

impl Node {
    /// The local axis treated as "forward" by callers without a preference.
    pub const DEFAULT_FRONT: Vec3 = Vec3::Z;

    /// Create a detached, uninitialized plain node.
    ///
    /// An empty `name` is replaced by an automatic `"Node-<n>"` name.
    pub fn new(ctx: &SceneContext, name: impl Into<String>) -> Self {
        Self::with_hooks(ctx, name, PlainNode)
    }

    /// Create a node with custom [`NodeHooks`].
    pub fn with_hooks(ctx: &SceneContext, name: impl Into<String>, hooks: impl NodeHooks) -> Self {
        let data = NodeData {
            name: ctx.name_or_auto(name.into(), "Node"),
            id: ctx.new_id(),
            transform: Transform::IDENTITY,
            parent: WeakNode::default(),
            children: BTreeMap::new(),
            components: BTreeMap::new(),
            enabled: false,
            initialized: false,
            user_disabled: false,
            updating: false,
            transform_dirty: false,
            killed: false,
        };
        Self(Rc::new(NodeShared {
            data: RefCell::new(data),
            hooks: RefCell::new(Box::new(hooks)),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// A weak reference to this node.
    #[must_use]
    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// Returns `true` if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> String {
        self.0.data.borrow().name.clone()
    }

    /// Returns the `/`-joined chain of names from the root to this node.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = self.name();
        match self.parent() {
            Some(parent) => format!("{}/{name}", parent.full_name()),
            None => name,
        }
    }

    /// Returns the unique identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.0.data.borrow().id
    }

    /// Returns the parent node, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.0.data.borrow().parent.upgrade()
    }

    /// Returns the topmost ancestor, or this node if it has no parent.
    #[must_use]
    pub fn root(&self) -> Node {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Returns `true` if this node is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Returns whether the node is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.data.borrow().enabled
    }

    /// Returns whether the node is initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.0.data.borrow().initialized
    }

    /// Returns whether the node was marked for removal.
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.0.data.borrow().killed
    }

    /// Snapshot of the children in name order.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.0.data.borrow().children.values().cloned().collect()
    }

    /// Snapshot of the components in name order.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        self.0.data.borrow().components.values().cloned().collect()
    }

    /// Borrow the node's hooks as a `T`, if that is their type. `None` while
    /// one of the hooks is running.
    #[must_use]
    pub fn hooks<T: NodeHooks>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.hooks.try_borrow().ok()?, |hooks| {
            hooks_any(&**hooks).downcast_ref::<T>()
        })
        .ok()
    }

    // ---- children -------------------------------------------------------

    /// Attach `child` under this node, moving it from its previous parent.
    ///
    /// The child is initialized and follows this node's enabled state.
    /// Adding a node that already is a child returns it unchanged. Returns
    /// `None`, logging an error, if another child already uses the name or if
    /// the child is this node or one of its ancestors.
    pub fn add_child_node(&self, child: Node) -> Option<Node> {
        let name = child.name();
        if let Some(existing) = self.child(&name) {
            if existing.ptr_eq(&child) {
                return Some(child);
            }
            error!(node = %self.full_name(), child = %name, "cannot add child node: name already in use");
            return None;
        }
        if child.ptr_eq(self) || child.is_ancestor_of(self) {
            error!(node = %self.full_name(), child = %name, "cannot add child node: it would contain itself");
            return None;
        }

        child.detach();
        child.0.data.borrow_mut().parent = self.downgrade();
        self.0.data.borrow_mut().children.insert(name, child.clone());
        debug!(node = %child.full_name(), "child node attached");

        child.initialize();
        if self.is_enabled() {
            child.enable_cascade();
        } else {
            child.disable_cascade();
        }
        Some(child)
    }

    /// Find a child by exact name. With `recursive`, also searches every
    /// subtree depth-first once no direct child matches.
    #[must_use]
    pub fn find_child_node(&self, name: &str, recursive: bool) -> Option<Node> {
        if let Some(child) = self.child(name) {
            return Some(child);
        }
        if !recursive {
            return None;
        }
        self.children()
            .iter()
            .find_map(|child| child.find_child_node(name, true))
    }

    /// Returns `true` if a direct child uses `name`.
    #[must_use]
    pub fn has_child_node(&self, name: &str) -> bool {
        self.0.data.borrow().children.contains_key(name)
    }

    /// Detach and deinitialize the direct child `name`. Missing names are
    /// ignored.
    pub fn remove_child_node(&self, name: &str) {
        let removed = self.0.data.borrow_mut().children.remove(name);
        if let Some(child) = removed {
            child.deinitialize();
            child.0.data.borrow_mut().parent = WeakNode::default();
            debug!(node = %self.full_name(), child = %name, "child node removed");
        }
    }

    /// Move this node under `parent`, or detach it with `None`. Returns
    /// `false` if the new parent refused it.
    pub fn set_parent(&self, parent: Option<&Node>) -> bool {
        match parent {
            Some(parent) => parent.add_child_node(self.clone()).is_some(),
            None => {
                self.detach();
                true
            }
        }
    }

    /// Mark the node for removal at the end of its parent's next update.
    pub fn kill(&self) {
        self.0.data.borrow_mut().killed = true;
    }

    fn child(&self, name: &str) -> Option<Node> {
        self.0.data.borrow().children.get(name).cloned()
    }

    fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        let name = self.name();
        let removed = {
            let mut data = parent.0.data.borrow_mut();
            let ours = data.children.get(&name).is_some_and(|child| child.ptr_eq(self));
            if ours { data.children.remove(&name) } else { None }
        };
        drop(removed);
        self.0.data.borrow_mut().parent = WeakNode::default();
    }

    // ---- components -----------------------------------------------------

    /// Attach `component`, initialize it and run a zero-delta update pass.
    ///
    /// A component added to a disabled node is disabled with it. Returns
    /// `None`, logging an error, if the name is taken or the component is
    /// bound to a different node.
    pub fn add_component(&self, component: Component) -> Option<Component> {
        let name = component.name();
        if self.has_component(&name) {
            error!(node = %self.full_name(), component = %name, "cannot add component: name already in use");
            return None;
        }
        if !component.bind_node(self) {
            error!(node = %self.full_name(), component = %name, "cannot add component: it belongs to another node");
            return None;
        }

        self.0.data.borrow_mut().components.insert(name, component.clone());
        component.initialize();
        if !self.is_enabled() {
            component.disable_cascade();
        }
        self.run_component_pass(0.0);
        Some(component)
    }

    /// Find a component by name whose behavior is a `T`.
    #[must_use]
    pub fn find_component<T: Behavior>(&self, name: &str) -> Option<TypedComponent<T>> {
        self.component(name)?.downcast::<T>()
    }

    /// Find a component by name regardless of its type.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<Component> {
        self.0.data.borrow().components.get(name).cloned()
    }

    /// Returns `true` if a component uses `name`.
    #[must_use]
    pub fn has_component(&self, name: &str) -> bool {
        self.0.data.borrow().components.contains_key(name)
    }

    /// Deinitialize and remove the component `name`. Missing names are
    /// ignored.
    pub fn remove_component(&self, name: &str) {
        let removed = self.0.data.borrow_mut().components.remove(name);
        if let Some(component) = removed {
            component.deinitialize();
            debug!(node = %self.full_name(), component = %name, "component removed");
        }
    }

    // ---- lifecycle ------------------------------------------------------

    /// Uninitialized → initialized, then tries to enable.
    pub fn initialize(&self) {
        {
            let mut data = self.0.data.borrow_mut();
            if data.initialized {
                return;
            }
            data.initialized = true;
        }
        debug!(node = %self.full_name(), "node initialized");
        self.run_hook(|hooks, node| hooks.on_initialize(node));
        self.enable_cascade();
    }

    /// Disable, then deinitialize every component and child.
    pub fn deinitialize(&self) {
        {
            let mut data = self.0.data.borrow_mut();
            if !data.initialized {
                return;
            }
            data.initialized = false;
        }
        self.disable_cascade();
        for component in self.components() {
            component.deinitialize();
        }
        for child in self.children() {
            child.deinitialize();
        }
        self.run_hook(|hooks, node| hooks.on_deinitialize(node));
        debug!(node = %self.full_name(), "node deinitialized");
    }

    /// Enable this node and lift a previous direct [`Node::disable`].
    ///
    /// Components and children follow unless they were disabled directly.
    /// A no-op while the node is uninitialized. The enabled flag stays off
    /// while the parent is disabled.
    pub fn enable(&self) {
        if self.set_user_disabled(false) {
            self.enable_cascade();
        }
    }

    /// Disable this node, its components and its subtree. The node stays
    /// disabled when its parent is re-enabled. A no-op while uninitialized.
    pub fn disable(&self) {
        if self.set_user_disabled(true) {
            self.disable_cascade();
        }
    }

    fn set_user_disabled(&self, disabled: bool) -> bool {
        let mut data = self.0.data.borrow_mut();
        if data.initialized {
            data.user_disabled = disabled;
        }
        data.initialized
    }

    pub(crate) fn enable_cascade(&self) {
        {
            let data = self.0.data.borrow();
            if !data.initialized || data.enabled || data.user_disabled {
                return;
            }
        }
        if self.parent().is_some_and(|parent| !parent.is_enabled()) {
            return;
        }
        self.0.data.borrow_mut().enabled = true;
        debug!(node = %self.full_name(), "node enabled");

        for component in self.components() {
            component.enable_cascade();
        }
        for child in self.children() {
            child.enable_cascade();
        }
        self.run_hook(|hooks, node| hooks.on_enable(node));
    }

    pub(crate) fn disable_cascade(&self) {
        {
            let mut data = self.0.data.borrow_mut();
            if !data.enabled {
                return;
            }
            data.enabled = false;
        }
        debug!(node = %self.full_name(), "node disabled");

        for component in self.components() {
            component.disable_cascade();
        }
        for child in self.children() {
            child.disable_cascade();
        }
        self.run_hook(|hooks, node| hooks.on_disable(node));
    }

    /// Advance one frame: components, the node's own hook, live children,
    /// then reap children killed during the frame.
    pub fn update(&self, dt: f64) {
        self.run_component_pass(dt);
        self.run_hook(|hooks, node| hooks.on_update(node, dt));
        for child in self.children() {
            if !child.is_killed() {
                child.update(dt);
            }
        }
        self.reap_killed_children();
    }

    fn reap_killed_children(&self) {
        let killed: Vec<String> = self
            .0
            .data
            .borrow()
            .children
            .iter()
            .filter(|(_, child)| child.is_killed())
            .map(|(name, _)| name.clone())
            .collect();
        for name in killed {
            self.remove_child_node(&name);
        }
    }

    fn run_hook(&self, hook: impl FnOnce(&mut dyn NodeHooks, &Node)) {
        let Ok(mut hooks) = self.0.hooks.try_borrow_mut() else {
            return;
        };
        hook(&mut **hooks, self);
    }

    /// Update every component. Transform changes made by the components are
    /// coalesced into one notification after the pass.
    fn run_component_pass(&self, dt: f64) {
        let nested = std::mem::replace(&mut self.0.data.borrow_mut().updating, true);
        for component in self.components() {
            component.update(dt);
        }
        if nested {
            return;
        }
        let moved = {
            let mut data = self.0.data.borrow_mut();
            data.updating = false;
            std::mem::take(&mut data.transform_dirty)
        };
        if moved {
            self.transform_changed();
        }
    }

    // ---- transforms -----------------------------------------------------

    /// Register a callback run whenever the node's position, rotation or
    /// scale changes.
    pub fn connect_position_changed(&self, listener: impl Fn(&Node) + 'static) {
        self.0.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// The local transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.0.data.borrow().transform
    }

    /// The transform relative to the scene root.
    #[must_use]
    pub fn scene_transform(&self) -> Transform {
        self.parent_scene_transform().then(&self.transform())
    }

    fn parent_scene_transform(&self) -> Transform {
        self.parent()
            .map_or(Transform::IDENTITY, |parent| parent.scene_transform())
    }

    /// Position in the given reference frame.
    #[must_use]
    pub fn position(&self, relative_to: RelativeTo) -> Vec3 {
        match relative_to {
            RelativeTo::Parent => self.transform().position,
            RelativeTo::Scene => self.scene_transform().position,
        }
    }

    /// Rotation in the given reference frame.
    #[must_use]
    pub fn rotation(&self, relative_to: RelativeTo) -> Quat {
        match relative_to {
            RelativeTo::Parent => self.transform().rotation,
            RelativeTo::Scene => self.scene_transform().rotation,
        }
    }

    /// Scale in the given reference frame.
    #[must_use]
    pub fn scale(&self, relative_to: RelativeTo) -> Vec3 {
        match relative_to {
            RelativeTo::Parent => self.transform().scale,
            RelativeTo::Scene => self.scene_transform().scale,
        }
    }

    /// Set the position, interpreted in the given reference frame.
    pub fn set_position(&self, position: Vec3, relative_to: RelativeTo) {
        let local = match relative_to {
            RelativeTo::Parent => position,
            RelativeTo::Scene => self.parent_scene_transform().inverse_transform_point(position),
        };
        self.0.data.borrow_mut().transform.position = local;
        self.transform_changed();
    }

    /// Shorthand for [`Node::set_position`] from components.
    pub fn set_position_xyz(&self, x: f32, y: f32, z: f32, relative_to: RelativeTo) {
        self.set_position(Vec3::new(x, y, z), relative_to);
    }

    /// Set the rotation, interpreted in the given reference frame.
    pub fn set_rotation(&self, rotation: Quat, relative_to: RelativeTo) {
        let local = match relative_to {
            RelativeTo::Parent => rotation,
            RelativeTo::Scene => self.parent_scene_transform().inverse_rotation(rotation),
        };
        self.0.data.borrow_mut().transform.rotation = local.normalize();
        self.transform_changed();
    }

    /// Set the scale, interpreted in the given reference frame.
    pub fn set_scale(&self, scale: Vec3, relative_to: RelativeTo) {
        let local = match relative_to {
            RelativeTo::Parent => scale,
            RelativeTo::Scene => self.parent_scene_transform().inverse_scale(scale),
        };
        self.0.data.borrow_mut().transform.scale = local;
        self.transform_changed();
    }

    /// Scale all axes by `factor`.
    pub fn set_uniform_scale(&self, factor: f32, relative_to: RelativeTo) {
        self.set_scale(Vec3::splat(factor), relative_to);
    }

    /// Rotate so that `front` (in the node's local axes) points along
    /// `direction`. A zero `direction` leaves the rotation unchanged.
    pub fn set_direction(&self, direction: Vec3, front: Vec3, relative_to: RelativeTo) {
        if let Some(rotation) = rotation_between(front, direction) {
            self.set_rotation(rotation, relative_to);
        }
    }

    /// Rotate so that `front` points at `target`.
    pub fn look_at(&self, target: Vec3, front: Vec3, relative_to: RelativeTo) {
        self.set_direction(target - self.position(relative_to), front, relative_to);
    }

    fn transform_changed(&self) {
        {
            let mut data = self.0.data.borrow_mut();
            if data.updating {
                data.transform_dirty = true;
                return;
            }
            data.updating = true;
        }
        let listeners: Vec<TransformListener> = self.0.listeners.borrow().clone();
        for listener in &listeners {
            listener(self);
        }
        for component in self.components() {
            component.update(0.0);
        }
        let mut data = self.0.data.borrow_mut();
        data.updating = false;
        data.transform_dirty = false;
    }

    // ---- serialization --------------------------------------------------

    /// Stream the node: `uuid`, `name`, `enabled` (default `true`),
    /// `position`, `scale`, `rotation`, then the hooks' own fields.
    ///
    /// Children and components are not included; see the scene serializer.
    /// On read the `enabled` field restores the sticky state of a direct
    /// [`Node::disable`], also on a node that is not initialized yet.
    ///
    /// # Errors
    ///
    /// [`PacketError::Busy`] when called from one of the node's own hooks.
    /// Otherwise propagates any [`PacketError`] from the packet or the hooks.
    pub fn serialize(&self, packet: &mut IoPacket) -> Result<(), PacketError> {
        let mut hooks = self
            .0
            .hooks
            .try_borrow_mut()
            .map_err(|_| PacketError::Busy(self.name()))?;
        let enabled = {
            let mut data = self.0.data.borrow_mut();
            let data = &mut *data;
            packet.stream(&mut data.id, "uuid")?;

            let mut name = data.name.clone();
            packet.stream(&mut name, "name")?;
            if name != data.name {
                if data.parent.upgrade().is_some() {
                    warn!(node = %data.name, requested = %name, "not renaming a parented node");
                } else {
                    data.name = name;
                }
            }

            let mut enabled = !data.user_disabled;
            packet.stream_or(&mut enabled, "enabled", true)?;
            data.user_disabled = !enabled;
            packet.stream_or(&mut data.transform.position, "position", Vec3::ZERO)?;
            packet.stream_or(&mut data.transform.scale, "scale", Vec3::ONE)?;
            packet.stream_or(&mut data.transform.rotation, "rotation", Quat::IDENTITY)?;
            enabled
        };
        hooks.on_serialize(packet)?;
        drop(hooks);

        if !packet.is_serializing() {
            if enabled {
                self.enable_cascade();
            } else {
                self.disable_cascade();
            }
            self.transform_changed();
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.data.try_borrow() {
            Ok(data) => f
                .debug_struct("Node")
                .field("name", &data.name)
                .field("id", &data.id)
                .field("enabled", &data.enabled)
                .field("children", &data.children.keys().collect::<Vec<_>>())
                .field("components", &data.components.keys().collect::<Vec<_>>())
                .finish(),
            Err(_) => f.write_str("Node(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::component::ComponentContext;

    #[derive(Debug, Default)]
    struct Weapon {
        updates: u32,
    }

    impl Behavior for Weapon {
        fn type_name(&self) -> &'static str {
            "Weapon"
        }

        fn on_update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
            self.updates += 1;
        }
    }

    #[derive(Debug)]
    struct Armor;

    impl Behavior for Armor {
        fn type_name(&self) -> &'static str {
            "Armor"
        }
    }

    /// Moves its node by one unit along X every frame and on every pass.
    #[derive(Debug)]
    struct Drifter;

    impl Behavior for Drifter {
        fn type_name(&self) -> &'static str {
            "Drifter"
        }

        fn on_update(&mut self, ctx: &ComponentContext<'_>, _dt: f64) {
            if let Some(node) = ctx.node() {
                let position = node.position(RelativeTo::Parent);
                node.set_position(position + Vec3::X, RelativeTo::Parent);
            }
        }
    }

    /// Disables its own node on the first update.
    #[derive(Debug, Default)]
    struct Breaker {
        disabled: u32,
    }

    impl Behavior for Breaker {
        fn type_name(&self) -> &'static str {
            "Breaker"
        }

        fn on_disable(&mut self, _ctx: &ComponentContext<'_>) {
            self.disabled += 1;
        }

        fn on_update(&mut self, ctx: &ComponentContext<'_>, _dt: f64) {
            if let Some(node) = ctx.node() {
                assert!(node.find_component::<Breaker>(ctx.name()).is_some());
                node.disable();
            }
        }
    }

    #[derive(Debug, Default)]
    struct FrameCounter {
        frames: u32,
    }

    impl NodeHooks for FrameCounter {
        fn on_update(&mut self, _node: &Node, _dt: f64) {
            self.frames += 1;
        }
    }

    /// Saves its own node every frame.
    #[derive(Debug, Default)]
    struct Autosave {
        outcome: Option<Result<(), PacketError>>,
        saw_own_hooks: Option<bool>,
    }

    impl NodeHooks for Autosave {
        fn on_update(&mut self, node: &Node, _dt: f64) {
            self.outcome = Some(node.serialize(&mut IoPacket::serializing()));
            self.saw_own_hooks = Some(node.hooks::<Autosave>().is_some());
        }
    }

    fn root(ctx: &SceneContext) -> Node {
        let root = Node::new(ctx, "root");
        root.initialize();
        root
    }

    fn assert_vec_near(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, 1e-5),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_auto_names() {
        let ctx = SceneContext::new();
        assert_eq!(Node::new(&ctx, "").name(), "Node-1");
        assert_eq!(Node::new(&ctx, "").name(), "Node-2");
    }

    #[test]
    fn test_full_name_follows_reparenting() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let player = root.add_child_node(Node::new(&ctx, "player")).unwrap();
        let arm = player.add_child_node(Node::new(&ctx, "arm")).unwrap();
        assert_eq!(arm.full_name(), "root/player/arm");

        assert!(arm.set_parent(Some(&root)));
        assert_eq!(arm.full_name(), "root/arm");
        assert!(!player.has_child_node("arm"));

        assert!(arm.set_parent(None));
        assert_eq!(arm.full_name(), "arm");
        assert!(!root.has_child_node("arm"));
    }

    #[test]
    fn test_duplicate_child_name_rejected() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let first = root.add_child_node(Node::new(&ctx, "player")).unwrap();
        assert!(root.add_child_node(Node::new(&ctx, "player")).is_none());
        assert!(root.find_child_node("player", false).unwrap().ptr_eq(&first));
        // Re-adding the same node is a no-op.
        assert!(root.add_child_node(first.clone()).is_some());
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_cycles_rejected() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let child = root.add_child_node(Node::new(&ctx, "child")).unwrap();
        assert!(root.add_child_node(root.clone()).is_none());
        assert!(child.add_child_node(root.clone()).is_none());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_find_child_node_recursive() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let a = root.add_child_node(Node::new(&ctx, "a")).unwrap();
        let b = root.add_child_node(Node::new(&ctx, "b")).unwrap();
        let deep_a = a.add_child_node(Node::new(&ctx, "target")).unwrap();
        b.add_child_node(Node::new(&ctx, "target")).unwrap();

        assert!(root.find_child_node("target", false).is_none());
        assert!(root.find_child_node("target", true).unwrap().ptr_eq(&deep_a));
        assert!(root.find_child_node("missing", true).is_none());
    }

    #[test]
    fn test_duplicate_component_name_rejected() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        let weapon = node
            .add_component(Component::new(&ctx, "Weapon", Weapon::default()))
            .unwrap();
        assert!(node
            .add_component(Component::new(&ctx, "Weapon", Armor))
            .is_none());
        assert!(node.component("Weapon").unwrap().ptr_eq(&weapon));
        assert!(node.find_component::<Weapon>("Weapon").is_some());
        assert!(weapon.is_enabled());
    }

    #[test]
    fn test_find_component_type_mismatch() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        node.add_component(Component::new(&ctx, "gear", Armor)).unwrap();
        assert!(node.find_component::<Weapon>("gear").is_none());
        assert!(node.find_component::<Armor>("gear").is_some());
        assert!(node.find_component::<Armor>("missing").is_none());
    }

    #[test]
    fn test_add_component_runs_zero_delta_pass() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        let weapon = node
            .add_component(Component::new(&ctx, "Weapon", Weapon::default()))
            .unwrap();
        let weapon = weapon.downcast::<Weapon>().unwrap();
        assert_eq!(weapon.borrow().updates, 1);
    }

    #[test]
    fn test_component_on_disabled_node_is_disabled() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        node.disable();
        let component = node
            .add_component(Component::new(&ctx, "gear", Armor))
            .unwrap();
        assert!(component.is_initialized());
        assert!(!component.is_enabled());

        node.enable();
        assert!(component.is_enabled());
    }

    #[test]
    fn test_child_of_disabled_parent_is_disabled() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        root.disable();
        let child = root.add_child_node(Node::new(&ctx, "child")).unwrap();
        assert!(child.is_initialized());
        assert!(!child.is_enabled());
        child.enable();
        assert!(!child.is_enabled());
        root.enable();
        assert!(child.is_enabled());
    }

    #[test]
    fn test_disable_before_initialize_is_ignored() {
        let ctx = SceneContext::new();
        let node = Node::new(&ctx, "root");
        node.disable();
        node.initialize();
        assert!(node.is_enabled());

        let child = Node::new(&ctx, "child");
        child.disable();
        assert!(node.add_child_node(child).unwrap().is_enabled());
    }

    #[test]
    fn test_serialize_from_own_hook_is_busy() {
        let ctx = SceneContext::new();
        let node = Node::with_hooks(&ctx, "autosave", Autosave::default());
        node.initialize();
        node.update(0.1);

        let hooks = node.hooks::<Autosave>().unwrap();
        assert!(matches!(
            &hooks.outcome,
            Some(Err(PacketError::Busy(name))) if name == "autosave"
        ));
        assert_eq!(hooks.saw_own_hooks, Some(false));
        drop(hooks);
        assert!(node.serialize(&mut IoPacket::serializing()).is_ok());
    }

    #[test]
    fn test_direct_disable_survives_parent_reenable() {
        let ctx = SceneContext::new();
        let r = root(&ctx);
        let c = r.add_child_node(Node::new(&ctx, "c")).unwrap();
        let x = c.add_component(Component::new(&ctx, "x", Armor)).unwrap();
        let y = r.add_component(Component::new(&ctx, "y", Armor)).unwrap();

        c.disable();
        r.disable();
        assert!(!x.is_enabled());
        assert!(!y.is_enabled());

        r.enable();
        assert!(r.is_enabled());
        assert!(y.is_enabled());
        assert!(!c.is_enabled());
        assert!(!x.is_enabled());

        c.enable();
        assert!(c.is_enabled());
        assert!(x.is_enabled());
    }

    #[test]
    fn test_direct_component_disable_is_sticky() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        let gear = node.add_component(Component::new(&ctx, "gear", Armor)).unwrap();
        gear.disable();
        node.disable();
        node.enable();
        assert!(!gear.is_enabled());
        gear.enable();
        assert!(gear.is_enabled());
    }

    #[test]
    fn test_remove_deinitializes() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let child = root.add_child_node(Node::new(&ctx, "child")).unwrap();
        let gear = child.add_component(Component::new(&ctx, "gear", Armor)).unwrap();

        root.remove_child_node("child");
        assert!(!root.has_child_node("child"));
        assert!(child.parent().is_none());
        assert!(!child.is_initialized());
        assert!(!gear.is_initialized());

        child.remove_component("gear");
        assert!(!child.has_component("gear"));
        root.remove_child_node("missing");
    }

    #[test]
    fn test_kill_is_deferred_to_parent_update() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let doomed = root
            .add_child_node(Node::with_hooks(&ctx, "doomed", FrameCounter::default()))
            .unwrap();
        let survivor = root
            .add_child_node(Node::with_hooks(&ctx, "survivor", FrameCounter::default()))
            .unwrap();

        doomed.kill();
        assert!(root.has_child_node("doomed"));
        assert!(doomed.is_killed());

        root.update(0.016);
        assert!(!root.has_child_node("doomed"));
        assert!(!doomed.is_initialized());
        assert_eq!(doomed.hooks::<FrameCounter>().unwrap().frames, 0);
        assert_eq!(survivor.hooks::<FrameCounter>().unwrap().frames, 1);
        assert!(survivor.hooks::<PlainNode>().is_none());
    }

    #[test]
    fn test_update_skips_disabled_components() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        let weapon = node
            .add_component(Component::new(&ctx, "Weapon", Weapon::default()))
            .unwrap()
            .downcast::<Weapon>()
            .unwrap();
        node.update(0.1);
        assert_eq!(weapon.borrow().updates, 2);
        weapon.disable();
        node.update(0.1);
        assert_eq!(weapon.borrow().updates, 2);
    }

    #[test]
    fn test_scene_relative_transforms() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        root.set_position(Vec3::new(10.0, 0.0, 0.0), RelativeTo::Parent);
        root.set_rotation(Quat::from_rotation_y(FRAC_PI_2), RelativeTo::Parent);
        let child = root.add_child_node(Node::new(&ctx, "child")).unwrap();
        child.set_position(Vec3::X, RelativeTo::Parent);

        assert_vec_near(child.position(RelativeTo::Parent), Vec3::X);
        assert_vec_near(child.position(RelativeTo::Scene), Vec3::new(10.0, 0.0, -1.0));

        child.set_position(Vec3::new(10.0, 0.0, 2.0), RelativeTo::Scene);
        assert_vec_near(child.position(RelativeTo::Parent), Vec3::new(-2.0, 0.0, 0.0));

        root.set_uniform_scale(2.0, RelativeTo::Parent);
        child.set_scale(Vec3::splat(4.0), RelativeTo::Scene);
        assert_vec_near(child.scale(RelativeTo::Parent), Vec3::splat(2.0));
    }

    #[test]
    fn test_look_at_and_zero_direction() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        node.set_position_xyz(1.0, 0.0, 0.0, RelativeTo::Parent);
        node.look_at(Vec3::new(6.0, 0.0, 0.0), Vec3::NEG_Z, RelativeTo::Parent);
        let facing = node.rotation(RelativeTo::Parent) * Vec3::NEG_Z;
        assert_vec_near(facing, Vec3::X);

        let before = node.rotation(RelativeTo::Parent);
        node.set_direction(Vec3::ZERO, Vec3::NEG_Z, RelativeTo::Parent);
        assert_eq!(node.rotation(RelativeTo::Parent), before);
    }

    #[test]
    fn test_transform_change_notifies_once() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        node.connect_position_changed(move |_| sink.set(sink.get() + 1));

        node.set_position(Vec3::Y, RelativeTo::Parent);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_component_moving_its_node_does_not_recurse() {
        let ctx = SceneContext::new();
        let node = root(&ctx);
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        node.connect_position_changed(move |_| sink.set(sink.get() + 1));

        // The add pass moves the node once; the follow-up pass only marks it.
        node.add_component(Component::new(&ctx, "drift", Drifter)).unwrap();
        assert_eq!(calls.get(), 1);
        assert_vec_near(node.position(RelativeTo::Parent), Vec3::new(2.0, 0.0, 0.0));

        // An external move triggers one notification and a zero-delta pass
        // whose own move is swallowed by the guard.
        node.set_position(Vec3::ZERO, RelativeTo::Parent);
        assert_eq!(calls.get(), 2);
        assert_vec_near(node.position(RelativeTo::Parent), Vec3::X);
    }

    #[test]
    fn test_component_may_disable_its_own_node() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let child = root.add_child_node(Node::new(&ctx, "child")).unwrap();
        let breaker = child.add_component(Component::new(&ctx, "breaker", Breaker::default())).unwrap();
        // The zero-delta pass on add already ran the hook once.
        assert!(!child.is_enabled());
        assert!(!breaker.is_enabled());

        child.enable();
        assert!(breaker.is_enabled());
        root.update(0.1);

        assert!(!child.is_enabled());
        assert!(!breaker.is_enabled());
        let breaker = breaker.downcast::<Breaker>().unwrap();
        assert_eq!(breaker.borrow().disabled, 2);
    }

    #[test]
    fn test_serialize_round_trip_keeps_parented_name() {
        let ctx = SceneContext::new();
        let root = root(&ctx);
        let child = root.add_child_node(Node::new(&ctx, "child")).unwrap();
        child.set_position(Vec3::new(1.0, 2.0, 3.0), RelativeTo::Parent);
        child.disable();

        let mut packet = IoPacket::serializing();
        child.serialize(&mut packet).unwrap();
        let fields: Vec<_> = packet.field_names().collect();
        assert_eq!(fields, ["uuid", "name", "enabled", "position", "scale", "rotation"]);

        let fresh = Node::new(&ctx, "fresh");
        fresh.serialize(&mut packet.into_deserializing()).unwrap();
        assert_eq!(fresh.name(), "child");
        assert_eq!(fresh.id(), child.id());
        assert_vec_near(fresh.position(RelativeTo::Parent), Vec3::new(1.0, 2.0, 3.0));

        let mut rename = IoPacket::serializing();
        child.serialize(&mut rename).unwrap();
        let mut value = rename.into_value();
        value["name"] = serde_json::json!("renamed");
        child.serialize(&mut IoPacket::from_value(value).unwrap()).unwrap();
        assert_eq!(child.name(), "child");
        assert!(root.has_child_node("child"));
    }
}
