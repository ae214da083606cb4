//! Components: named behavior units attached to exactly one [`Node`].
//!
//! A [`Component`] is a shared handle around two things:
//!
//! - the base state every component has (name, id, enabled and initialized
//!   flags, the owning node), managed here and never overridable;
//! - a boxed [`Behavior`], the concrete part supplied by the user.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --initialize--> Initialized(disabled) --enable--> Initialized(enabled)
//!       ^                              |      ^                          |
//!       +---------deinitialize---------+      +---------disable----------+
//! ```
//!
//! Out-of-order calls are no-ops. `enable` only succeeds while the owning node
//! is enabled. A direct `disable` call is sticky: enables cascading down from
//! the node skip the component until `enable` is called on it again.

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::ident::SceneContext;
use crate::node::{Node, WeakNode};
use crate::packet::{IoPacket, PacketError};

/// Upcast to [`Any`] for typed lookups. Implemented for every `'static` type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The overridable part of a component.
///
/// Every hook defaults to a no-op. The behavior is moved out of its
/// component while a hook runs, so a hook may use the owning node and its
/// own component handle. Nested hooks for the same component are skipped,
/// and serializing the component from one of its hooks fails with
/// [`PacketError::Busy`].
///
/// # Examples
///
/// ```rust
/// use scene_core::{Behavior, ComponentContext, IoPacket, PacketError};
///
/// #[derive(Debug, Default)]
/// struct Weapon {
///     power: f32,
/// }
///
/// impl Behavior for Weapon {
///     fn type_name(&self) -> &'static str {
///         "Weapon"
///     }
///
///     fn on_serialize(&mut self, packet: &mut IoPacket) -> Result<(), PacketError> {
///         packet.stream(&mut self.power, "power")
///     }
/// }
/// ```
pub trait Behavior: AsAny {
    /// The type tag written as the `type` field and used to rebuild the
    /// component on load.
    fn type_name(&self) -> &'static str;

    /// Called once when the component becomes initialized.
    fn on_initialize(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Called once when the component returns to uninitialized.
    fn on_deinitialize(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Called on each disabled → enabled transition.
    fn on_enable(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Called on each enabled → disabled transition.
    fn on_disable(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Called every frame while enabled. `dt` is the time since the previous
    /// frame in seconds; it is zero for the synchronous passes a node runs
    /// after a component is added or its transform changes.
    fn on_update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {}

    /// Stream the behavior's own fields. Runs after the base fields.
    ///
    /// # Errors
    ///
    /// Propagate any [`PacketError`] from the packet.
    fn on_serialize(&mut self, _packet: &mut IoPacket) -> Result<(), PacketError> {
        Ok(())
    }
}

/// What a [`Behavior`] hook can see of its component.
#[derive(Debug)]
pub struct ComponentContext<'a> {
    node: Option<Node>,
    name: &'a str,
    enabled: bool,
}

impl ComponentContext<'_> {
    /// The owning node, if the component is attached.
    #[must_use]
    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    /// The component name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Whether the component is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Lifecycle notifications a component emits to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentEvent {
    /// The component was initialized.
    Initialized,
    /// The component was deinitialized.
    Uninitialized,
    /// The component was enabled.
    Enabled,
    /// The component was disabled.
    Disabled,
}

type Listener = Box<dyn FnMut(ComponentEvent)>;

struct ComponentState {
    name: String,
    id: Uuid,
    enabled: bool,
    initialized: bool,
    /// Set by a direct `disable` call; cascading enables leave the component off.
    user_disabled: bool,
    /// `None` until bound; bound at most once.
    node: Option<WeakNode>,
    type_id: TypeId,
    type_name: &'static str,
    /// Taken out while one of its hooks runs.
    behavior: Option<Box<dyn Behavior>>,
}

impl ComponentState {
    fn owner(&self) -> Option<Node> {
        self.node.as_ref().and_then(WeakNode::upgrade)
    }
}

struct ComponentShared {
    state: RefCell<ComponentState>,
    listeners: RefCell<Vec<Listener>>,
}

/// Shared handle to a component. Cloning the handle does not clone the
/// component.
#[derive(Clone)]
pub struct Component(Rc<ComponentShared>);

fn behavior_any(behavior: &dyn Behavior) -> &dyn Any {
    behavior.as_any()
}

fn behavior_any_mut(behavior: &mut dyn Behavior) -> &mut dyn Any {
    behavior.as_any_mut()
}

impl Component {
    /// Create a detached, uninitialized component.
    ///
    /// An empty `name` is replaced by an automatic `"Component-<n>"` name.
    pub fn new(ctx: &SceneContext, name: impl Into<String>, behavior: impl Behavior) -> Self {
        Self::from_boxed(ctx, name, Box::new(behavior))
    }

    /// Like [`Component::new`] for a behavior that is already boxed, e.g. one
    /// produced by a type registry.
    pub fn from_boxed(ctx: &SceneContext, name: impl Into<String>, behavior: Box<dyn Behavior>) -> Self {
        let type_id = behavior_any(&*behavior).type_id();
        let type_name = behavior.type_name();
        let state = ComponentState {
            name: ctx.name_or_auto(name.into(), "Component"),
            id: ctx.new_id(),
            enabled: false,
            initialized: false,
            user_disabled: false,
            node: None,
            type_id,
            type_name,
            behavior: Some(behavior),
        };
        Self(Rc::new(ComponentShared {
            state: RefCell::new(state),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> String {
        self.0.state.borrow().name.clone()
    }

    /// Returns the owning node's full name plus `"/" + name`, or just the name
    /// while detached.
    #[must_use]
    pub fn full_name(&self) -> String {
        let (name, owner) = {
            let state = self.0.state.borrow();
            (state.name.clone(), state.owner())
        };
        match owner {
            Some(node) => format!("{}/{name}", node.full_name()),
            None => name,
        }
    }

    /// Returns the unique identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.0.state.borrow().id
    }

    /// Returns the behavior's type tag.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.state.borrow().type_name
    }

    /// Returns the owning node, if attached and still alive.
    #[must_use]
    pub fn node(&self) -> Option<Node> {
        self.0.state.borrow().owner()
    }

    /// Returns whether the component is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.state.borrow().enabled
    }

    /// Returns whether the component is initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.0.state.borrow().initialized
    }

    /// Returns `true` if both handles point at the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Register a listener for lifecycle notifications.
    pub fn connect(&self, listener: impl FnMut(ComponentEvent) + 'static) {
        self.0.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Binds the owning node. Only the first binding sticks; binding again to
    /// the same node succeeds, any other node is refused.
    pub(crate) fn bind_node(&self, node: &Node) -> bool {
        let mut state = self.0.state.borrow_mut();
        match &state.node {
            None => {
                state.node = Some(node.downgrade());
                true
            }
            Some(bound) => bound.upgrade().is_some_and(|owner| owner.ptr_eq(node)),
        }
    }

    /// Uninitialized → initialized, then tries to enable.
    pub fn initialize(&self) {
        {
            let mut state = self.0.state.borrow_mut();
            if state.initialized {
                return;
            }
            state.initialized = true;
            debug!(component = %state.name, "component initialized");
        }
        self.run_hook(|behavior, ctx| behavior.on_initialize(ctx));
        self.emit(ComponentEvent::Initialized);
        self.enable_cascade();
    }

    /// Initialized → uninitialized, disabling first.
    pub fn deinitialize(&self) {
        {
            let mut state = self.0.state.borrow_mut();
            if !state.initialized {
                return;
            }
            state.initialized = false;
            debug!(component = %state.name, "component deinitialized");
        }
        self.disable_cascade();
        self.run_hook(|behavior, ctx| behavior.on_deinitialize(ctx));
        self.emit(ComponentEvent::Uninitialized);
    }

    /// Enable the component and lift a previous direct [`Component::disable`].
    ///
    /// A no-op while uninitialized. The enabled flag only follows when the
    /// node is enabled too.
    pub fn enable(&self) {
        if self.set_user_disabled(false) {
            self.enable_cascade();
        }
    }

    /// Disable the component and keep it disabled when its node is
    /// re-enabled. A no-op while uninitialized.
    pub fn disable(&self) {
        if self.set_user_disabled(true) {
            self.disable_cascade();
        }
    }

    fn set_user_disabled(&self, disabled: bool) -> bool {
        let mut state = self.0.state.borrow_mut();
        if state.initialized {
            state.user_disabled = disabled;
        }
        state.initialized
    }

    /// Enable on behalf of the owning node; respects a sticky disable.
    pub(crate) fn enable_cascade(&self) {
        {
            let mut state = self.0.state.borrow_mut();
            if !state.initialized || state.enabled || state.user_disabled {
                return;
            }
            if !state.owner().is_some_and(|node| node.is_enabled()) {
                return;
            }
            state.enabled = true;
            debug!(component = %state.name, "component enabled");
        }
        self.run_hook(|behavior, ctx| behavior.on_enable(ctx));
        self.emit(ComponentEvent::Enabled);
    }

    /// Disable on behalf of the owning node.
    pub(crate) fn disable_cascade(&self) {
        {
            let mut state = self.0.state.borrow_mut();
            if !state.enabled {
                return;
            }
            state.enabled = false;
            debug!(component = %state.name, "component disabled");
        }
        self.run_hook(|behavior, ctx| behavior.on_disable(ctx));
        self.emit(ComponentEvent::Disabled);
    }

    /// Run the per-frame hook if enabled.
    ///
    /// A component whose hook is already running (it moved its own node, for
    /// instance) is skipped.
    pub(crate) fn update(&self, dt: f64) {
        if !self.is_enabled() {
            return;
        }
        self.run_hook(|behavior, ctx| behavior.on_update(ctx, dt));
    }

    /// Stream the component: `type` (write only), `uuid`, `name`, `enabled`
    /// (default `true`), then the behavior's own fields.
    ///
    /// On read the `enabled` field restores the sticky state of a direct
    /// [`Component::disable`], also on a component that is not initialized
    /// yet. The name of an attached component is not changed, since its node
    /// keys components by name.
    ///
    /// # Errors
    ///
    /// [`PacketError::Busy`] when called from one of the behavior's own
    /// hooks. Otherwise propagates any [`PacketError`] from the base fields
    /// or the behavior.
    pub fn serialize(&self, packet: &mut IoPacket) -> Result<(), PacketError> {
        let mut behavior = {
            let mut state = self.0.state.borrow_mut();
            state
                .behavior
                .take()
                .ok_or_else(|| PacketError::Busy(state.name.clone()))?
        };
        let streamed = self.stream_fields(packet, &mut *behavior);
        self.0.state.borrow_mut().behavior = Some(behavior);
        let enabled = streamed?;

        if !packet.is_serializing() {
            if enabled {
                self.enable_cascade();
            } else {
                self.disable_cascade();
            }
        }
        Ok(())
    }

    /// Base fields then the behavior's own. Returns the persisted enabled
    /// flag.
    fn stream_fields(&self, packet: &mut IoPacket, behavior: &mut dyn Behavior) -> Result<bool, PacketError> {
        let enabled = {
            let mut state = self.0.state.borrow_mut();
            let state = &mut *state;
            if packet.is_serializing() {
                packet.write("type", state.type_name)?;
            }
            packet.stream(&mut state.id, "uuid")?;

            let mut name = state.name.clone();
            packet.stream(&mut name, "name")?;
            if name != state.name {
                if state.node.is_some() {
                    warn!(component = %state.name, requested = %name, "not renaming an attached component");
                } else {
                    state.name = name;
                }
            }

            let mut enabled = !state.user_disabled;
            packet.stream_or(&mut enabled, "enabled", true)?;
            state.user_disabled = !enabled;
            enabled
        };
        behavior.on_serialize(packet)?;
        Ok(enabled)
    }

    /// Returns `true` if the behavior is a `T`.
    #[must_use]
    pub fn is<T: Behavior>(&self) -> bool {
        self.0.state.borrow().type_id == TypeId::of::<T>()
    }

    /// Typed view of this component, or `None` if the behavior is not a `T`.
    #[must_use]
    pub fn downcast<T: Behavior>(&self) -> Option<TypedComponent<T>> {
        self.is::<T>().then(|| TypedComponent {
            component: self.clone(),
            _marker: PhantomData,
        })
    }

    /// Runs `hook` with the behavior moved out of the cell, so the hook may
    /// freely use this component and its node. Nested calls for the same
    /// component find no behavior and do nothing.
    fn run_hook(&self, hook: impl FnOnce(&mut dyn Behavior, &ComponentContext<'_>)) {
        let (mut behavior, name, node, enabled) = {
            let mut state = self.0.state.borrow_mut();
            let Some(behavior) = state.behavior.take() else {
                return;
            };
            (behavior, state.name.clone(), state.owner(), state.enabled)
        };
        let ctx = ComponentContext {
            node,
            name: &name,
            enabled,
        };
        hook(&mut *behavior, &ctx);
        self.0.state.borrow_mut().behavior = Some(behavior);
    }

    fn emit(&self, event: ComponentEvent) {
        let mut listeners = std::mem::take(&mut *self.0.listeners.borrow_mut());
        for listener in &mut listeners {
            listener(event);
        }
        // Keep listeners connected while emitting, after the existing ones.
        let mut slot = self.0.listeners.borrow_mut();
        listeners.append(&mut slot);
        *slot = listeners;
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Component")
                .field("name", &state.name)
                .field("type", &state.type_name)
                .field("id", &state.id)
                .field("enabled", &state.enabled)
                .field("initialized", &state.initialized)
                .finish(),
            Err(_) => f.write_str("Component(<borrowed>)"),
        }
    }
}

/// A [`Component`] whose behavior is known to be a `T`.
///
/// Dereferences to the untyped handle for the base accessors.
pub struct TypedComponent<T: Behavior> {
    component: Component,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Behavior> TypedComponent<T> {
    /// Borrow the concrete behavior.
    ///
    /// # Panics
    ///
    /// Panics if the component is already mutably borrowed, or if called
    /// while one of the behavior's own hooks is running.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.component.0.state.borrow(), |state| {
            state
                .behavior
                .as_deref()
                .and_then(|behavior| behavior_any(behavior).downcast_ref::<T>())
                .expect("behavior is present and its type is checked when the handle is created")
        })
    }

    /// Mutably borrow the concrete behavior.
    ///
    /// # Panics
    ///
    /// Panics if the component is already borrowed, or if called while one
    /// of the behavior's own hooks is running.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.component.0.state.borrow_mut(), |state| {
            state
                .behavior
                .as_deref_mut()
                .and_then(|behavior| behavior_any_mut(behavior).downcast_mut::<T>())
                .expect("behavior is present and its type is checked when the handle is created")
        })
    }

    /// The untyped handle.
    #[must_use]
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Drop the type information.
    #[must_use]
    pub fn into_component(self) -> Component {
        self.component
    }
}

impl<T: Behavior> Deref for TypedComponent<T> {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}

impl<T: Behavior> Clone for TypedComponent<T> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Behavior> fmt::Debug for TypedComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.component.fmt(f)
    }
}
