//! Demo behaviors, all registered for save/load.

use scene_core::{Behavior, ComponentContext, IoPacket, PacketError, Quat, RelativeTo, Vec3};
use scene_io::ComponentRegistry;
use tracing::info;

/// A registry with every demo behavior.
#[must_use]
pub fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register::<Spinner>();
    registry.register::<Mover>();
    registry.register::<Health>();
    registry
}

/// Rotates its node around an axis at a constant rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Spinner {
    /// Rotation axis in the parent frame.
    pub axis: Vec3,
    /// Angular speed.
    pub radians_per_second: f32,
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            axis: Vec3::Y,
            radians_per_second: 1.0,
        }
    }
}

impl Behavior for Spinner {
    fn type_name(&self) -> &'static str {
        "Spinner"
    }

    fn on_update(&mut self, ctx: &ComponentContext<'_>, dt: f64) {
        let (Some(node), Some(axis)) = (ctx.node(), self.axis.try_normalize()) else {
            return;
        };
        if dt <= 0.0 {
            return;
        }
        let step = Quat::from_axis_angle(axis, self.radians_per_second * dt as f32);
        node.set_rotation(step * node.rotation(RelativeTo::Parent), RelativeTo::Parent);
    }

    fn on_serialize(&mut self, packet: &mut IoPacket) -> Result<(), PacketError> {
        packet.stream_or(&mut self.axis, "axis", Vec3::Y)?;
        packet.stream(&mut self.radians_per_second, "radians_per_second")
    }
}

/// Moves its node at a constant velocity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mover {
    /// Units per second in the parent frame.
    pub velocity: Vec3,
}

impl Mover {
    /// Move at `velocity` units per second.
    #[must_use]
    pub fn new(velocity: Vec3) -> Self {
        Self { velocity }
    }
}

impl Behavior for Mover {
    fn type_name(&self) -> &'static str {
        "Mover"
    }

    fn on_update(&mut self, ctx: &ComponentContext<'_>, dt: f64) {
        let Some(node) = ctx.node() else {
            return;
        };
        if dt <= 0.0 || self.velocity == Vec3::ZERO {
            return;
        }
        let position = node.position(RelativeTo::Parent);
        node.set_position(position + self.velocity * dt as f32, RelativeTo::Parent);
    }

    fn on_serialize(&mut self, packet: &mut IoPacket) -> Result<(), PacketError> {
        packet.stream(&mut self.velocity, "velocity")
    }
}

/// Hit points. A node whose health runs out is killed at its next update.
#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    /// Remaining hit points, never below zero.
    pub current: f32,
    /// Upper bound for healing.
    pub max: f32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage. Returns `true` if this brought health to zero.
    pub fn damage(&mut self, amount: f32) -> bool {
        let was_alive = !self.is_dead();
        self.current = (self.current - amount).max(0.0);
        was_alive && self.is_dead()
    }

    /// Restore health, capped at the maximum.
    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Whether health has run out.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Behavior for Health {
    fn type_name(&self) -> &'static str {
        "Health"
    }

    fn on_update(&mut self, ctx: &ComponentContext<'_>, _dt: f64) {
        if !self.is_dead() {
            return;
        }
        if let Some(node) = ctx.node().filter(|node| !node.is_killed()) {
            info!(node = %node.full_name(), "health depleted, removing node");
            node.kill();
        }
    }

    fn on_serialize(&mut self, packet: &mut IoPacket) -> Result<(), PacketError> {
        packet.stream(&mut self.current, "current")?;
        packet.stream_or(&mut self.max, "max", 100.0)
    }
}
