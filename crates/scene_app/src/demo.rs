//! The demo scene.
//!
//! ```text
//! world
//! ├── player   [motion: Mover, health: Health]
//! └── turret   [spin: Spinner]
//!     └── barrel
//! ```
//!
//! A projectile is added at startup through the script objects, the way an
//! embedded script would do it.

use scene_core::{Component, Node, RelativeTo, SceneContext, Vec3};
use scene_script::{ScriptEnv, ScriptError, ScriptObject, ScriptValue, Scriptable};
use tracing::info;

use crate::behaviors::{Health, Mover, Spinner};

/// Build the demo tree. The returned root is not initialized yet.
#[must_use]
pub fn build_scene(ctx: &SceneContext) -> Node {
    let root = Node::new(ctx, "world");

    let player = Node::new(ctx, "player");
    player.add_component(Component::new(ctx, "motion", Mover::new(Vec3::new(1.0, 0.0, 0.0))));
    player.add_component(Component::new(ctx, "health", Health::new(100.0)));
    root.add_child_node(player);

    let turret = Node::new(ctx, "turret");
    turret.set_position_xyz(0.0, 0.0, -5.0, RelativeTo::Parent);
    turret.add_component(Component::new(ctx, "spin", Spinner::default()));
    turret.add_child_node(Node::new(ctx, "barrel"));
    root.add_child_node(turret);

    root
}

/// Spawn a moving projectile under `root` using only script calls.
///
/// Returns `None` if `root` already has a projectile, e.g. in a reloaded
/// scene.
///
/// # Errors
///
/// Returns a [`ScriptError`] if a script call fails.
pub fn spawn_projectile(env: &ScriptEnv, root: &Node) -> Result<Option<ScriptObject>, ScriptError> {
    let scene = env.to_script_object();
    let projectile = scene.call("createNode", &["projectile".into()])?;
    let attached = root.to_script_object().call("addChildNode", &[projectile])?;
    let ScriptValue::Object(projectile) = attached else {
        info!(root = %root.name(), "projectile already present");
        return Ok(None);
    };

    let motion = scene.call("createComponent", &["Mover".into(), "motion".into()])?;
    projectile.call("addComponent", &[motion])?;
    projectile.call("setPosition", &[Vec3::new(0.0, 1.0, 0.0).into()])?;
    info!(node = %projectile.get("fullName")?, "projectile spawned from script");
    Ok(Some(projectile))
}
