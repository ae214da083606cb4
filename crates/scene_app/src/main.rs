//! # scene_app
//!
//! Host for the scene graph: builds the demo scene (or loads a saved one),
//! drives it through the frame loop and optionally saves it afterwards.
//!
//! ## Startup Sequence
//!
//! 1. Parse CLI flags into an [`AppConfig`](config::AppConfig).
//! 2. Register the demo behaviors.
//! 3. Load the scene from `--load`, or build the demo scene.
//! 4. Initialize the root and spawn a projectile through the script objects.
//! 5. Run `--frames` frames at `--tick-rate`.
//! 6. Save to `--output` if given.

mod behaviors;
mod config;
mod demo;
mod frame;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Result, ensure};
use clap::Parser;
use scene_core::SceneContext;
use scene_io::SceneSerializer;
use scene_script::ScriptEnv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, FrameConfig};
use frame::FrameLoop;

#[derive(Parser)]
#[command(name = "scene_app", about = "Run a scene graph through a fixed-rate frame loop")]
struct Args {
    /// Number of frames to run (0 runs until interrupted)
    #[arg(short, long, default_value_t = 120)]
    frames: u64,

    /// Target frames per second
    #[arg(short, long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Save the scene here after the run (.json, .msgpack or .mpk)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load the scene from this file instead of building the demo scene
    #[arg(short, long)]
    load: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> AppConfig {
        let mut config = AppConfig::new(FrameConfig {
            tick_rate: self.tick_rate,
            max_frames: self.frames,
        });
        if let Some(path) = self.output {
            config = config.with_output(path);
        }
        if let Some(path) = self.load {
            config = config.with_load(path);
        }
        config
    }
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scene_app=info".parse()?))
        .init();

    let args = Args::parse();
    ensure!(args.tick_rate > 0.0, "--tick-rate must be positive");
    let config = args.into_config();

    let ctx = SceneContext::new();
    let registry = Rc::new(behaviors::registry());
    let serializer = SceneSerializer::new(&registry);
    info!(types = ?registry.type_names(), "component types registered");

    let root = match &config.load {
        Some(path) => serializer.load_from_file(&ctx, path)?,
        None => demo::build_scene(&ctx),
    };
    root.initialize();

    let env = ScriptEnv::new(ctx.clone(), Rc::clone(&registry));
    demo::spawn_projectile(&env, &root)?;

    let mut frames = FrameLoop::new(root, config.frame.clone());
    frames.run();

    if let Some(path) = &config.output {
        serializer.save_to_file(frames.root(), path)?;
    }

    info!(frames = frames.frame_id(), "scene host shut down");
    Ok(())
}
