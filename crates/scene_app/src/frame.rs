//! Host frame loop.
//!
//! Each frame updates the whole tree once from the root:
//!
//! 1. Components of the root, then the root's own hook.
//! 2. Children, depth-first, in name order.
//! 3. Children killed during the frame are reaped by their parents.

use std::time::Instant;

use scene_core::Node;
use tracing::{debug, info, warn};

use crate::config::FrameConfig;

/// Drives a scene at a fixed rate.
#[derive(Debug)]
pub struct FrameLoop {
    /// Frames run so far.
    frame_id: u64,
    /// Frame configuration.
    config: FrameConfig,
    /// The scene being driven.
    root: Node,
}

impl FrameLoop {
    /// Create a loop over `root` with the given configuration.
    #[must_use]
    pub fn new(root: Node, config: FrameConfig) -> Self {
        Self {
            frame_id: 0,
            config,
            root,
        }
    }

    /// Returns the number of frames run so far.
    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Returns the scene root.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Run one frame with the given time step in seconds.
    pub fn frame(&mut self, dt: f64) {
        self.frame_id += 1;
        debug!(frame_id = self.frame_id, dt, "frame start");
        self.root.update(dt);
    }

    /// Run frames at the configured rate until `max_frames` is reached, or
    /// forever when it is 0. Blocks the calling thread.
    pub fn run(&mut self) {
        let frame_duration = self.config.frame_duration();
        let mut frame_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_frames = self.config.max_frames,
            root = %self.root.name(),
            "starting frame loop"
        );

        loop {
            let start = Instant::now();

            self.frame(frame_duration.as_secs_f64());

            frame_count += 1;
            if self.config.max_frames > 0 && frame_count >= self.config.max_frames {
                info!(frames = frame_count, "frame loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            } else {
                warn!(
                    frame_id = self.frame_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = frame_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
    }
}
