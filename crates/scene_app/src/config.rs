//! Host configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    /// Target frames per second.
    pub tick_rate: f64,
    /// Maximum number of frames to run (0 = unlimited).
    pub max_frames: u64,
}

impl FrameConfig {
    /// Time budget of one frame. A non-positive rate yields a zero budget.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_rate).unwrap_or(Duration::ZERO)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_frames: 0,
        }
    }
}

/// Everything the host needs for one run.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Frame loop settings.
    pub frame: FrameConfig,
    /// Where to save the scene after the run, if anywhere.
    pub output: Option<PathBuf>,
    /// Scene file to load instead of building the demo scene.
    pub load: Option<PathBuf>,
}

impl AppConfig {
    /// Create a config with the given frame settings.
    #[must_use]
    pub fn new(frame: FrameConfig) -> Self {
        Self {
            frame,
            output: None,
            load: None,
        }
    }

    /// Save the scene to `path` after the run.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Load the scene from `path` instead of building the demo.
    #[must_use]
    pub fn with_load(mut self, path: impl Into<PathBuf>) -> Self {
        self.load = Some(path.into());
        self
    }
}
