use std::fmt;

use serde::{Deserialize, Serialize};

/// Signal direction of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Far-end reference signal fed to the engine for analysis.
    Render,
    /// Near-end microphone signal from which echo is removed.
    Capture,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("render"),
            Self::Capture => f.write_str("capture"),
        }
    }
}

/// Shape of an incoming stream. Endpoints reallocate only when this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamShape {
    pub sample_rate: u32,
    pub channels: usize,
}

impl StreamShape {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

/// Frame geometry bound for one configuration epoch.
///
/// `input_frame_size` is per-channel samples at the stream's rate;
/// `output_frame_size` is per-channel samples at the engine's rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    pub input_frame_size: usize,
    pub output_frame_size: usize,
    pub output_channels: usize,
}

/// One engine output frame: `channels × output_frame_size` samples.
pub type Frame = Vec<Vec<f32>>;
