use serde::{Deserialize, Serialize};

use super::error::StreamError;

/// Transform applied around the engine calls for each completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTransform {
    /// Hand the frame to the engine as-is.
    #[default]
    Copy,
    /// Split into frequency bands before the engine call and merge afterwards.
    BandSplit,
}

/// Configuration for an echo-cancellation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default stream sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Number of render (far-end) channels (default: 1).
    pub render_channels: usize,

    /// Number of capture (microphone) channels (default: 1).
    pub capture_channels: usize,

    /// Fixed render-to-capture delay hint passed to the engine, if known.
    pub audio_buffer_delay_ms: Option<i32>,

    pub render_transform: FrameTransform,
    pub capture_transform: FrameTransform,
}

impl SessionConfig {
    pub fn new(sample_rate: u32, render_channels: usize, capture_channels: usize) -> Self {
        Self {
            sample_rate,
            render_channels,
            capture_channels,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.render_channels == 0 {
            return Err("render channel count must be at least 1".into());
        }
        if self.capture_channels == 0 {
            return Err("capture channel count must be at least 1".into());
        }
        if let Some(delay) = self.audio_buffer_delay_ms {
            if delay < 0 {
                return Err(format!("audio buffer delay must not be negative: {delay} ms"));
            }
        }
        Ok(())
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StreamError::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(StreamError::InvalidConfig)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, StreamError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StreamError::InvalidConfig(format!("failed to serialize config: {}", e)))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            render_channels: 1,
            capture_channels: 1,
            audio_buffer_delay_ms: None,
            render_transform: FrameTransform::Copy,
            capture_transform: FrameTransform::Copy,
        }
    }
}

/// Options for a render-path `analyze` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalyzeOptions {
    /// Rate of this chunk; `None` means the session rate.
    pub sample_rate: Option<u32>,
}

/// Options for a capture-path `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessOptions {
    /// Rate of this chunk; `None` means the session rate.
    pub sample_rate: Option<u32>,

    /// Let the engine assume the capture level may have changed.
    pub allow_level_change: bool,
}

impl AnalyzeOptions {
    pub fn at_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate: Some(sample_rate),
        }
    }
}

impl ProcessOptions {
    pub fn at_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate: Some(sample_rate),
            ..Default::default()
        }
    }
}
