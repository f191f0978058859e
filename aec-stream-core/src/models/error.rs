use thiserror::Error;

use super::shape::Direction;

/// Errors surfaced by the streaming layer.
///
/// Every variant is a caller-contract violation, not a transient condition,
/// so nothing is retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Chunk channel count or per-channel lengths are inconsistent.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The engine rejected the requested sample rate / channel combination.
    #[error("{direction} configuration rejected at {sample_rate} Hz with {channels} channel(s): {reason}")]
    Configuration {
        direction: Direction,
        sample_rate: u32,
        channels: usize,
        reason: String,
    },

    /// A caller-owned output buffer is smaller than the predicted output.
    #[error("output buffer holds {available} samples per channel, {required} required")]
    Capacity { required: usize, available: usize },

    /// The session was freed.
    #[error("session has been freed")]
    UseAfterFree,

    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

/// Error reported by an [`EchoEngine`](crate::traits::engine::EchoEngine) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    #[error("engine error: {0}")]
    Other(String),
}

impl StreamError {
    pub(crate) fn configuration(
        direction: Direction,
        sample_rate: u32,
        channels: usize,
        source: EngineError,
    ) -> Self {
        Self::Configuration {
            direction,
            sample_rate,
            channels,
            reason: source.to_string(),
        }
    }
}
