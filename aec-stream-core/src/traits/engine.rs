use crate::models::error::EngineError;
use crate::models::shape::{Direction, FrameLayout, StreamShape};

/// Boundary to a native echo-cancellation engine.
///
/// The streaming layer treats the engine as an opaque synchronous function:
/// one completed frame goes in through [`load_frame`](Self::load_frame), the
/// analysis/suppression calls run over the engine's bound frame buffers, and
/// the result is read back through [`frame`](Self::frame).
///
/// Frame buffers belong to the engine. A view returned by `frame` is only
/// meaningful until the next [`bind`](Self::bind) for the same direction.
pub trait EchoEngine: Send {
    /// The engine's internal processing rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Samples per channel the engine consumes per call at `sample_rate`
    /// (typically `sample_rate / 100`).
    fn frame_size_for(&self, sample_rate: u32) -> Result<usize, EngineError>;

    /// Whether [`bind`](Self::bind) would accept a stream shaped `input`
    /// bound to `layout`. Must not change any state.
    fn check_shape(
        &self,
        _direction: Direction,
        _input: StreamShape,
        _layout: FrameLayout,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Bind the processing and output frame buffers of `direction` for a
    /// stream shaped `input`.
    ///
    /// After `Ok`, `frame(direction)` must expose `layout.output_channels`
    /// channels of at least `layout.output_frame_size` samples. On `Err` the
    /// previous binding must remain valid. Any shape `check_shape` accepts
    /// must bind.
    fn bind(
        &mut self,
        direction: Direction,
        input: StreamShape,
        layout: FrameLayout,
    ) -> Result<(), EngineError>;

    /// Copy one completed staging frame (`input.channels × input_frame_size`)
    /// into the processing frame, converting rate and channel count as needed.
    fn load_frame(&mut self, direction: Direction, staged: &[Vec<f32>]);

    /// The current processing frame of `direction`.
    fn frame(&self, direction: Direction) -> &[Vec<f32>];

    /// Analyze the bound render frame as echo reference.
    fn analyze_render(&mut self);

    /// Analyze the bound capture frame.
    fn analyze_capture(&mut self);

    /// Remove echo from the bound capture frame in place.
    fn process_capture(&mut self, allow_level_change: bool);

    fn split_into_bands(&mut self, _direction: Direction) {}

    fn merge_bands(&mut self, _direction: Direction) {}

    /// Hint a fixed render-to-capture delay to the engine.
    fn set_audio_buffer_delay(&mut self, _delay_ms: i32) {}
}
