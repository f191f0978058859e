use crate::models::error::EngineError;
use crate::models::shape::{Direction, FrameLayout, StreamShape};
use crate::traits::engine::EchoEngine;

/// Sample rates the AEC3 family of engines accepts.
pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [16000, 32000, 48000];

/// Reference engine that performs no cancellation.
///
/// Completed frames are copied into the processing frame unchanged (mixed
/// down to mono, or repeated across channels, when the channel counts
/// differ). Streams must arrive at the engine's own rate since no rate
/// conversion is done. Useful for wiring up and testing the streaming path
/// before a native engine is available.
#[derive(Debug)]
pub struct PassthroughEngine {
    sample_rate: u32,
    render: Vec<Vec<f32>>,
    capture: Vec<Vec<f32>>,
    render_frames_analyzed: u64,
    capture_frames_processed: u64,
    audio_buffer_delay_ms: Option<i32>,
}

impl PassthroughEngine {
    pub fn new(sample_rate: u32) -> Result<Self, EngineError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(EngineError::UnsupportedSampleRate(sample_rate));
        }
        Ok(Self {
            sample_rate,
            render: Vec::new(),
            capture: Vec::new(),
            render_frames_analyzed: 0,
            capture_frames_processed: 0,
            audio_buffer_delay_ms: None,
        })
    }

    pub fn render_frames_analyzed(&self) -> u64 {
        self.render_frames_analyzed
    }

    pub fn capture_frames_processed(&self) -> u64 {
        self.capture_frames_processed
    }

    pub fn audio_buffer_delay_ms(&self) -> Option<i32> {
        self.audio_buffer_delay_ms
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Vec<Vec<f32>> {
        match direction {
            Direction::Render => &mut self.render,
            Direction::Capture => &mut self.capture,
        }
    }
}

impl EchoEngine for PassthroughEngine {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_size_for(&self, sample_rate: u32) -> Result<usize, EngineError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(EngineError::UnsupportedSampleRate(sample_rate));
        }
        Ok(sample_rate as usize / 100)
    }

    fn check_shape(
        &self,
        _direction: Direction,
        input: StreamShape,
        layout: FrameLayout,
    ) -> Result<(), EngineError> {
        if input.sample_rate != self.sample_rate {
            return Err(EngineError::Other(format!(
                "passthrough engine runs at {} Hz and cannot convert from {} Hz",
                self.sample_rate, input.sample_rate
            )));
        }
        if input.channels == 0 {
            return Err(EngineError::UnsupportedChannels(input.channels));
        }
        if layout.output_channels == 0 {
            return Err(EngineError::UnsupportedChannels(layout.output_channels));
        }
        // Only mono fan-out, downmix to mono, or matching counts are mixed
        if input.channels > 1 && layout.output_channels > 1 && input.channels != layout.output_channels {
            return Err(EngineError::UnsupportedChannels(input.channels));
        }
        Ok(())
    }

    fn bind(
        &mut self,
        direction: Direction,
        input: StreamShape,
        layout: FrameLayout,
    ) -> Result<(), EngineError> {
        self.check_shape(direction, input, layout)?;
        *self.slot_mut(direction) = vec![vec![0.0; layout.output_frame_size]; layout.output_channels];
        Ok(())
    }

    fn load_frame(&mut self, direction: Direction, staged: &[Vec<f32>]) {
        let frame = self.slot_mut(direction);
        remix_into(staged, frame);
    }

    fn frame(&self, direction: Direction) -> &[Vec<f32>] {
        match direction {
            Direction::Render => &self.render,
            Direction::Capture => &self.capture,
        }
    }

    fn analyze_render(&mut self) {
        self.render_frames_analyzed += 1;
    }

    fn analyze_capture(&mut self) {}

    fn process_capture(&mut self, _allow_level_change: bool) {
        self.capture_frames_processed += 1;
    }

    fn set_audio_buffer_delay(&mut self, delay_ms: i32) {
        self.audio_buffer_delay_ms = Some(delay_ms);
    }
}

/// Copy planar `src` into `dst`, averaging down to mono or repeating a mono
/// source when the counts differ. Other count pairs are refused at bind.
fn remix_into(src: &[Vec<f32>], dst: &mut [Vec<f32>]) {
    if src.is_empty() {
        return;
    }
    if dst.len() == 1 && src.len() > 1 {
        let scale = 1.0 / src.len() as f32;
        for (i, out) in dst[0].iter_mut().enumerate() {
            let sum: f32 = src.iter().map(|ch| ch.get(i).copied().unwrap_or(0.0)).sum();
            *out = sum * scale;
        }
        return;
    }
    for (ch, out) in dst.iter_mut().enumerate() {
        let input = &src[ch % src.len()];
        let n = out.len().min(input.len());
        out[..n].copy_from_slice(&input[..n]);
    }
}
