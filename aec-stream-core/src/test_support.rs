//! Scriptable engine for unit tests.

use crate::models::error::EngineError;
use crate::models::shape::{Direction, FrameLayout, StreamShape};
use crate::traits::engine::EchoEngine;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Bind(Direction, StreamShape, FrameLayout),
    Load(Direction),
    AnalyzeRender,
    AnalyzeCapture,
    ProcessCapture(bool),
    Split(Direction),
    Merge(Direction),
    Delay(i32),
}

/// Records every call. Frame sizes are `rate / 100`; any rate in
/// `supported_rates` is accepted for input. Loaded frames are stretched or
/// truncated to the output frame size by index, and `process_capture` halves
/// every sample so output is distinguishable from input. Splitting into bands
/// negates the frame and merging negates it back.
#[derive(Debug)]
pub struct RecordingEngine {
    pub rate: u32,
    pub supported_rates: Vec<u32>,
    pub max_channels: usize,
    pub calls: Vec<EngineCall>,
    pub loaded: Vec<(Direction, Vec<Vec<f32>>)>,
    render: Vec<Vec<f32>>,
    capture: Vec<Vec<f32>>,
}

impl RecordingEngine {
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            supported_rates: vec![8000, 16000, 32000, 48000],
            max_channels: 8,
            calls: Vec::new(),
            loaded: Vec::new(),
            render: Vec::new(),
            capture: Vec::new(),
        }
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn binds(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EngineCall::Bind(..)))
            .count()
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Vec<Vec<f32>> {
        match direction {
            Direction::Render => &mut self.render,
            Direction::Capture => &mut self.capture,
        }
    }
}

impl EchoEngine for RecordingEngine {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn frame_size_for(&self, sample_rate: u32) -> Result<usize, EngineError> {
        if !self.supported_rates.contains(&sample_rate) {
            return Err(EngineError::UnsupportedSampleRate(sample_rate));
        }
        Ok(sample_rate as usize / 100)
    }

    fn check_shape(
        &self,
        _direction: Direction,
        input: StreamShape,
        _layout: FrameLayout,
    ) -> Result<(), EngineError> {
        if input.channels > self.max_channels {
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
        self.calls.push(EngineCall::Bind(direction, input, layout));
        *self.slot_mut(direction) = vec![vec![0.0; layout.output_frame_size]; layout.output_channels];
        Ok(())
    }

    fn load_frame(&mut self, direction: Direction, staged: &[Vec<f32>]) {
        self.calls.push(EngineCall::Load(direction));
        self.loaded.push((direction, staged.to_vec()));
        let frame = self.slot_mut(direction);
        for (ch, out) in frame.iter_mut().enumerate() {
            let input = &staged[ch % staged.len()];
            let n = out.len();
            for (i, sample) in out.iter_mut().enumerate() {
                *sample = input[i * input.len() / n];
            }
        }
    }

    fn frame(&self, direction: Direction) -> &[Vec<f32>] {
        match direction {
            Direction::Render => &self.render,
            Direction::Capture => &self.capture,
        }
    }

    fn analyze_render(&mut self) {
        self.calls.push(EngineCall::AnalyzeRender);
    }

    fn analyze_capture(&mut self) {
        self.calls.push(EngineCall::AnalyzeCapture);
    }

    fn process_capture(&mut self, allow_level_change: bool) {
        self.calls.push(EngineCall::ProcessCapture(allow_level_change));
        for ch in self.capture.iter_mut() {
            for sample in ch.iter_mut() {
                *sample *= 0.5;
            }
        }
    }

    fn split_into_bands(&mut self, direction: Direction) {
        self.calls.push(EngineCall::Split(direction));
        invert(self.slot_mut(direction));
    }

    fn merge_bands(&mut self, direction: Direction) {
        self.calls.push(EngineCall::Merge(direction));
        invert(self.slot_mut(direction));
    }

    fn set_audio_buffer_delay(&mut self, delay_ms: i32) {
        self.calls.push(EngineCall::Delay(delay_ms));
    }
}

fn invert(frame: &mut [Vec<f32>]) {
    for sample in frame.iter_mut().flatten() {
        *sample = -*sample;
    }
}
