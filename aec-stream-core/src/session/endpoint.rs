use crate::models::config::FrameTransform;
use crate::models::diagnostics::EndpointDiagnostics;
use crate::models::error::{EngineError, StreamError};
use crate::models::shape::{Direction, FrameLayout, StreamShape};
use crate::processing::accumulator::FrameAccumulator;
use crate::processing::predictor;
use crate::traits::engine::EchoEngine;

/// Result of [`Endpoint::ensure_shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeChange {
    Unchanged,
    /// Staging was reallocated; `discarded` residue samples per channel were lost.
    Reconfigured { discarded: usize },
}

/// One signal direction of a session: its staging buffers, the engine frame
/// layout bound for the current shape, and the frame accumulator.
///
/// Staging is reallocated only when the stream's sample rate or channel
/// count changes. Reallocating drops any buffered partial frame.
#[derive(Debug)]
pub struct Endpoint {
    direction: Direction,
    transform: FrameTransform,
    shape: StreamShape,
    layout: FrameLayout,
    accumulator: FrameAccumulator,
    epoch: u64,
    diagnostics: EndpointDiagnostics,
}

impl Endpoint {
    /// Shape a new endpoint and bind its engine frames.
    pub fn configure<E: EchoEngine>(
        engine: &mut E,
        direction: Direction,
        shape: StreamShape,
        output_channels: usize,
        transform: FrameTransform,
    ) -> Result<Self, StreamError> {
        let layout = layout_for(engine, direction, shape, output_channels)?;
        engine
            .bind(direction, shape, layout)
            .map_err(|e| StreamError::configuration(direction, shape.sample_rate, shape.channels, e))?;

        log::debug!(
            "{} endpoint configured: {} Hz, {} in / {} out channel(s), frames {} -> {}",
            direction,
            shape.sample_rate,
            shape.channels,
            layout.output_channels,
            layout.input_frame_size,
            layout.output_frame_size
        );

        Ok(Self {
            direction,
            transform,
            shape,
            layout,
            accumulator: FrameAccumulator::new(shape.channels, layout.input_frame_size)?,
            epoch: 0,
            diagnostics: EndpointDiagnostics::default(),
        })
    }

    /// Make the endpoint match `(sample_rate, input_channels)`.
    ///
    /// No-op when the shape already matches. Otherwise the engine frames are
    /// rebound for `output_channels` and staging is reallocated. If the engine
    /// rejects the new shape the endpoint keeps its previous configuration.
    pub fn ensure_shape<E: EchoEngine>(
        &mut self,
        engine: &mut E,
        sample_rate: u32,
        output_channels: usize,
        input_channels: usize,
    ) -> Result<ShapeChange, StreamError> {
        let shape = StreamShape::new(sample_rate, input_channels);
        if shape == self.shape {
            return Ok(ShapeChange::Unchanged);
        }

        let layout = layout_for(engine, self.direction, shape, output_channels)?;
        engine
            .bind(self.direction, shape, layout)
            .map_err(|e| StreamError::configuration(self.direction, sample_rate, input_channels, e))?;

        let discarded = self.accumulator.reset_to(shape.channels, layout.input_frame_size)?;
        if discarded > 0 {
            log::warn!(
                "{} endpoint reshaped from {} Hz/{}ch to {} Hz/{}ch, dropping {} buffered sample(s) per channel",
                self.direction,
                self.shape.sample_rate,
                self.shape.channels,
                sample_rate,
                input_channels,
                discarded
            );
        } else {
            log::debug!(
                "{} endpoint reshaped to {} Hz/{}ch, frames {} -> {}",
                self.direction,
                sample_rate,
                input_channels,
                layout.input_frame_size,
                layout.output_frame_size
            );
        }

        self.shape = shape;
        self.layout = layout;
        self.epoch += 1;
        self.diagnostics.reconfigurations += 1;
        self.diagnostics.discarded_residue_samples += discarded as u64;
        Ok(ShapeChange::Reconfigured { discarded })
    }

    /// Layout and pending residue a call at `(sample_rate, input_channels)`
    /// would see, without reconfiguring.
    pub fn prospective<E: EchoEngine>(
        &self,
        engine: &E,
        sample_rate: u32,
        output_channels: usize,
        input_channels: usize,
    ) -> Result<(FrameLayout, usize), StreamError> {
        let shape = StreamShape::new(sample_rate, input_channels);
        if shape == self.shape {
            return Ok((self.layout, self.residue()));
        }
        let layout = layout_for(engine, self.direction, shape, output_channels)?;
        Ok((layout, 0))
    }

    /// Copy `chunk` into staging, running `on_frame_full` for every frame it completes.
    pub fn absorb<C, F>(&mut self, chunk: &[C], mut on_frame_full: F) -> Result<usize, StreamError>
    where
        C: AsRef<[f32]>,
        F: FnMut(&[Vec<f32>]),
    {
        let direction = self.direction;
        let frames = self.accumulator.absorb(chunk, |staged| {
            log::trace!("{} frame complete", direction);
            on_frame_full(staged);
        })?;

        self.diagnostics.chunks_absorbed += 1;
        self.diagnostics.samples_absorbed += chunk.first().map_or(0, |ch| ch.as_ref().len()) as u64;
        self.diagnostics.frames_completed += frames as u64;
        Ok(frames)
    }

    /// Per-channel output samples absorbing `input_len` more samples would
    /// yield under the current configuration.
    pub fn predict_output_length(&self, input_len: usize, includes_pending_residue: bool) -> usize {
        let pending = if includes_pending_residue { self.residue() } else { 0 };
        predictor::predict_output_length(input_len, pending, &self.layout)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn transform(&self) -> FrameTransform {
        self.transform
    }

    pub fn shape(&self) -> StreamShape {
        self.shape
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn residue(&self) -> usize {
        self.accumulator.residue()
    }

    pub fn staging(&self) -> &[Vec<f32>] {
        self.accumulator.staging()
    }

    /// Bumped on every staging reallocation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn diagnostics(&self) -> &EndpointDiagnostics {
        &self.diagnostics
    }
}

fn layout_for<E: EchoEngine>(
    engine: &E,
    direction: Direction,
    shape: StreamShape,
    output_channels: usize,
) -> Result<FrameLayout, StreamError> {
    let reject = |e: EngineError| StreamError::configuration(direction, shape.sample_rate, shape.channels, e);

    if shape.channels == 0 {
        return Err(reject(EngineError::UnsupportedChannels(0)));
    }
    if output_channels == 0 {
        return Err(reject(EngineError::UnsupportedChannels(0)));
    }

    let input_frame_size = engine.frame_size_for(shape.sample_rate).map_err(reject)?;
    let output_frame_size = engine.frame_size_for(engine.sample_rate()).map_err(reject)?;
    if input_frame_size == 0 || output_frame_size == 0 {
        return Err(reject(EngineError::Other("engine reported a zero frame size".into())));
    }

    let layout = FrameLayout {
        input_frame_size,
        output_frame_size,
        output_channels,
    };
    engine.check_shape(direction, shape, layout).map_err(reject)?;
    Ok(layout)
}
