use crate::models::config::{AnalyzeOptions, FrameTransform, ProcessOptions, SessionConfig};
use crate::models::diagnostics::SessionDiagnostics;
use crate::models::error::StreamError;
use crate::models::shape::{Direction, Frame, StreamShape};
use crate::processing::accumulator::uniform_len;
use crate::processing::predictor;
use crate::session::endpoint::Endpoint;
use crate::traits::engine::EchoEngine;

/// Echo-cancellation session over one engine.
///
/// Owns the engine and its two endpoints. Render chunks go through
/// [`analyze`](Self::analyze); capture chunks go through
/// [`process`](Self::process) (frames returned) or
/// [`process_into`](Self::process_into) (caller-owned output sized with
/// [`predict_output_length`](Self::predict_output_length)). Chunks may be any
/// length; each call handles as many whole frames as are available and keeps
/// the rest buffered.
///
/// Access is single-writer: wrap in a [`SharedSession`](super::shared::SharedSession)
/// to drive render and capture from different threads.
#[derive(Debug)]
pub struct EchoCancellerSession<E: EchoEngine> {
    engine: Option<E>,
    config: SessionConfig,
    render: Endpoint,
    capture: Endpoint,
}

impl<E: EchoEngine> EchoCancellerSession<E> {
    pub fn new(mut engine: E, config: SessionConfig) -> Result<Self, StreamError> {
        config.validate().map_err(StreamError::InvalidConfig)?;

        if let Some(delay) = config.audio_buffer_delay_ms {
            engine.set_audio_buffer_delay(delay);
        }

        let render = Endpoint::configure(
            &mut engine,
            Direction::Render,
            StreamShape::new(config.sample_rate, config.render_channels),
            config.render_channels,
            config.render_transform,
        )?;
        let capture = Endpoint::configure(
            &mut engine,
            Direction::Capture,
            StreamShape::new(config.sample_rate, config.capture_channels),
            config.capture_channels,
            config.capture_transform,
        )?;

        log::info!(
            "echo canceller session created: {} Hz, {} render / {} capture channel(s), engine at {} Hz",
            config.sample_rate,
            config.render_channels,
            config.capture_channels,
            engine.sample_rate()
        );

        Ok(Self {
            engine: Some(engine),
            config,
            render,
            capture,
        })
    }

    /// Feed far-end (render) audio to the engine as echo reference.
    ///
    /// Returns the number of frames analyzed.
    pub fn analyze<C: AsRef<[f32]>>(&mut self, chunk: &[C], opts: &AnalyzeOptions) -> Result<usize, StreamError> {
        let engine = self.engine.as_mut().ok_or(StreamError::UseAfterFree)?;
        uniform_len(chunk)?;

        let sample_rate = opts.sample_rate.unwrap_or(self.config.sample_rate);
        self.render
            .ensure_shape(engine, sample_rate, self.config.render_channels, chunk.len())?;

        let band_split = self.render.transform() == FrameTransform::BandSplit;
        self.render.absorb(chunk, |staged| {
            engine.load_frame(Direction::Render, staged);
            if band_split {
                engine.split_into_bands(Direction::Render);
            }
            engine.analyze_render();
        })
    }

    /// Per-channel samples a [`process`](Self::process) or
    /// [`process_into`](Self::process_into) call with `chunk_len` samples per
    /// channel and the same options would produce from the current state.
    ///
    /// `input_channels` is the chunk's channel count; a count or rate that
    /// differs from the current configuration is predicted as a reshape,
    /// which drops buffered residue.
    pub fn predict_output_length(
        &self,
        chunk_len: usize,
        input_channels: usize,
        opts: &ProcessOptions,
    ) -> Result<usize, StreamError> {
        let engine = self.engine.as_ref().ok_or(StreamError::UseAfterFree)?;
        let sample_rate = opts.sample_rate.unwrap_or(self.config.sample_rate);
        let (layout, pending) =
            self.capture
                .prospective(engine, sample_rate, self.config.capture_channels, input_channels)?;
        Ok(predictor::predict_output_length(chunk_len, pending, &layout))
    }

    /// [`predict_output_length`](Self::predict_output_length) for a concrete chunk.
    pub fn predict_output_length_for<C: AsRef<[f32]>>(
        &self,
        chunk: &[C],
        opts: &ProcessOptions,
    ) -> Result<usize, StreamError> {
        let len = uniform_len(chunk)?;
        self.predict_output_length(len, chunk.len(), opts)
    }

    /// Remove echo from near-end (capture) audio, returning every completed
    /// output frame (`capture_channels × output frame size`).
    pub fn process<C: AsRef<[f32]>>(&mut self, chunk: &[C], opts: &ProcessOptions) -> Result<Vec<Frame>, StreamError> {
        let engine = self.engine.as_mut().ok_or(StreamError::UseAfterFree)?;
        uniform_len(chunk)?;

        let sample_rate = opts.sample_rate.unwrap_or(self.config.sample_rate);
        self.capture
            .ensure_shape(engine, sample_rate, self.config.capture_channels, chunk.len())?;

        let band_split = self.capture.transform() == FrameTransform::BandSplit;
        let allow_level_change = opts.allow_level_change;
        let mut frames = Vec::new();
        self.capture.absorb(chunk, |staged| {
            engine.load_frame(Direction::Capture, staged);
            cancel_frame(engine, band_split, allow_level_change);
            frames.push(engine.frame(Direction::Capture).to_vec());
        })?;
        Ok(frames)
    }

    /// Remove echo from near-end (capture) audio, writing the output into
    /// `out` from sample 0 of each channel. Returns per-channel samples written.
    ///
    /// `out` must have one buffer per capture channel, each at least
    /// [`predict_output_length`](Self::predict_output_length) long; a shorter
    /// buffer fails with [`StreamError::Capacity`] before anything is
    /// buffered or written. `pre`, when given, receives the frames as they
    /// were before cancellation, under the same size rules.
    pub fn process_into<C, O>(
        &mut self,
        out: &mut [O],
        mut pre: Option<&mut [O]>,
        chunk: &[C],
        opts: &ProcessOptions,
    ) -> Result<usize, StreamError>
    where
        C: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        let required = self.predict_output_length_for(chunk, opts)?;
        let channels = self.config.capture_channels;
        check_capacity(out, channels, required)?;
        if let Some(pre) = pre.as_deref_mut() {
            check_capacity(pre, channels, required)?;
        }

        let engine = self.engine.as_mut().ok_or(StreamError::UseAfterFree)?;
        let sample_rate = opts.sample_rate.unwrap_or(self.config.sample_rate);
        self.capture.ensure_shape(engine, sample_rate, channels, chunk.len())?;

        let band_split = self.capture.transform() == FrameTransform::BandSplit;
        let allow_level_change = opts.allow_level_change;
        let frame_len = self.capture.layout().output_frame_size;
        let mut offset = 0;
        self.capture.absorb(chunk, |staged| {
            engine.load_frame(Direction::Capture, staged);
            if let Some(pre) = pre.as_deref_mut() {
                copy_frame(engine.frame(Direction::Capture), pre, offset, frame_len);
            }
            cancel_frame(engine, band_split, allow_level_change);
            copy_frame(engine.frame(Direction::Capture), out, offset, frame_len);
            offset += frame_len;
        })?;

        debug_assert_eq!(offset, required);
        Ok(offset)
    }

    /// Release the engine. Every later call fails with [`StreamError::UseAfterFree`].
    pub fn free(&mut self) -> Result<(), StreamError> {
        let engine = self.engine.take().ok_or(StreamError::UseAfterFree)?;
        drop(engine);
        log::info!("echo canceller session freed");
        Ok(())
    }

    pub fn is_freed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        SessionDiagnostics {
            render: self.render.diagnostics().clone(),
            capture: self.capture.diagnostics().clone(),
        }
    }

    pub fn render_endpoint(&self) -> &Endpoint {
        &self.render
    }

    pub fn capture_endpoint(&self) -> &Endpoint {
        &self.capture
    }

    pub fn engine(&self) -> Result<&E, StreamError> {
        self.engine.as_ref().ok_or(StreamError::UseAfterFree)
    }

    // --- Low-level engine access ---

    /// Input samples per channel per render frame. Chunks of this size are
    /// analyzed without buffering.
    pub fn render_frame_size(&self) -> Result<usize, StreamError> {
        self.engine()?;
        Ok(self.render.layout().input_frame_size)
    }

    /// Input samples per channel per capture frame. Chunks of this size are
    /// processed without buffering.
    pub fn capture_frame_size(&self) -> Result<usize, StreamError> {
        self.engine()?;
        Ok(self.capture.layout().input_frame_size)
    }

    /// The engine's render frame. Valid until the render endpoint reshapes.
    pub fn render_frame(&self) -> Result<&[Vec<f32>], StreamError> {
        Ok(self.engine()?.frame(Direction::Render))
    }

    /// The engine's capture frame. Valid until the capture endpoint reshapes.
    pub fn capture_frame(&self) -> Result<&[Vec<f32>], StreamError> {
        Ok(self.engine()?.frame(Direction::Capture))
    }

    pub fn analyze_render(&mut self) -> Result<(), StreamError> {
        self.engine_mut()?.analyze_render();
        Ok(())
    }

    pub fn analyze_capture(&mut self) -> Result<(), StreamError> {
        self.engine_mut()?.analyze_capture();
        Ok(())
    }

    pub fn process_capture(&mut self, allow_level_change: bool) -> Result<(), StreamError> {
        self.engine_mut()?.process_capture(allow_level_change);
        Ok(())
    }

    pub fn set_audio_buffer_delay(&mut self, delay_ms: i32) -> Result<(), StreamError> {
        if delay_ms < 0 {
            return Err(StreamError::InvalidConfig(format!(
                "audio buffer delay must not be negative: {delay_ms} ms"
            )));
        }
        self.engine_mut()?.set_audio_buffer_delay(delay_ms);
        self.config.audio_buffer_delay_ms = Some(delay_ms);
        Ok(())
    }

    fn engine_mut(&mut self) -> Result<&mut E, StreamError> {
        self.engine.as_mut().ok_or(StreamError::UseAfterFree)
    }
}

/// Analysis and suppression over the loaded capture frame.
fn cancel_frame<E: EchoEngine>(engine: &mut E, band_split: bool, allow_level_change: bool) {
    if band_split {
        engine.split_into_bands(Direction::Capture);
    }
    engine.analyze_capture();
    engine.process_capture(allow_level_change);
    if band_split {
        engine.merge_bands(Direction::Capture);
    }
}

fn check_capacity<O: AsMut<[f32]>>(out: &mut [O], channels: usize, required: usize) -> Result<(), StreamError> {
    if out.len() != channels {
        return Err(StreamError::ShapeMismatch(format!(
            "output has {} channel(s), session captures {}",
            out.len(),
            channels
        )));
    }
    if let Some(available) = out.iter_mut().map(|ch| ch.as_mut().len()).min() {
        if available < required {
            return Err(StreamError::Capacity { required, available });
        }
    }
    Ok(())
}

fn copy_frame<O: AsMut<[f32]>>(frame: &[Vec<f32>], out: &mut [O], offset: usize, frame_len: usize) {
    for (dst, src) in out.iter_mut().zip(frame) {
        dst.as_mut()[offset..offset + frame_len].copy_from_slice(&src[..frame_len]);
    }
}
