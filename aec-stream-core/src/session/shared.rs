use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{AnalyzeOptions, ProcessOptions};
use crate::models::diagnostics::SessionDiagnostics;
use crate::models::error::StreamError;
use crate::models::shape::Frame;
use crate::session::canceller::EchoCancellerSession;
use crate::traits::engine::EchoEngine;

/// Cloneable handle to a session behind a `parking_lot::Mutex`.
///
/// Render and capture usually arrive on different audio threads. Each call
/// takes the lock for its whole duration, so one `analyze`/`process` call
/// always completes before the next one starts.
#[derive(Debug)]
pub struct SharedSession<E: EchoEngine> {
    inner: Arc<Mutex<EchoCancellerSession<E>>>,
}

impl<E: EchoEngine> Clone for SharedSession<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EchoEngine> SharedSession<E> {
    pub fn new(session: EchoCancellerSession<E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn analyze<C: AsRef<[f32]>>(&self, chunk: &[C], opts: &AnalyzeOptions) -> Result<usize, StreamError> {
        self.inner.lock().analyze(chunk, opts)
    }

    pub fn process<C: AsRef<[f32]>>(&self, chunk: &[C], opts: &ProcessOptions) -> Result<Vec<Frame>, StreamError> {
        self.inner.lock().process(chunk, opts)
    }

    /// Process into a growable output, sizing it under the same lock as the
    /// prediction so no other call can change the capture state in between.
    pub fn process_into_vec<C: AsRef<[f32]>>(
        &self,
        out: &mut Vec<Vec<f32>>,
        chunk: &[C],
        opts: &ProcessOptions,
    ) -> Result<usize, StreamError> {
        let mut session = self.inner.lock();
        let required = session.predict_output_length_for(chunk, opts)?;
        let channels = session.config().capture_channels;
        out.resize_with(channels, Vec::new);
        for ch in out.iter_mut() {
            ch.resize(required, 0.0);
        }
        session.process_into(out.as_mut_slice(), None, chunk, opts)
    }

    pub fn predict_output_length(
        &self,
        chunk_len: usize,
        input_channels: usize,
        opts: &ProcessOptions,
    ) -> Result<usize, StreamError> {
        self.inner.lock().predict_output_length(chunk_len, input_channels, opts)
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.inner.lock().diagnostics()
    }

    pub fn free(&self) -> Result<(), StreamError> {
        self.inner.lock().free()
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut EchoCancellerSession<E>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
