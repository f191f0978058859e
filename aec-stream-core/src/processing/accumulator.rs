use crate::models::error::StreamError;

/// Slices arbitrary-length multichannel chunks into fixed-size frames.
///
/// Samples are copied into per-channel staging buffers of `frame_size`
/// samples. Each time the staging frame fills, the supplied action runs over
/// it and the position resets; a partial frame stays buffered for the next
/// call. Feeding a stream in one call or in many produces the same frames.
#[derive(Debug)]
pub struct FrameAccumulator {
    staging: Vec<Vec<f32>>,
    frame_size: usize,
    position: usize,
}

impl FrameAccumulator {
    pub fn new(channels: usize, frame_size: usize) -> Result<Self, StreamError> {
        check_frame_size(frame_size)?;
        Ok(Self {
            staging: vec![vec![0.0; frame_size]; channels],
            frame_size,
            position: 0,
        })
    }

    pub fn channels(&self) -> usize {
        self.staging.len()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Samples per channel already buffered toward the next frame.
    ///
    /// Always `< frame_size`.
    pub fn residue(&self) -> usize {
        self.position
    }

    pub fn staging(&self) -> &[Vec<f32>] {
        &self.staging
    }

    /// Reallocate staging for a new shape. Buffered residue is dropped and
    /// its per-channel length returned. A zero `frame_size` is rejected and
    /// leaves the accumulator as it was.
    pub fn reset_to(&mut self, channels: usize, frame_size: usize) -> Result<usize, StreamError> {
        check_frame_size(frame_size)?;
        let discarded = self.position;
        self.staging = vec![vec![0.0; frame_size]; channels];
        self.frame_size = frame_size;
        self.position = 0;
        Ok(discarded)
    }

    /// Copy `chunk` into staging, running `on_frame_full` once per completed
    /// frame. Returns the number of frames completed.
    ///
    /// The chunk is validated before anything is copied, so a rejected chunk
    /// leaves the accumulator untouched.
    pub fn absorb<C, F>(&mut self, chunk: &[C], mut on_frame_full: F) -> Result<usize, StreamError>
    where
        C: AsRef<[f32]>,
        F: FnMut(&[Vec<f32>]),
    {
        let len = chunk_len(chunk, self.channels())?;

        let mut buf_pos = self.position;
        let mut data_pos = 0;
        let mut frames = 0;

        loop {
            let buf_rem = self.frame_size - buf_pos;
            let data_rem = len - data_pos;

            if data_rem >= buf_rem {
                for (staged, data) in self.staging.iter_mut().zip(chunk) {
                    staged[buf_pos..].copy_from_slice(&data.as_ref()[data_pos..data_pos + buf_rem]);
                }
                on_frame_full(&self.staging);
                frames += 1;

                buf_pos = 0;
                data_pos += buf_rem;
            } else if data_rem > 0 {
                // Leave the overflow for the next call
                for (staged, data) in self.staging.iter_mut().zip(chunk) {
                    staged[buf_pos..buf_pos + data_rem].copy_from_slice(&data.as_ref()[data_pos..]);
                }
                buf_pos += data_rem;
                break;
            } else {
                break;
            }
        }

        self.position = buf_pos;
        Ok(frames)
    }
}

fn check_frame_size(frame_size: usize) -> Result<(), StreamError> {
    if frame_size == 0 {
        return Err(StreamError::InvalidConfig("frame size must be positive".into()));
    }
    Ok(())
}

/// Per-channel length of `chunk`, checking it carries `expected_channels`
/// channels of equal length.
pub fn chunk_len<C: AsRef<[f32]>>(chunk: &[C], expected_channels: usize) -> Result<usize, StreamError> {
    if chunk.len() != expected_channels {
        return Err(StreamError::ShapeMismatch(format!(
            "expected {} channel(s), got {}",
            expected_channels,
            chunk.len()
        )));
    }
    uniform_len(chunk)
}

/// Per-channel length of a non-empty chunk whose channels all match in length.
pub fn uniform_len<C: AsRef<[f32]>>(chunk: &[C]) -> Result<usize, StreamError> {
    let Some(first) = chunk.first() else {
        return Err(StreamError::ShapeMismatch("chunk has no channels".into()));
    };
    let len = first.as_ref().len();
    if let Some((ch, other)) = chunk
        .iter()
        .enumerate()
        .find(|(_, data)| data.as_ref().len() != len)
    {
        return Err(StreamError::ShapeMismatch(format!(
            "channel {} has {} samples, channel 0 has {}",
            ch,
            other.as_ref().len(),
            len
        )));
    }
    Ok(len)
}
