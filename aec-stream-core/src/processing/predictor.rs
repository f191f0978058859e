use crate::models::shape::FrameLayout;

/// Frames a call would complete given `pending` buffered samples and
/// `input_len` new ones.
///
/// Exact for any inputs; `pending + input_len` is never formed.
pub fn frames_completed(pending: usize, input_len: usize, input_frame_size: usize) -> usize {
    if input_frame_size == 0 {
        return 0;
    }
    let whole = (pending / input_frame_size).saturating_add(input_len / input_frame_size);
    let (pending_rem, input_rem) = (pending % input_frame_size, input_len % input_frame_size);
    let carry = usize::from(input_rem >= input_frame_size - pending_rem);
    whole.saturating_add(carry)
}

/// Per-channel output samples a processing call would yield.
///
/// Pure: nothing is buffered or sent to the engine. The output frame size may
/// differ from the input frame size when the engine runs at its own rate.
/// Saturates at `usize::MAX`, a length no output buffer can hold.
pub fn predict_output_length(input_len: usize, pending: usize, layout: &FrameLayout) -> usize {
    frames_completed(pending, input_len, layout.input_frame_size).saturating_mul(layout.output_frame_size)
}
