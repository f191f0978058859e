use aec_stream_core::{
    AnalyzeOptions, Direction, EchoCancellerSession, PassthroughEngine, ProcessOptions, SessionConfig,
    SharedSession, StreamError,
};
use approx::assert_abs_diff_eq;
use proptest::collection::vec as pvec;
use proptest::prelude::*;
use test_strategy::proptest;

fn session(rate: u32, render: usize, capture: usize) -> EchoCancellerSession<PassthroughEngine> {
    let engine = PassthroughEngine::new(rate).unwrap();
    EchoCancellerSession::new(engine, SessionConfig::new(rate, render, capture)).unwrap()
}

fn ramp(start: usize, len: usize) -> Vec<f32> {
    (start..start + len).map(|i| (i % 1000) as f32 / 1000.0).collect()
}

#[test]
fn one_exact_frame() {
    let mut s = session(48000, 1, 1);

    let frames = s.process(&[ramp(0, 480)], &ProcessOptions::default()).unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(s.capture_endpoint().residue(), 0);
}

#[test]
fn frame_completes_across_calls() {
    let mut s = session(48000, 1, 1);

    assert!(s.process(&[ramp(0, 200)], &ProcessOptions::default()).unwrap().is_empty());
    let frames = s.process(&[ramp(200, 280)], &ProcessOptions::default()).unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0][0], ramp(0, 480));
    assert_eq!(s.capture_endpoint().residue(), 0);
}

#[test]
fn long_chunk_leaves_residue() {
    let mut s = session(48000, 1, 1);

    let frames = s.process(&[ramp(0, 1000)], &ProcessOptions::default()).unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(s.capture_endpoint().residue(), 40);
}

#[test]
fn predicts_whole_frames() {
    let s = session(48000, 1, 1);
    assert_eq!(s.predict_output_length(1000, 1, &ProcessOptions::default()).unwrap(), 960);
}

#[test]
fn capacity_is_checked_before_writing() {
    let mut s = session(48000, 1, 1);
    let chunk = [ramp(0, 1000)];
    let opts = ProcessOptions::default();
    let required = s.predict_output_length_for(&chunk, &opts).unwrap();

    let mut short = vec![vec![0.0f32; required - 1]];
    assert_eq!(
        s.process_into(&mut short, None, &chunk, &opts),
        Err(StreamError::Capacity {
            required,
            available: required - 1,
        })
    );
    assert!(short[0].iter().all(|&x| x == 0.0));
    assert_eq!(s.capture_endpoint().residue(), 0);

    let mut exact = vec![vec![0.0f32; required]];
    assert_eq!(s.process_into(&mut exact, None, &chunk, &opts), Ok(required));
    assert_eq!(exact[0], ramp(0, 960));
}

#[test]
fn render_analysis_counts_frames() {
    let mut s = session(16000, 2, 1);

    s.analyze(&[ramp(0, 250), ramp(0, 250)], &AnalyzeOptions::default()).unwrap();
    s.analyze(&[ramp(0, 70), ramp(0, 70)], &AnalyzeOptions::default()).unwrap();

    assert_eq!(s.engine().unwrap().render_frames_analyzed(), 2);
    assert_eq!(s.diagnostics().render.frames_completed, 2);
    assert_eq!(s.render_endpoint().residue(), 0);
}

#[test]
fn stereo_capture_into_mono_session_is_downmixed() {
    let mut s = session(16000, 1, 1);

    let frames = s
        .process(&[vec![0.25f32; 160], vec![0.75; 160]], &ProcessOptions::default())
        .unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), 1);
    for &sample in &frames[0][0] {
        assert_abs_diff_eq!(sample, 0.5, epsilon = 1e-6);
    }
    assert_eq!(s.capture_endpoint().shape().channels, 2);
}

#[test]
fn channel_change_resets_residue() {
    let mut s = session(48000, 1, 1);
    s.process(&[ramp(0, 300)], &ProcessOptions::default()).unwrap();
    assert_eq!(s.capture_endpoint().residue(), 300);

    s.process(&[ramp(0, 10), ramp(0, 10)], &ProcessOptions::default()).unwrap();

    assert_eq!(s.capture_endpoint().residue(), 10);
    assert_eq!(s.diagnostics().capture.discarded_residue_samples, 300);
}

#[test]
fn rejected_rate_keeps_configuration() {
    let mut s = session(48000, 1, 1);
    s.process(&[ramp(0, 100)], &ProcessOptions::default()).unwrap();

    let err = s
        .process(&[ramp(0, 160)], &ProcessOptions::at_rate(16000))
        .unwrap_err();

    assert!(matches!(
        err,
        StreamError::Configuration {
            direction: Direction::Capture,
            sample_rate: 16000,
            channels: 1,
            ..
        }
    ));
    assert_eq!(s.capture_endpoint().shape().sample_rate, 48000);
    assert_eq!(s.capture_endpoint().residue(), 100);

    // Prediction reports the same rejection without touching state
    assert_eq!(
        s.predict_output_length(160, 1, &ProcessOptions::at_rate(16000)),
        Err(err)
    );
    assert!(s.predict_output_length(160, 1, &ProcessOptions::at_rate(22050)).is_err());
    assert_eq!(s.capture_endpoint().residue(), 100);
}

#[test]
fn unmixable_channel_counts_are_rejected_up_front() {
    let mut s = session(48000, 1, 2);
    let chunk = vec![ramp(0, 480); 3];
    let opts = ProcessOptions::default();

    let predicted = s.predict_output_length_for(&chunk, &opts);
    assert!(matches!(
        predicted,
        Err(StreamError::Configuration { channels: 3, .. })
    ));

    let mut out = vec![vec![0.0f32; 480]; 2];
    assert_eq!(s.process_into(&mut out, None, &chunk, &opts), predicted);
    assert_eq!(s.capture_endpoint().shape().channels, 2);
}

#[test]
fn shared_session_frees_engine() {
    let shared = SharedSession::new(session(32000, 1, 1));
    assert_eq!(shared.process(&[ramp(0, 320)], &ProcessOptions::default()).unwrap().len(), 1);

    shared.free().unwrap();
    assert_eq!(
        shared.process(&[ramp(0, 320)], &ProcessOptions::default()),
        Err(StreamError::UseAfterFree)
    );
}

#[test]
fn config_round_trips_through_json() {
    let config = SessionConfig::from_json(r#"{ "sample_rate": 16000, "render_channels": 2 }"#).unwrap();
    let engine = PassthroughEngine::new(config.sample_rate).unwrap();
    let s = EchoCancellerSession::new(engine, config.clone()).unwrap();

    assert_eq!(s.render_frame_size().unwrap(), 160);
    assert_eq!(SessionConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
}

// -- Property tests --

#[proptest]
fn prediction_matches_written_output(
    #[strategy(pvec((0..1500usize, 1..=2usize), 1..12))] chunks: Vec<(usize, usize)>,
) {
    let mut s = session(48000, 1, 2);
    let opts = ProcessOptions::default();

    for (len, channels) in chunks {
        let chunk: Vec<Vec<f32>> = (0..channels).map(|ch| ramp(ch, len)).collect();
        let predicted = s.predict_output_length(len, channels, &opts).unwrap();

        let mut out = vec![vec![0.0f32; predicted]; 2];
        let written = s.process_into(&mut out, None, &chunk, &opts).unwrap();

        prop_assert_eq!(written, predicted);
        prop_assert!(s.capture_endpoint().residue() < 480);
    }
}

#[proptest]
fn chunking_does_not_change_output(
    #[strategy(pvec(0..700usize, 1..10))] lengths: Vec<usize>,
) {
    let total: usize = lengths.iter().sum();
    let signal = ramp(0, total);

    let mut whole = session(16000, 1, 1);
    let expected: Vec<f32> = whole
        .process(&[signal.clone()], &ProcessOptions::default())
        .unwrap()
        .into_iter()
        .flat_map(|frame| frame.into_iter().next().unwrap_or_default())
        .collect();

    let mut split = session(16000, 1, 1);
    let mut actual = Vec::new();
    let mut start = 0;
    for len in lengths {
        for frame in split
            .process(&[&signal[start..start + len]], &ProcessOptions::default())
            .unwrap()
        {
            actual.extend_from_slice(&frame[0]);
        }
        start += len;
    }

    prop_assert_eq!(&actual, &expected);
    prop_assert_eq!(&actual[..], &signal[..total / 160 * 160]);
    prop_assert_eq!(split.capture_endpoint().residue(), whole.capture_endpoint().residue());
}
