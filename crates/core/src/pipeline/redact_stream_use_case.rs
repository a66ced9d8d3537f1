use std::time::{Duration, Instant};

use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::stall_backoff::StallBackoff;
use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::stream_params::StreamParams;
use crate::video::domain::frame_sink::FrameSink;
use crate::video::domain::frame_source::{FrameSource, ReadOutcome};

pub const DEFAULT_MAX_STALL: Duration = Duration::from_secs(30);

/// Counters for one completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub frames_forwarded: u64,
    pub frames_redacted: u64,
    pub regions_blurred: u64,
}

/// Drives the read → detect → blur → write loop for one stream.
///
/// Strictly sequential with exactly one frame in flight: frame *n* is
/// fully written out before frame *n+1* is read, and frames reach the
/// sink in read order. Blocking reads and writes are the backpressure —
/// a slow encoder throttles capture implicitly. The loop ends at
/// end-of-stream or on the first unrecovered error; only transient read
/// misses are retried, through a bounded backoff.
pub struct RedactStreamUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    blurrer: Box<dyn FrameBlurrer>,
    sink: Box<dyn FrameSink>,
    logger: Box<dyn PipelineLogger>,
    max_stall: Duration,
}

impl RedactStreamUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        blurrer: Box<dyn FrameBlurrer>,
        sink: Box<dyn FrameSink>,
        logger: Box<dyn PipelineLogger>,
        max_stall: Option<Duration>,
    ) -> Self {
        Self {
            source,
            detector,
            blurrer,
            sink,
            logger,
            max_stall: max_stall.unwrap_or(DEFAULT_MAX_STALL),
        }
    }

    pub fn run(
        &mut self,
        input_url: &str,
        output_url: &str,
    ) -> Result<PipelineSummary, StreamError> {
        let params = self.source.open(input_url)?;
        self.sink.open(output_url, &params)?;
        self.logger.info(&format!(
            "redacting {input_url} -> {output_url} ({}x{} @ {:.2} fps)",
            params.width, params.height, params.frame_rate
        ));

        let result = self.pump(&params);

        // The source is released regardless of how the loop ended; sink
        // teardown is fallible but must not mask a pipeline error.
        self.source.close();
        let close_result = self.sink.close();
        self.logger.summary();

        let summary = result?;
        close_result?;
        Ok(summary)
    }

    fn pump(&mut self, params: &StreamParams) -> Result<PipelineSummary, StreamError> {
        let mut summary = PipelineSummary::default();
        let mut backoff = StallBackoff::new(self.max_stall);

        loop {
            match self.source.read()? {
                ReadOutcome::EndOfStream => break,
                ReadOutcome::Stalled => {
                    backoff.wait()?;
                }
                ReadOutcome::Frame(mut frame) => {
                    backoff.reset();
                    let started = Instant::now();

                    if frame.width() != params.width || frame.height() != params.height {
                        // Forwarding a frame of the wrong geometry would
                        // shift every later frame boundary in the encoder.
                        return Err(StreamError::Decode(format!(
                            "frame {} is {}x{}, stream declared {}x{}",
                            frame.index(),
                            frame.width(),
                            frame.height(),
                            params.width,
                            params.height
                        )));
                    }

                    let regions = self.redact(&mut frame, params)?;

                    self.sink.write(&frame)?;
                    summary.frames_forwarded += 1;
                    if regions > 0 {
                        summary.frames_redacted += 1;
                        summary.regions_blurred += regions as u64;
                    }

                    self.logger.frame_done(
                        frame.index(),
                        regions,
                        started.elapsed().as_secs_f64() * 1000.0,
                    );
                }
            }
        }

        Ok(summary)
    }

    /// Detects and blurs in place; returns the number of regions blurred.
    fn redact(&mut self, frame: &mut Frame, params: &StreamParams) -> Result<usize, StreamError> {
        let detected = self.detector.detect(frame)?;
        let regions: Vec<Region> = detected
            .into_iter()
            .filter_map(|r| r.clamp(params.width, params.height))
            .collect();

        if !regions.is_empty() {
            self.blurrer.blur(frame, &regions)?;
        }
        Ok(regions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubSource {
        params: StreamParams,
        outcomes: Vec<ReadOutcome>,
        closed: Arc<Mutex<bool>>,
        fail_open: bool,
    }

    impl StubSource {
        fn new(outcomes: Vec<ReadOutcome>) -> Self {
            Self {
                params: StreamParams::new(100, 100, 30.0),
                outcomes,
                closed: Arc::new(Mutex::new(false)),
                fail_open: false,
            }
        }

        fn from_frames(frames: Vec<Frame>) -> Self {
            let mut outcomes: Vec<ReadOutcome> =
                frames.into_iter().map(ReadOutcome::Frame).collect();
            outcomes.push(ReadOutcome::EndOfStream);
            Self::new(outcomes)
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self, url: &str) -> Result<StreamParams, StreamError> {
            if self.fail_open {
                return Err(StreamError::StreamUnavailable {
                    url: url.to_string(),
                    reason: "stub".into(),
                });
            }
            // Keep read order intact when draining from the front.
            self.outcomes.reverse();
            Ok(self.params)
        }

        fn read(&mut self) -> Result<ReadOutcome, StreamError> {
            Ok(self.outcomes.pop().unwrap_or(ReadOutcome::EndOfStream))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[derive(Default)]
    struct SinkState {
        opened_with: Option<StreamParams>,
        written: Vec<u64>,
        closed: bool,
    }

    struct StubSink {
        state: Arc<Mutex<SinkState>>,
        fail_write: bool,
    }

    impl StubSink {
        fn new() -> (Self, Arc<Mutex<SinkState>>) {
            let state = Arc::new(Mutex::new(SinkState::default()));
            (
                Self {
                    state: state.clone(),
                    fail_write: false,
                },
                state,
            )
        }
    }

    impl FrameSink for StubSink {
        fn open(&mut self, _url: &str, params: &StreamParams) -> Result<(), StreamError> {
            self.state.lock().unwrap().opened_with = Some(*params);
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), StreamError> {
            if self.fail_write {
                return Err(StreamError::WriteFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "stub",
                )));
            }
            self.state.lock().unwrap().written.push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), StreamError> {
            self.state.lock().unwrap().closed = true;
            Ok(())
        }
    }

    struct StubDetector {
        results: HashMap<u64, Vec<Region>>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, StreamError> {
            Ok(self
                .results
                .get(&frame.index())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct CountingBlurrer {
        calls: Arc<Mutex<Vec<(u64, usize)>>>,
    }

    impl CountingBlurrer {
        fn new() -> (Self, Arc<Mutex<Vec<(u64, usize)>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl FrameBlurrer for CountingBlurrer {
        fn blur(&self, frame: &mut Frame, regions: &[Region]) -> Result<(), StreamError> {
            self.calls.lock().unwrap().push((frame.index(), regions.len()));
            Ok(())
        }
    }

    // --- Helpers ---

    fn frame(index: u64) -> Frame {
        Frame::black(100, 100, index)
    }

    fn use_case(
        source: StubSource,
        detector: StubDetector,
        blurrer: CountingBlurrer,
        sink: StubSink,
    ) -> RedactStreamUseCase {
        RedactStreamUseCase::new(
            Box::new(source),
            Box::new(detector),
            Box::new(blurrer),
            Box::new(sink),
            Box::new(NullPipelineLogger),
            Some(Duration::from_millis(200)),
        )
    }

    // --- Tests ---

    #[test]
    fn frames_with_faces_are_blurred_and_all_are_forwarded_in_order() {
        // 10 frames, 3 of which carry one face-like region each.
        let frames: Vec<Frame> = (0..10).map(frame).collect();
        let mut results = HashMap::new();
        for idx in [2u64, 5, 8] {
            results.insert(idx, vec![Region::new(10, 10, 30, 30)]);
        }

        let (blurrer, calls) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            StubSource::from_frames(frames),
            StubDetector { results },
            blurrer,
            sink,
        );

        let summary = uc.run("in", "out").unwrap();

        assert_eq!(summary.frames_forwarded, 10);
        assert_eq!(summary.frames_redacted, 3);
        assert_eq!(summary.regions_blurred, 3);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![2, 5, 8]
        );

        let state = sink_state.lock().unwrap();
        assert_eq!(state.written, (0..10).collect::<Vec<u64>>());
        assert!(state.closed);
    }

    #[test]
    fn sink_is_opened_with_the_source_params() {
        let (blurrer, _) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut source = StubSource::from_frames(vec![]);
        source.params = StreamParams::new(640, 480, 0.0);

        let mut uc = use_case(
            source,
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );
        uc.run("in", "out").unwrap();

        let opened = sink_state.lock().unwrap().opened_with.unwrap();
        assert_eq!((opened.width, opened.height), (640, 480));
        // Unreported rate must already be substituted by the source side.
        assert_eq!(opened.frame_rate, 25.0);
    }

    #[test]
    fn detected_regions_are_clamped_before_blurring() {
        let mut results = HashMap::new();
        // Spills 20px past the right/bottom edge of the 100x100 frame.
        results.insert(0u64, vec![Region::new(90, 90, 30, 30)]);

        struct AssertingBlurrer;
        impl FrameBlurrer for AssertingBlurrer {
            fn blur(&self, frame: &mut Frame, regions: &[Region]) -> Result<(), StreamError> {
                for r in regions {
                    assert!(r.contained_in(frame.width(), frame.height()));
                }
                Ok(())
            }
        }

        let (sink, _) = StubSink::new();
        let mut uc = RedactStreamUseCase::new(
            Box::new(StubSource::from_frames(vec![frame(0)])),
            Box::new(StubDetector { results }),
            Box::new(AssertingBlurrer),
            Box::new(sink),
            Box::new(NullPipelineLogger),
            None,
        );
        uc.run("in", "out").unwrap();
    }

    #[test]
    fn fully_out_of_frame_region_skips_the_blur_call() {
        let mut results = HashMap::new();
        results.insert(0u64, vec![Region::new(500, 500, 30, 30)]);

        let (blurrer, calls) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            StubSource::from_frames(vec![frame(0)]),
            StubDetector { results },
            blurrer,
            sink,
        );
        let summary = uc.run("in", "out").unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(summary.frames_redacted, 0);
        // The frame itself still goes out.
        assert_eq!(sink_state.lock().unwrap().written, vec![0]);
    }

    #[test]
    fn transient_stalls_are_retried() {
        let outcomes = vec![
            ReadOutcome::Frame(frame(0)),
            ReadOutcome::Stalled,
            ReadOutcome::Stalled,
            ReadOutcome::Frame(frame(1)),
            ReadOutcome::EndOfStream,
        ];
        let (blurrer, _) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            StubSource::new(outcomes),
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );

        let summary = uc.run("in", "out").unwrap();
        assert_eq!(summary.frames_forwarded, 2);
        assert_eq!(sink_state.lock().unwrap().written, vec![0, 1]);
    }

    #[test]
    fn sustained_stall_escalates_to_decode_error() {
        // Far more stalls than the 200 ms budget allows.
        let outcomes = std::iter::repeat_with(|| ReadOutcome::Stalled)
            .take(64)
            .collect();
        let (blurrer, _) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            StubSource::new(outcomes),
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );

        let err = uc.run("in", "out").unwrap_err();
        assert!(matches!(err, StreamError::Decode(_)));
        // Teardown still happened.
        assert!(sink_state.lock().unwrap().closed);
    }

    #[test]
    fn failed_open_is_fatal_and_never_touches_the_sink() {
        let mut source = StubSource::from_frames(vec![frame(0)]);
        source.fail_open = true;
        let (blurrer, _) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            source,
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );

        let err = uc.run("in", "out").unwrap_err();
        assert!(matches!(err, StreamError::StreamUnavailable { .. }));
        assert!(sink_state.lock().unwrap().opened_with.is_none());
    }

    #[test]
    fn write_failure_terminates_the_run() {
        let (blurrer, _) = CountingBlurrer::new();
        let (mut sink, _) = StubSink::new();
        sink.fail_write = true;
        let mut uc = use_case(
            StubSource::from_frames(vec![frame(0), frame(1)]),
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );

        let err = uc.run("in", "out").unwrap_err();
        assert!(matches!(err, StreamError::WriteFailed(_)));
    }

    #[test]
    fn geometry_drift_is_fatal() {
        let outcomes = vec![
            ReadOutcome::Frame(frame(0)),
            ReadOutcome::Frame(Frame::black(50, 50, 1)),
        ];
        let (blurrer, _) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            StubSource::new(outcomes),
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );

        let err = uc.run("in", "out").unwrap_err();
        assert!(matches!(err, StreamError::Decode(_)));
        // The well-formed frame before the drift was still forwarded.
        assert_eq!(sink_state.lock().unwrap().written, vec![0]);
    }

    #[test]
    fn detector_failure_is_fatal() {
        struct FailingDetector;
        impl FaceDetector for FailingDetector {
            fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, StreamError> {
                Err(StreamError::Detection("stub".into()))
            }
        }

        let (blurrer, _) = CountingBlurrer::new();
        let (sink, _) = StubSink::new();
        let mut uc = RedactStreamUseCase::new(
            Box::new(StubSource::from_frames(vec![frame(0)])),
            Box::new(FailingDetector),
            Box::new(blurrer),
            Box::new(sink),
            Box::new(NullPipelineLogger),
            None,
        );

        let err = uc.run("in", "out").unwrap_err();
        assert!(matches!(err, StreamError::Detection(_)));
    }

    #[test]
    fn empty_stream_yields_zero_summary() {
        let (blurrer, _) = CountingBlurrer::new();
        let (sink, sink_state) = StubSink::new();
        let mut uc = use_case(
            StubSource::from_frames(vec![]),
            StubDetector {
                results: HashMap::new(),
            },
            blurrer,
            sink,
        );
        let summary = uc.run("in", "out").unwrap();
        assert_eq!(summary, PipelineSummary::default());
        assert!(sink_state.lock().unwrap().closed);
    }
}
