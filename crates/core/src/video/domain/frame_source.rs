use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::stream_params::StreamParams;

/// One pull from a live source.
///
/// `Stalled` is a transient miss (no frame available yet, or a corrupt
/// packet was skipped); the pipeline retries with backoff instead of
/// terminating. `EndOfStream` is normal termination, not an error.
#[derive(Debug)]
pub enum ReadOutcome {
    Frame(Frame),
    Stalled,
    EndOfStream,
}

/// Pulls decoded frames from a live video source.
///
/// Implementations own the demux/decode details; the pipeline only sees
/// [`Frame`]s of the geometry reported at open time. `read` may block —
/// that is the upstream half of the pipeline's backpressure.
pub trait FrameSource: Send {
    /// Opens the source and reports its fixed geometry and rate.
    ///
    /// Failure here is fatal to the pipeline; there is no retry at this
    /// layer.
    fn open(&mut self, url: &str) -> Result<StreamParams, StreamError>;

    fn read(&mut self) -> Result<ReadOutcome, StreamError>;

    fn close(&mut self);
}
