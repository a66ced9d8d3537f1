use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::stream_params::StreamParams;

/// Pushes raw frames to an encoding/publishing sink.
///
/// The sink must be configured with the stream geometry before the first
/// write, and every written frame must match that geometry exactly — the
/// byte stream carries no delimiters, so a mismatch desynchronizes the
/// encoder irrecoverably. `write` is synchronous: a full sink blocks the
/// pipeline, which is the intended throttling mechanism.
pub trait FrameSink: Send {
    fn open(&mut self, url: &str, params: &StreamParams) -> Result<(), StreamError>;

    fn write(&mut self, frame: &Frame) -> Result<(), StreamError>;

    fn close(&mut self) -> Result<(), StreamError>;
}
