use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face detection.
///
/// Implementations may keep per-stream scratch state, hence `&mut self`.
/// Returned regions must already be clamped to the frame bounds; an empty
/// result is a valid outcome, not an error.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, StreamError>;
}
