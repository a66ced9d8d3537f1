use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for redacting regions within a frame.
///
/// Implementations mutate the frame in place and must not retain any
/// reference to it after the call returns. Regions are assumed to be
/// clamped to the frame; overlapping regions blur cumulatively, which
/// only ever over-blurs — the safe direction for a privacy feature.
/// An empty region list must leave the frame byte-identical.
pub trait FrameBlurrer: Send {
    fn blur(&self, frame: &mut Frame, regions: &[Region]) -> Result<(), StreamError>;
}
