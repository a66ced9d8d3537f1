use crate::shared::constants::DEFAULT_FRAME_RATE;

/// Stream geometry and rate, read once from the source at open time and
/// invariant for the run. The sink must be configured with these exact
/// values before the first write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

impl StreamParams {
    /// Builds params from a source-reported rate.
    ///
    /// Live sources frequently fail to report a rate; an absent, zero, or
    /// negative value is replaced with [`DEFAULT_FRAME_RATE`] because the
    /// encoder rejects a non-positive rate outright.
    pub fn new(width: u32, height: u32, reported_rate: f64) -> Self {
        let frame_rate = if reported_rate.is_finite() && reported_rate > 0.0 {
            reported_rate
        } else {
            DEFAULT_FRAME_RATE
        };
        Self {
            width,
            height,
            frame_rate,
        }
    }

    /// Exact byte length of one serialized frame at this geometry.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * crate::shared::frame::CHANNELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn reported_rate_is_kept() {
        let params = StreamParams::new(1920, 1080, 30.0);
        assert_relative_eq!(params.frame_rate, 30.0);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn unusable_rate_falls_back_to_default(#[case] reported: f64) {
        let params = StreamParams::new(640, 480, reported);
        assert_relative_eq!(params.frame_rate, 25.0);
    }

    #[test]
    fn frame_bytes_matches_bgr24_layout() {
        assert_eq!(StreamParams::new(4, 2, 25.0).frame_bytes(), 24);
        assert_eq!(StreamParams::new(640, 480, 25.0).frame_bytes(), 640 * 480 * 3);
    }
}
