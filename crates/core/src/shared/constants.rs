pub const CASCADE_MODEL_NAME: &str = "frontalface_default.cascade.json";
pub const CASCADE_MODEL_URL: &str =
    "https://github.com/streamveil/streamveil/releases/download/v0.1.0/frontalface_default.cascade.json";

/// Substituted when the source reports no usable frame rate.
pub const DEFAULT_FRAME_RATE: f64 = 25.0;

/// Step between detection scales. Lower values find more faces at the cost
/// of throughput.
pub const CASCADE_SCALE_FACTOR: f64 = 1.3;

/// Overlapping raw hits required to confirm a detection.
pub const CASCADE_MIN_NEIGHBORS: usize = 5;

/// Gaussian kernel extent for face redaction. Large enough to destroy
/// identity-bearing detail at any face scale the detector reports.
pub const BLUR_KERNEL_SIZE: usize = 51;
