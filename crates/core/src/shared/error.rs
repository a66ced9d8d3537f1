use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the redaction pipeline.
///
/// Everything here is fatal to the run except where the pipeline driver
/// explicitly recovers: transient read misses are reported through
/// [`ReadOutcome::Stalled`](crate::video::domain::frame_source::ReadOutcome)
/// rather than as errors, and only escalate to [`StreamError::Decode`] once
/// the stall bound is exhausted.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("cannot open input stream {url}: {reason}")]
    StreamUnavailable { url: String, reason: String },

    #[error("cannot start encoder for {url}: {source}")]
    EncoderUnavailable {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode frame: {0}")]
    Decode(String),

    #[error("encoder pipe broken: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("failed to read cascade model {path}: {source}")]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cascade model {path}: {source}")]
    ModelParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
