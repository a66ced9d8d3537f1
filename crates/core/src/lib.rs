//! Real-time face redaction for live video streams.
//!
//! The pipeline reads decoded frames from a live source, blurs every
//! detected face region in place, and forwards the raw frame bytes to an
//! external encoding process. One frame is in flight at a time; blocking
//! reads and writes are the backpressure mechanism.

pub mod blurring;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod video;
