use std::time::Instant;

/// Cross-cutting observer for pipeline events.
///
/// Keeps the driver free of any particular output mechanism: the CLI
/// routes events through the `log` facade, embedders and tests can plug
/// in their own or discard everything.
pub trait PipelineLogger: Send {
    /// One frame fully processed; `regions` is the number of redacted
    /// regions in it.
    fn frame_done(&mut self, index: u64, regions: usize, elapsed_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&mut self) {}
}

/// Discards all events. For tests and embedders with their own telemetry.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame_done(&mut self, _index: u64, _regions: usize, _elapsed_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Routes pipeline events through the `log` facade.
///
/// Per-frame output is throttled to every `throttle_frames` frames — a
/// live stream produces tens of frames per second and per-frame logging
/// would drown everything else.
pub struct LogPipelineLogger {
    throttle_frames: u64,
    started: Instant,
    frames: u64,
    redacted_frames: u64,
    total_regions: u64,
    total_elapsed_ms: f64,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            started: Instant::now(),
            frames: 0,
            redacted_frames: 0,
            total_regions: 0,
            total_elapsed_ms: 0.0,
        }
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn frame_done(&mut self, index: u64, regions: usize, elapsed_ms: f64) {
        self.frames += 1;
        self.total_regions += regions as u64;
        if regions > 0 {
            self.redacted_frames += 1;
        }
        self.total_elapsed_ms += elapsed_ms;

        if index % self.throttle_frames == 0 {
            let wall = self.started.elapsed().as_secs_f64();
            let fps = if wall > 0.0 {
                self.frames as f64 / wall
            } else {
                0.0
            };
            log::info!(
                "frame {index}: {regions} region(s), {elapsed_ms:.1} ms ({fps:.1} fps average)"
            );
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&mut self) {
        let avg = if self.frames > 0 {
            self.total_elapsed_ms / self.frames as f64
        } else {
            0.0
        };
        log::info!(
            "processed {} frames ({} with faces, {} regions total), {:.1} ms/frame average",
            self.frames,
            self.redacted_frames,
            self.total_regions,
            avg
        );
    }
}
