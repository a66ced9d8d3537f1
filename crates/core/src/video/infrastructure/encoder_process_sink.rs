use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::stream_params::StreamParams;
use crate::video::domain::frame_sink::FrameSink;

/// Sink backed by a long-lived external encoder process (ffmpeg by
/// default), fed raw BGR24 frames over its stdin.
///
/// The process is told the pixel format, geometry, and frame rate up
/// front; after that the input is an undelimited byte stream, one frame's
/// bytes at a time. Writes block when the encoder falls behind — that
/// blocking is the pipeline's backpressure. A broken pipe is fatal:
/// mid-stream resynchronization of a stateful encoder is not defined, so
/// there is no reconnect path.
pub struct EncoderProcessSink {
    program: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frame_bytes: usize,
}

impl EncoderProcessSink {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
            stdin: None,
            frame_bytes: 0,
        }
    }

    fn encoder_args(url: &str, params: &StreamParams) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "bgr24".to_string(),
            "-s".to_string(),
            format!("{}x{}", params.width, params.height),
            "-r".to_string(),
            format!("{}", params.frame_rate),
            "-i".to_string(),
            "-".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-f".to_string(),
            "rtsp".to_string(),
            url.to_string(),
        ]
    }
}

impl Default for EncoderProcessSink {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FrameSink for EncoderProcessSink {
    fn open(&mut self, url: &str, params: &StreamParams) -> Result<(), StreamError> {
        let mut child = Command::new(&self.program)
            .args(Self::encoder_args(url, params))
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| StreamError::EncoderUnavailable {
                url: url.to_string(),
                source: e,
            })?;

        // Piped stdin is always present after a successful spawn.
        self.stdin = child.stdin.take();
        self.child = Some(child);
        self.frame_bytes = params.frame_bytes();

        log::info!(
            "encoder started for {url}: {}x{} bgr24 @ {:.2} fps",
            params.width,
            params.height,
            params.frame_rate
        );

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), StreamError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            StreamError::WriteFailed(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "sink not opened",
            ))
        })?;

        // A frame that does not match the declared geometry would shift
        // every subsequent frame boundary in the encoder's input.
        if frame.data().len() != self.frame_bytes {
            return Err(StreamError::WriteFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "frame is {} bytes, sink configured for {}",
                    frame.data().len(),
                    self.frame_bytes
                ),
            )));
        }

        stdin.write_all(frame.data()).map_err(StreamError::WriteFailed)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        // Dropping stdin signals EOF so the encoder can finalize.
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let status = child.wait().map_err(StreamError::WriteFailed)?;
            if !status.success() {
                log::warn!("encoder exited with {status}");
            }
        }
        Ok(())
    }
}
