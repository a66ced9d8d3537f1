use std::path::Path;

use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::stream_params::StreamParams;
use crate::video::domain::frame_source::{FrameSource, ReadOutcome};

/// Live-stream source backed by ffmpeg-next (libavformat + libavcodec).
///
/// The scaler is pinned at open time to the declared geometry and always
/// emits BGR24, so every frame this source produces satisfies the
/// geometry-stability invariant by construction. A packet the decoder
/// rejects is reported as [`ReadOutcome::Stalled`] — live network streams
/// drop and corrupt packets routinely, and the pipeline decides how long
/// to keep retrying.
pub struct FfmpegSource {
    input: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
    params: Option<StreamParams>,
    next_index: u64,
    flushing: bool,
}

// Safety: FfmpegSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    pub fn new() -> Self {
        Self {
            input: None,
            decoder: None,
            scaler: None,
            video_stream_index: 0,
            params: None,
            next_index: 0,
            flushing: false,
        }
    }

    /// Drains one frame from the decoder if available, converting it to
    /// packed BGR24 at the declared geometry.
    fn try_receive(&mut self) -> Result<Option<Frame>, StreamError> {
        let decoder = self.decoder.as_mut().expect("opened");
        let scaler = self.scaler.as_mut().expect("opened");
        let params = self.params.expect("opened");

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut bgr = ffmpeg_next::util::frame::video::Video::empty();
        scaler
            .run(&decoded, &mut bgr)
            .map_err(|e| StreamError::Decode(e.to_string()))?;

        let pixels = pack_bgr_plane(&bgr, params.width, params.height);
        let frame = Frame::new(pixels, params.width, params.height, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Default for FfmpegSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegSource {
    fn open(&mut self, url: &str) -> Result<StreamParams, StreamError> {
        let unavailable = |reason: String| StreamError::StreamUnavailable {
            url: url.to_string(),
            reason,
        };

        ffmpeg_next::init().map_err(|e| unavailable(e.to_string()))?;

        let input = ffmpeg_next::format::input(Path::new(url))
            .map_err(|e| unavailable(e.to_string()))?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| unavailable("no video stream found".to_string()))?;
        let video_stream_index = stream.index();

        let rate = stream.rate();
        let reported_rate = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unavailable(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| unavailable(e.to_string()))?;

        let params = StreamParams::new(decoder.width(), decoder.height(), reported_rate);

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            params.width,
            params.height,
            ffmpeg_next::format::Pixel::BGR24,
            params.width,
            params.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| unavailable(e.to_string()))?;

        self.video_stream_index = video_stream_index;
        self.params = Some(params);
        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.input = Some(input);
        self.next_index = 0;
        self.flushing = false;

        log::info!(
            "opened {url}: {}x{} @ {:.2} fps",
            params.width,
            params.height,
            params.frame_rate
        );

        Ok(params)
    }

    fn read(&mut self) -> Result<ReadOutcome, StreamError> {
        if self.input.is_none() {
            return Err(StreamError::Decode("source not opened".to_string()));
        }

        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(ReadOutcome::Frame(frame));
            }

            if self.flushing {
                return Ok(ReadOutcome::EndOfStream);
            }

            let input = self.input.as_mut().expect("opened");
            let Some((stream, packet)) = input.packets().next() else {
                // Demuxer EOF: flush the decoder, then report end-of-stream
                // once the remaining buffered frames are drained.
                let _ = self.decoder.as_mut().expect("opened").send_eof();
                self.flushing = true;
                continue;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self
                .decoder
                .as_mut()
                .expect("opened")
                .send_packet(&packet)
                .is_err()
            {
                return Ok(ReadOutcome::Stalled);
            }
        }
    }

    fn close(&mut self) {
        self.input = None;
        self.decoder = None;
        self.scaler = None;
        self.params = None;
    }
}

/// Copies the BGR plane out of an ffmpeg frame, dropping per-row padding
/// so the result is exactly `width * height * 3` contiguous bytes.
fn pack_bgr_plane(frame: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let plane = frame.data(0);
    let row_bytes = width as usize * crate::shared::frame::CHANNELS;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&plane[start..start + row_bytes]);
    }
    pixels
}
