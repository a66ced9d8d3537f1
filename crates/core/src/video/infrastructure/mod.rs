pub mod encoder_process_sink;
pub mod ffmpeg_source;
