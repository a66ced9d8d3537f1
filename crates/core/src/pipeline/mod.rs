pub mod pipeline_logger;
pub mod redact_stream_use_case;
pub mod stall_backoff;
