//! Transcode adapter: re-encodes audio to MP3, optionally trimmed.
//!
//! Works on a materialized file ([`Transcoder::transcode_file`]) or on a
//! live [`ByteStream`](crate::process::ByteStream)
//! ([`Transcoder::transcode_stream`]). A malformed [`TrimRange`] is rejected
//! before any process is started.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::TrimRange;
