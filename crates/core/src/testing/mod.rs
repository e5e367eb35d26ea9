//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the external extraction and transcoding tools so
//! the job and streaming flows can be exercised without yt-dlp or ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use audiograb_core::testing::{MockExtractor, MockTranscoder};
//!
//! let extractor = Arc::new(MockExtractor::new());
//! let transcoder = Arc::new(MockTranscoder::new());
//!
//! // Use in JobService / StreamingPipeline...
//! ```

mod mock_extractor;
mod mock_transcoder;

pub use mock_extractor::{
    ExtractMode, MockExtractor, MockFailure, MockOutcome, RecordedExtraction,
};
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};
