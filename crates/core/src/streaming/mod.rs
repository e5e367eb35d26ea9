//! Synchronous streaming: audio piped straight to the caller.
//!
//! For each candidate attempt the extractor's stdout is piped (through the
//! transcoder when a trim range is requested) and the pipeline waits for the
//! first non-empty chunk. Anything that fails before that chunk counts as a
//! failed attempt and the next one is tried. Once a chunk has arrived the
//! pipeline is committed: response metadata is fixed and a later failure can
//! only end the stream with an error item.

mod error;
mod pipeline;

pub use error::{AttemptError, StreamError};
pub use pipeline::{AudioStream, StreamingPipeline, AUDIO_CONTENT_TYPE};
