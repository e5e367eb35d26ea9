//! Extraction adapter: resolves a candidate URL into audio bytes.
//!
//! Two modes are supported:
//!
//! - **Materializing**: [`Extractor::extract_to_file`] writes a complete audio
//!   file and returns it as an [`Artifact`](crate::Artifact).
//! - **Streaming**: [`Extractor::extract_stream`] returns a
//!   [`ByteStream`](crate::process::ByteStream) fed by the tool's stdout.
//!
//! In both modes an attempt only counts as successful when the tool exits
//! with status zero *and* produced at least one byte. Failed materializing
//! attempts remove whatever they left next to the target path.

mod config;
mod error;
mod traits;
mod ytdlp;

pub use config::ExtractorConfig;
pub use error::ExtractError;
pub use traits::Extractor;
pub use ytdlp::{extraction_target, YtDlpExtractor};
