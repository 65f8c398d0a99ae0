//! Graphmill CLI library
//!
//! The batch ingest pipeline and the file-based content fetcher, exposed
//! for the binary and for integration tests.

pub mod fetch;
pub mod pipeline;

pub use fetch::FileFetcher;
pub use pipeline::{BatchReport, IngestPipeline};
