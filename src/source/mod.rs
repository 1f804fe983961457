pub mod stream;

pub use stream::{connect, encode_sample_line, open_stream, JsonLineSource};

use crate::models::SampleRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("connection to {address} timed out after {seconds}s")]
    ConnectTimeout { address: String, seconds: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pull-style provider of decoded sample records
#[allow(async_fn_in_trait)]
pub trait SampleSource {
    /// Wait for the next sample
    ///
    /// `Ok(None)` means the stream ended or the link was lost.
    async fn next_sample(&mut self) -> Result<Option<SampleRecord>, SourceError>;
}
