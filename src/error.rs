use std::io;
use thiserror::Error;

/// Type-erased error returned by a [`Decode`](crate::Decode) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that halt an event stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to decode data field: {0}")]
    Decode(#[source] BoxError),

    #[error("Record exceeds maximum length of {limit} bytes")]
    RecordTooLarge { limit: usize },
}
