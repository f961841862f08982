//! Pull-based streaming parser for `text/event-stream` bodies.
//!
//! An [`EventStream`] wraps any [`std::io::Read`] source, splits it into
//! blank-line separated records as bytes arrive and decodes each record into
//! an [`Event`] whose `data:` payload is produced by a caller-supplied
//! [`Decode`] implementation.

mod config;
pub mod decode;
mod error;
mod event;
mod parse;
mod record;
mod stream;

pub use config::{DEFAULT_MAX_RECORD_LEN, DEFAULT_READ_CHUNK_SIZE, DataMode, StreamConfig};
pub use decode::Decode;
pub use error::{BoxError, StreamError};
pub use event::Event;
pub use record::RecordReader;
pub use stream::{EventStream, Events, StreamState};
