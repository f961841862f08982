use std::io::Read;
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::config::StreamConfig;
use crate::decode::Decode;
use crate::error::StreamError;
use crate::event::Event;
use crate::parse::parse_record;
use crate::record::RecordReader;

/// Observable lifecycle of an [`EventStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No call to `advance` has been made yet.
    Idle,
    /// At least one event has been produced.
    Active,
    /// The source is exhausted or the stream was closed.
    Done,
    /// An error was recorded; see [`EventStream::last_error`].
    Failed,
}

#[derive(Debug)]
enum Status {
    Idle,
    Active,
    Done,
    Failed(StreamError),
}

/// Pull-based parser that turns a byte source into decoded events.
///
/// ```
/// use sse_events::{EventStream, decode::Utf8};
///
/// let body: &[u8] = b"id:1\nevent:greeting\ndata:hello\n\ndata:world\n\n";
/// let mut stream = EventStream::new(body, Utf8);
/// let mut seen = Vec::new();
/// while stream.advance() {
///     if let Some(event) = stream.current() {
///         seen.push(event.data.clone().unwrap_or_default());
///     }
/// }
/// assert!(stream.last_error().is_none());
/// assert_eq!(seen, ["hello", "world"]);
/// ```
///
/// The source is released by [`close`](Self::close) or when the stream is
/// dropped, whichever happens first.
pub struct EventStream<R, D: Decode> {
    records: RecordReader<R>,
    decoder: D,
    config: StreamConfig,
    current: Option<Event<D::Output>>,
    status: Status,
}

impl<R: Read, D: Decode> EventStream<R, D> {
    pub fn new(source: R, decoder: D) -> Self {
        Self::with_config(StreamConfig::default(), source, decoder)
    }

    /// Creates a stream that requests `capacity` bytes per read.
    pub fn with_capacity(capacity: usize, source: R, decoder: D) -> Self {
        Self::with_config(
            StreamConfig::new().with_read_chunk_size(capacity),
            source,
            decoder,
        )
    }

    pub fn with_config(config: StreamConfig, source: R, decoder: D) -> Self {
        Self {
            records: RecordReader::with_config(&config, source),
            decoder,
            config,
            current: None,
            status: Status::Idle,
        }
    }

    /// Moves to the next event. Returns `false` at end of stream or after an
    /// error; use [`last_error`](Self::last_error) to tell the two apart.
    pub fn advance(&mut self) -> bool {
        if matches!(self.status, Status::Done | Status::Failed(_)) {
            return false;
        }

        let result = match self.records.next_record() {
            Ok(Some(record)) => parse_record(record, &mut self.decoder, &self.config).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(event)) => {
                trace!(
                    id = %event.id,
                    name = %event.name,
                    empty = event.is_empty(),
                    "event decoded"
                );
                self.current = Some(event);
                self.status = Status::Active;
                true
            }
            Ok(None) => {
                debug!("event stream exhausted");
                self.status = Status::Done;
                false
            }
            Err(e) => {
                debug!(error = %e, "event stream failed");
                self.status = Status::Failed(e);
                false
            }
        }
    }

    /// The event produced by the most recent successful [`advance`](Self::advance).
    pub fn current(&self) -> Option<&Event<D::Output>> {
        self.current.as_ref()
    }

    pub fn take_current(&mut self) -> Option<Event<D::Output>> {
        self.current.take()
    }

    /// The error that halted the stream, if any.
    pub fn last_error(&self) -> Option<&StreamError> {
        match &self.status {
            Status::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn state(&self) -> StreamState {
        match self.status {
            Status::Idle => StreamState::Idle,
            Status::Active => StreamState::Active,
            Status::Done => StreamState::Done,
            Status::Failed(_) => StreamState::Failed,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Releases the source. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.records.is_closed() {
            return;
        }
        self.records.close();
        if !matches!(self.status, Status::Failed(_)) {
            self.status = Status::Done;
        }
        debug!("event stream closed");
    }

    /// Returns the source, or `None` if the stream was closed.
    pub fn into_inner(self) -> Option<R> {
        self.records.into_inner()
    }

    /// Converts the stream into an iterator of owned events.
    pub fn into_events(self) -> Events<R, D> {
        Events { stream: self }
    }
}

/// Iterator over the events of an [`EventStream`].
///
/// A recorded error is yielded once, after which the iterator is exhausted.
pub struct Events<R, D: Decode> {
    stream: EventStream<R, D>,
}

impl<R: Read, D: Decode> Iterator for Events<R, D> {
    type Item = Result<Event<D::Output>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stream.advance() {
            return self.stream.take_current().map(Ok);
        }
        match std::mem::replace(&mut self.stream.status, Status::Done) {
            Status::Failed(e) => Some(Err(e)),
            _ => None,
        }
    }
}

impl<R: Read, D: Decode> FusedIterator for Events<R, D> {}
