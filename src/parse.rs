use memchr::{memchr, memchr2};
use tracing::trace;

use crate::config::{DataMode, StreamConfig};
use crate::decode::Decode;
use crate::error::StreamError;
use crate::event::Event;

/// Non-empty lines of a record, split on `\r\n`, `\r` or `\n`.
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let (line, rest) = match memchr2(b'\r', b'\n', self.rest) {
                Some(pos) => (&self.rest[..pos], &self.rest[pos + 1..]),
                None => (self.rest, &[][..]),
            };
            self.rest = rest;
            if !line.is_empty() {
                return Some(line);
            }
        }
    }
}

fn lines(record: &[u8]) -> Lines<'_> {
    Lines { rest: record }
}

/// Splits a line into field name and value. Comment lines yield `None`.
fn split_field(line: &[u8]) -> Option<(&[u8], &[u8])> {
    match memchr(b':', line) {
        None => Some((line, &[][..])),
        Some(0) => None,
        Some(pos) => Some((&line[..pos], &line[pos + 1..])),
    }
}

fn parse_retry(value: &[u8]) -> Option<i64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}

fn decode_data<D: Decode>(decoder: &mut D, data: &[u8]) -> Result<D::Output, StreamError> {
    decoder
        .decode(data)
        .map_err(|e| StreamError::Decode(e.into()))
}

/// Decodes one record into an [`Event`].
pub(crate) fn parse_record<D: Decode>(
    record: &[u8],
    decoder: &mut D,
    config: &StreamConfig,
) -> Result<Event<D::Output>, StreamError> {
    let mut event = Event::blank();
    let mut joined: Option<Vec<u8>> = None;

    for line in lines(record) {
        let Some((field, mut value)) = split_field(line) else {
            continue;
        };
        if config.strip_leading_space {
            value = value.strip_prefix(b" ").unwrap_or(value);
        }

        match field {
            b"id" => {
                event.id = String::from_utf8_lossy(value).into_owned();
                event.empty = false;
            }
            b"event" => {
                event.name = String::from_utf8_lossy(value).into_owned();
                event.empty = false;
            }
            b"retry" => match parse_retry(value) {
                Some(ms) => {
                    event.retry_millis = ms;
                    event.empty = false;
                }
                None => trace!(
                    value = %String::from_utf8_lossy(value),
                    "ignoring malformed retry"
                ),
            },
            b"data" => {
                match config.data_mode {
                    DataMode::LastWins => event.data = Some(decode_data(decoder, value)?),
                    DataMode::Concatenate => match joined.as_mut() {
                        Some(buf) => {
                            buf.push(b'\n');
                            buf.extend_from_slice(value);
                        }
                        None => joined = Some(value.to_vec()),
                    },
                }
                event.empty = false;
            }
            _ => trace!(field = %String::from_utf8_lossy(field), "ignoring unknown field"),
        }
    }

    if let Some(buf) = joined {
        event.data = Some(decode_data(decoder, &buf)?);
    }

    Ok(event)
}
