//! Payload decoders applied to the value of `data:` fields.

#[cfg(feature = "json")]
use std::marker::PhantomData;

use crate::error::BoxError;

/// Turns the raw bytes of a `data:` field into a typed payload.
///
/// Any `FnMut(&[u8]) -> Result<T, E>` closure is a decoder, so most callers
/// never implement this trait by hand:
///
/// ```
/// use sse_events::EventStream;
///
/// let input: &[u8] = b"data:42\n\n";
/// let mut stream = EventStream::new(input, |b: &[u8]| -> Result<u32, sse_events::BoxError> {
///     Ok(std::str::from_utf8(b)?.parse::<u32>()?)
/// });
/// assert!(stream.advance());
/// assert_eq!(stream.current().and_then(|e| e.data.as_ref()), Some(&42));
/// ```
pub trait Decode {
    type Output;
    type Error: Into<BoxError>;

    fn decode(&mut self, data: &[u8]) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Decode for F
where
    F: FnMut(&[u8]) -> Result<T, E>,
    E: Into<BoxError>,
{
    type Output = T;
    type Error = E;

    fn decode(&mut self, data: &[u8]) -> Result<T, E> {
        self(data)
    }
}

/// Yields the payload as an owned UTF-8 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Decode for Utf8 {
    type Output = String;
    type Error = std::string::FromUtf8Error;

    fn decode(&mut self, data: &[u8]) -> Result<String, Self::Error> {
        String::from_utf8(data.to_vec())
    }
}

/// Deserializes the payload as JSON into `T`.
#[cfg(feature = "json")]
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

#[cfg(feature = "json")]
impl<T> Json<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

#[cfg(feature = "json")]
impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Json")
    }
}

#[cfg(feature = "json")]
impl<T: serde::de::DeserializeOwned> Decode for Json<T> {
    type Output = T;
    type Error = serde_json::Error;

    fn decode(&mut self, data: &[u8]) -> Result<T, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
