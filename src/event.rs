use std::time::Duration;

/// A single decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T> {
    /// Value of the last `id:` field, empty if absent.
    pub id: String,
    /// Value of the last `event:` field, empty if absent.
    pub name: String,
    /// Decoded payload of the `data:` field.
    pub data: Option<T>,
    /// Last parsable `retry:` value in milliseconds, zero if absent.
    pub retry_millis: i64,
    pub(crate) empty: bool,
}

impl<T> Event<T> {
    pub(crate) fn blank() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            data: None,
            retry_millis: 0,
            empty: true,
        }
    }

    /// Returns `true` if no recognized field in the record carried a value.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Reconnection delay requested by the server, if positive.
    pub fn retry(&self) -> Option<Duration> {
        u64::try_from(self.retry_millis)
            .ok()
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}
