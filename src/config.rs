/// Default number of bytes requested from the source per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Default upper bound on the size of a single record.
pub const DEFAULT_MAX_RECORD_LEN: usize = 64 * 1024;

/// How multiple `data:` lines within one record are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    /// Every `data:` line is decoded as it is seen and the last one wins.
    #[default]
    LastWins,
    /// All `data:` values are joined with `\n` and decoded once per record.
    Concatenate,
}

/// Tuning knobs for an [`EventStream`](crate::EventStream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Bytes requested from the source per read. Values below 1 are treated as 1.
    pub read_chunk_size: usize,
    /// Maximum record length before the stream fails. `None` disables the check.
    pub max_record_len: Option<usize>,
    pub data_mode: DataMode,
    /// Drop a single leading space from field values (`data: x` reads as `x`).
    pub strip_leading_space: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_record_len: Some(DEFAULT_MAX_RECORD_LEN),
            data_mode: DataMode::LastWins,
            strip_leading_space: false,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    pub fn with_max_record_len(mut self, limit: Option<usize>) -> Self {
        self.max_record_len = limit;
        self
    }

    pub fn with_data_mode(mut self, mode: DataMode) -> Self {
        self.data_mode = mode;
        self
    }

    pub fn with_strip_leading_space(mut self, strip: bool) -> Self {
        self.strip_leading_space = strip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
        assert_eq!(config.max_record_len, Some(DEFAULT_MAX_RECORD_LEN));
        assert_eq!(config.data_mode, DataMode::LastWins);
        assert!(!config.strip_leading_space);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let config = StreamConfig::new().with_read_chunk_size(0);
        assert_eq!(config.read_chunk_size, 1);
    }
}
