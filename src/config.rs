//! Options shared by column shredders and assemblers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default count of levels buffered per column before a flush or refill.
pub const DEFAULT_BUFFER_LENGTH: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOptions {
    /// Count of levels buffered per column between physical writes, and
    /// count of levels requested per physical read.
    pub buffer_length: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            buffer_length: DEFAULT_BUFFER_LENGTH,
        }
    }
}

impl StreamOptions {
    pub fn with_buffer_length(mut self, buffer_length: usize) -> Self {
        self.buffer_length = buffer_length;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_length == 0 {
            return Err(Error::invalid_arg(
                "buffer_length",
                "buffer length must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StreamOptions::default();
        assert_eq!(options.buffer_length, 4096);
        assert!(options.validate().is_ok());
        assert!(StreamOptions::default()
            .with_buffer_length(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: StreamOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, StreamOptions::default());

        let options: StreamOptions = serde_json::from_str(r#"{"buffer_length": 16}"#).unwrap();
        assert_eq!(options.buffer_length, 16);
    }
}
