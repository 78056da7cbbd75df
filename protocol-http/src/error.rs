//! Error types for HTTP/1.1 response parsing.

/// Error type for HTTP/1.1 parsing operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The status line is not `HTTP/x.y SP code [SP reason]`.
    #[error("invalid status line")]
    InvalidStatusLine,

    /// The protocol version is not HTTP/1.0 or HTTP/1.1.
    #[error("invalid http version")]
    InvalidVersion,

    /// The status code is not three ASCII digits.
    #[error("invalid status code")]
    InvalidStatusCode,

    /// A header line has no colon or an empty or malformed field name.
    #[error("invalid header")]
    InvalidHeader,

    /// `Content-Length` is not a decimal integer, or conflicting values were sent.
    #[error("invalid content length")]
    InvalidContentLength,

    /// A chunk-size line is not a hexadecimal integer.
    #[error("invalid chunk size")]
    InvalidChunkSize,

    /// A status, header, chunk-size or trailer line exceeded the line limit.
    #[error("line too long: exceeds {max} byte limit")]
    LineTooLong { max: usize },

    /// The peer closed the stream before the message was complete.
    #[error("stream ended at an unexpected time")]
    UnexpectedEof,

    /// The input held bytes past the end of the message.
    #[error("trailing data: consumed {consumed} of {supplied} bytes")]
    TrailingData { consumed: usize, supplied: usize },
}

impl ParseError {
    /// Returns true if the peer closed the stream mid-message.
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, ParseError::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_eof() {
        assert!(ParseError::UnexpectedEof.is_eof());
        assert!(!ParseError::InvalidStatusLine.is_eof());
        assert!(!ParseError::InvalidChunkSize.is_eof());
        assert!(!ParseError::LineTooLong { max: 8 }.is_eof());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", ParseError::UnexpectedEof),
            "stream ended at an unexpected time"
        );
        assert_eq!(
            format!("{}", ParseError::LineTooLong { max: 8192 }),
            "line too long: exceeds 8192 byte limit"
        );
        assert_eq!(
            format!(
                "{}",
                ParseError::TrailingData {
                    consumed: 10,
                    supplied: 12
                }
            ),
            "trailing data: consumed 10 of 12 bytes"
        );
        assert_eq!(
            format!("{}", ParseError::InvalidContentLength),
            "invalid content length"
        );
    }

    #[test]
    fn test_error_eq() {
        assert_eq!(ParseError::InvalidHeader, ParseError::InvalidHeader);
        assert_ne!(ParseError::InvalidHeader, ParseError::InvalidVersion);
        assert_ne!(
            ParseError::LineTooLong { max: 1 },
            ParseError::LineTooLong { max: 2 }
        );
    }
}
