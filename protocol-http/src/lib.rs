//! Sans-IO HTTP/1.1 client-side wire format.
//!
//! - **Responses**: [`ResponseParser`] consumes a response incrementally and
//!   reports status, headers and body spans through a [`Handler`], without
//!   copying body bytes.
//! - **Requests**: [`encode_line`], [`encode_header`] and
//!   [`encode_content_length`] write a request head into a caller-owned
//!   buffer.
//!
//! No sockets, clocks or allocation per message: the caller owns the bytes.
//!
//! # Example
//!
//! ```
//! use protocol_http::{Handler, ResponseParser, Span};
//!
//! #[derive(Default)]
//! struct Body(Vec<Span>);
//!
//! impl Handler for Body {
//!     fn on_body(&mut self, span: Span) {
//!         self.0.push(span);
//!     }
//! }
//!
//! let input = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc";
//! let mut parser = ResponseParser::new();
//! let mut body = Body::default();
//! let consumed = parser.execute(input, &mut body).unwrap();
//!
//! assert_eq!(consumed, input.len());
//! assert!(parser.is_complete());
//! assert_eq!(body.0[0].slice(input), b"abc");
//! ```

mod error;
mod parser;
mod request;

pub use error::ParseError;
pub use parser::{DEFAULT_MAX_LINE_LEN, Handler, ResponseParser, Span, Version};
pub use request::{
    CRLF, HEADER_SEPARATOR, encode_content_length, encode_header, encode_line, header_len,
    is_valid_name, is_valid_text,
};
