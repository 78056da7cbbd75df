//! Incremental HTTP/1.1 response parser.
//!
//! [`ResponseParser`] is a push parser: feed it successive slices of one
//! response with [`execute`](ResponseParser::execute) and it reports what it
//! recognised through a [`Handler`]. Slices may be split anywhere, down to a
//! single byte. Body bytes are never copied; each body event carries a
//! [`Span`] into the slice that was passed to `execute`.
//!
//! Status and header lines are accumulated in scratch storage owned by the
//! parser, bounded by [`DEFAULT_MAX_LINE_LEN`] (configurable with
//! [`with_max_line_len`](ResponseParser::with_max_line_len)). The scratch
//! vectors keep their capacity across [`reset`](ResponseParser::reset).

use crate::error::ParseError;

/// Default limit for a single status, header, chunk-size or trailer line.
pub const DEFAULT_MAX_LINE_LEN: usize = 8192;

/// A bounded window into the slice passed to [`ResponseParser::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    /// Returns the bytes of `input` covered by this span.
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.offset..self.offset + self.len]
    }
}

/// Callbacks for parser events, delivered in order:
/// message begin, status, headers, headers complete, body spans, message
/// complete. Every method defaults to a no-op.
///
/// An interim `1xx` response (other than `101`) ends after its headers
/// without `on_headers_complete`; the final response follows with a fresh
/// `on_message_begin`.
pub trait Handler {
    fn on_message_begin(&mut self) {}

    /// The reason phrase of the status line, without the leading space.
    fn on_status(&mut self, _reason: &[u8]) {}

    /// One header field. Leading and trailing whitespace is stripped from
    /// the value.
    fn on_header(&mut self, _name: &[u8], _value: &[u8]) {}

    fn on_headers_complete(&mut self) {}

    /// A run of body bytes, relative to the current `execute` input.
    fn on_body(&mut self, _span: Span) {}

    fn on_message_complete(&mut self) {}
}

/// HTTP protocol version of a parsed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    StatusLine,
    HeaderField,
    HeaderValue,
    Body { remaining: u64 },
    BodyUntilClose,
    ChunkSize,
    ChunkExtension,
    ChunkData { remaining: u64 },
    ChunkDataEnd { cr: bool },
    Trailer,
    Done,
}

/// Push parser for one HTTP/1.1 response at a time.
#[derive(Debug)]
pub struct ResponseParser {
    state: State,
    max_line_len: usize,
    line: Vec<u8>,
    name: Vec<u8>,
    value: Vec<u8>,

    version: Option<Version>,
    status_code: Option<u16>,
    content_length: Option<u64>,
    chunked: bool,
    connection_close: bool,
    connection_keep_alive: bool,
    until_close: bool,
    head_response: bool,

    chunk_size: u64,
    chunk_digits: usize,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a parser that rejects any single line longer than `max`.
    pub fn with_max_line_len(max: usize) -> Self {
        Self {
            state: State::Start,
            max_line_len: max,
            line: Vec::new(),
            name: Vec::new(),
            value: Vec::new(),
            version: None,
            status_code: None,
            content_length: None,
            chunked: false,
            connection_close: false,
            connection_keep_alive: false,
            until_close: false,
            head_response: false,
            chunk_size: 0,
            chunk_digits: 0,
        }
    }

    /// Forget the current message. Scratch storage keeps its capacity.
    pub fn reset(&mut self) {
        self.state = State::Start;
        self.line.clear();
        self.name.clear();
        self.value.clear();
        self.version = None;
        self.status_code = None;
        self.content_length = None;
        self.chunked = false;
        self.connection_close = false;
        self.connection_keep_alive = false;
        self.until_close = false;
        self.head_response = false;
        self.chunk_size = 0;
        self.chunk_digits = 0;
    }

    /// Mark the pending response as the answer to a `HEAD` request, which
    /// never carries a body whatever its headers announce.
    pub fn set_head_response(&mut self, head: bool) {
        self.head_response = head;
    }

    /// Feed the next slice of the response.
    ///
    /// Returns the number of bytes consumed. This is `input.len()` unless the
    /// message completed inside `input`, in which case parsing stops right
    /// after the last byte of the message.
    pub fn execute<H: Handler>(
        &mut self,
        input: &[u8],
        handler: &mut H,
    ) -> Result<usize, ParseError> {
        let mut pos = 0;

        while pos < input.len() {
            match self.state {
                State::Done => break,
                State::Start => {
                    // Stray CRLF before a status line is tolerated.
                    if matches!(input[pos], b'\r' | b'\n') {
                        pos += 1;
                        continue;
                    }
                    handler.on_message_begin();
                    self.state = State::StatusLine;
                }
                State::StatusLine => {
                    let rest = &input[pos..];
                    match find(rest, b'\n') {
                        Some(i) => {
                            self.push_line(&rest[..i])?;
                            pos += i + 1;
                            let line = std::mem::take(&mut self.line);
                            let result = self.parse_status_line(trim_cr(&line), handler);
                            self.line = line;
                            self.line.clear();
                            result?;
                            self.state = State::HeaderField;
                        }
                        None => {
                            self.push_line(rest)?;
                            pos = input.len();
                        }
                    }
                }
                State::HeaderField => {
                    let rest = &input[pos..];
                    match rest.iter().position(|&b| b == b':' || b == b'\n') {
                        Some(i) if rest[i] == b':' => {
                            self.push_name(&rest[..i])?;
                            pos += i + 1;
                            self.state = State::HeaderValue;
                        }
                        Some(i) => {
                            self.push_name(&rest[..i])?;
                            pos += i + 1;
                            if !trim_cr(&self.name).is_empty() {
                                return Err(ParseError::InvalidHeader);
                            }
                            self.name.clear();
                            self.end_of_headers(handler);
                        }
                        None => {
                            self.push_name(rest)?;
                            pos = input.len();
                        }
                    }
                }
                State::HeaderValue => {
                    let rest = &input[pos..];
                    match find(rest, b'\n') {
                        Some(i) => {
                            self.push_value(&rest[..i])?;
                            pos += i + 1;
                            let name = std::mem::take(&mut self.name);
                            let value = std::mem::take(&mut self.value);
                            let result = self.apply_header(&name, trim_ows(trim_cr(&value)), handler);
                            self.name = name;
                            self.value = value;
                            self.name.clear();
                            self.value.clear();
                            result?;
                            self.state = State::HeaderField;
                        }
                        None => {
                            self.push_value(rest)?;
                            pos = input.len();
                        }
                    }
                }
                State::Body { remaining } => {
                    let n = remaining.min((input.len() - pos) as u64) as usize;
                    handler.on_body(Span { offset: pos, len: n });
                    pos += n;
                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        self.complete(handler);
                    } else {
                        self.state = State::Body { remaining };
                    }
                }
                State::BodyUntilClose => {
                    handler.on_body(Span {
                        offset: pos,
                        len: input.len() - pos,
                    });
                    pos = input.len();
                }
                State::ChunkSize => {
                    let b = input[pos];
                    pos += 1;
                    if let Some(digit) = hex_value(b) {
                        self.chunk_size = self
                            .chunk_size
                            .checked_mul(16)
                            .and_then(|v| v.checked_add(u64::from(digit)))
                            .ok_or(ParseError::InvalidChunkSize)?;
                        self.chunk_digits += 1;
                    } else {
                        match b {
                            b'\n' => self.end_of_chunk_size()?,
                            b'\r' | b';' | b' ' | b'\t' if self.chunk_digits > 0 => {
                                self.state = State::ChunkExtension;
                            }
                            _ => return Err(ParseError::InvalidChunkSize),
                        }
                    }
                }
                State::ChunkExtension => {
                    // Extensions are skipped, but still count against the line limit.
                    let rest = &input[pos..];
                    match find(rest, b'\n') {
                        Some(i) => {
                            self.push_line(&rest[..i])?;
                            pos += i + 1;
                            self.line.clear();
                            self.end_of_chunk_size()?;
                        }
                        None => {
                            self.push_line(rest)?;
                            pos = input.len();
                        }
                    }
                }
                State::ChunkData { remaining } => {
                    let n = remaining.min((input.len() - pos) as u64) as usize;
                    handler.on_body(Span { offset: pos, len: n });
                    pos += n;
                    let remaining = remaining - n as u64;
                    self.state = if remaining == 0 {
                        State::ChunkDataEnd { cr: false }
                    } else {
                        State::ChunkData { remaining }
                    };
                }
                State::ChunkDataEnd { cr } => {
                    match input[pos] {
                        b'\r' if !cr => self.state = State::ChunkDataEnd { cr: true },
                        b'\n' => {
                            self.chunk_size = 0;
                            self.chunk_digits = 0;
                            self.state = State::ChunkSize;
                        }
                        _ => return Err(ParseError::InvalidChunkSize),
                    }
                    pos += 1;
                }
                State::Trailer => {
                    let rest = &input[pos..];
                    match find(rest, b'\n') {
                        Some(i) => {
                            self.push_line(&rest[..i])?;
                            pos += i + 1;
                            let empty = trim_cr(&self.line).is_empty();
                            self.line.clear();
                            if empty {
                                self.complete(handler);
                            }
                        }
                        None => {
                            self.push_line(rest)?;
                            pos = input.len();
                        }
                    }
                }
            }
        }

        Ok(pos)
    }

    /// Signal that the peer closed the stream.
    ///
    /// Completes a body delimited by connection close. Fails with
    /// [`ParseError::UnexpectedEof`] if any other message is still in progress.
    pub fn finish<H: Handler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        match self.state {
            State::Done => Ok(()),
            State::BodyUntilClose => {
                self.complete(handler);
                Ok(())
            }
            _ => Err(ParseError::UnexpectedEof),
        }
    }

    /// Whether the connection may carry another exchange once this response
    /// completes.
    ///
    /// HTTP/1.1 keeps the connection unless `Connection: close` was sent.
    /// HTTP/1.0 closes unless `Connection: keep-alive` was sent. A body
    /// delimited by connection close always ends the connection.
    pub fn should_keep_alive(&self) -> bool {
        if self.until_close || self.connection_close {
            return false;
        }
        match self.version {
            Some(Version::Http11) => true,
            Some(Version::Http10) => self.connection_keep_alive,
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Whether the body in progress ends only when the peer closes.
    pub fn reads_until_close(&self) -> bool {
        self.state == State::BodyUntilClose
    }

    // ── Line handling ────────────────────────────────────────────────

    fn push_line(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        if self.line.len() + bytes.len() > self.max_line_len {
            return Err(ParseError::LineTooLong {
                max: self.max_line_len,
            });
        }
        self.line.extend_from_slice(bytes);
        Ok(())
    }

    fn push_name(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        if self.name.len() + bytes.len() > self.max_line_len {
            return Err(ParseError::LineTooLong {
                max: self.max_line_len,
            });
        }
        self.name.extend_from_slice(bytes);
        Ok(())
    }

    fn push_value(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        if self.name.len() + self.value.len() + bytes.len() > self.max_line_len {
            return Err(ParseError::LineTooLong {
                max: self.max_line_len,
            });
        }
        self.value.extend_from_slice(bytes);
        Ok(())
    }

    fn parse_status_line<H: Handler>(
        &mut self,
        line: &[u8],
        handler: &mut H,
    ) -> Result<(), ParseError> {
        // HTTP/1.1 200[ reason]
        if line.len() < 12 || !line.starts_with(b"HTTP/") {
            return Err(ParseError::InvalidStatusLine);
        }
        self.version = Some(match &line[5..8] {
            b"1.1" => Version::Http11,
            b"1.0" => Version::Http10,
            _ => return Err(ParseError::InvalidVersion),
        });
        if line[8] != b' ' {
            return Err(ParseError::InvalidStatusLine);
        }

        let digits = &line[9..12];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(ParseError::InvalidStatusCode);
        }
        let code = digits
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        if code < 100 {
            return Err(ParseError::InvalidStatusCode);
        }
        self.status_code = Some(code);

        let reason = match &line[12..] {
            [] => &[][..],
            [b' ', reason @ ..] => reason,
            _ => return Err(ParseError::InvalidStatusCode),
        };
        handler.on_status(reason);
        Ok(())
    }

    fn apply_header<H: Handler>(
        &mut self,
        name: &[u8],
        value: &[u8],
        handler: &mut H,
    ) -> Result<(), ParseError> {
        if name.is_empty() || !name.iter().all(|&b| is_token(b)) {
            return Err(ParseError::InvalidHeader);
        }

        if name.eq_ignore_ascii_case(b"content-length") {
            let len = parse_decimal(value).ok_or(ParseError::InvalidContentLength)?;
            match self.content_length {
                Some(existing) if existing != len => {
                    return Err(ParseError::InvalidContentLength);
                }
                _ => self.content_length = Some(len),
            }
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            // Only the final coding decides the framing.
            self.chunked = value
                .rsplit(|&b| b == b',')
                .next()
                .map(trim_ows)
                .is_some_and(|coding| coding.eq_ignore_ascii_case(b"chunked"));
        } else if name.eq_ignore_ascii_case(b"connection") {
            for token in value.split(|&b| b == b',').map(trim_ows) {
                if token.eq_ignore_ascii_case(b"close") {
                    self.connection_close = true;
                } else if token.eq_ignore_ascii_case(b"keep-alive") {
                    self.connection_keep_alive = true;
                }
            }
        }

        handler.on_header(name, value);
        Ok(())
    }

    fn end_of_headers<H: Handler>(&mut self, handler: &mut H) {
        if matches!(self.status_code, Some(100 | 102..=199)) {
            // Interim response: the final one follows on the same stream.
            let head = self.head_response;
            self.reset();
            self.head_response = head;
            return;
        }
        handler.on_headers_complete();

        let bodiless =
            self.head_response || matches!(self.status_code, Some(101 | 204 | 304));
        if bodiless {
            self.complete(handler);
        } else if self.chunked {
            self.chunk_size = 0;
            self.chunk_digits = 0;
            self.state = State::ChunkSize;
        } else {
            match self.content_length {
                Some(0) => self.complete(handler),
                Some(len) => self.state = State::Body { remaining: len },
                None => {
                    self.until_close = true;
                    self.state = State::BodyUntilClose;
                }
            }
        }
    }

    fn end_of_chunk_size(&mut self) -> Result<(), ParseError> {
        if self.chunk_digits == 0 {
            return Err(ParseError::InvalidChunkSize);
        }
        self.state = if self.chunk_size == 0 {
            State::Trailer
        } else {
            State::ChunkData {
                remaining: self.chunk_size,
            }
        };
        self.chunk_size = 0;
        self.chunk_digits = 0;
        Ok(())
    }

    fn complete<H: Handler>(&mut self, handler: &mut H) {
        self.state = State::Done;
        handler.on_message_complete();
    }
}

#[inline]
fn find(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn parse_decimal(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

pub(crate) fn is_token(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Begin,
        Status(Vec<u8>),
        Header(Vec<u8>, Vec<u8>),
        HeadersComplete,
        Body(usize),
        Complete,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        spans: Vec<Span>,
    }

    impl Handler for Recorder {
        fn on_message_begin(&mut self) {
            self.events.push(Event::Begin);
        }
        fn on_status(&mut self, reason: &[u8]) {
            self.events.push(Event::Status(reason.to_vec()));
        }
        fn on_header(&mut self, name: &[u8], value: &[u8]) {
            self.events
                .push(Event::Header(name.to_vec(), value.to_vec()));
        }
        fn on_headers_complete(&mut self) {
            self.events.push(Event::HeadersComplete);
        }
        fn on_body(&mut self, span: Span) {
            self.events.push(Event::Body(span.len));
            self.spans.push(span);
        }
        fn on_message_complete(&mut self) {
            self.events.push(Event::Complete);
        }
    }

    /// Feed `input` in `step`-sized slices, collecting body bytes.
    fn feed(
        parser: &mut ResponseParser,
        input: &[u8],
        step: usize,
    ) -> Result<(Recorder, Vec<u8>, usize), ParseError> {
        let mut rec = Recorder::default();
        let mut body = Vec::new();
        let mut consumed = 0;
        for chunk in input.chunks(step) {
            let n = parser.execute(chunk, &mut rec)?;
            for span in rec.spans.drain(..) {
                body.extend_from_slice(span.slice(chunk));
            }
            consumed += n;
            if n < chunk.len() {
                break;
            }
        }
        Ok((rec, body, consumed))
    }

    fn headers_of(rec: &Recorder) -> Vec<(Vec<u8>, Vec<u8>)> {
        rec.events
            .iter()
            .filter_map(|e| match e {
                Event::Header(n, v) => Some((n.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn content_length_event_order() {
        let mut parser = ResponseParser::new();
        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc";
        let mut rec = Recorder::default();
        let n = parser.execute(input, &mut rec).unwrap();

        assert_eq!(n, input.len());
        assert_eq!(
            rec.events,
            vec![
                Event::Begin,
                Event::Status(b"OK".to_vec()),
                Event::Header(b"Content-Length".to_vec(), b"3".to_vec()),
                Event::HeadersComplete,
                Event::Body(3),
                Event::Complete,
            ]
        );
        assert_eq!(rec.spans[0].slice(input), b"abc");
        assert!(parser.is_complete());
        assert!(parser.should_keep_alive());
        assert_eq!(parser.status_code(), Some(200));
        assert_eq!(parser.version(), Some(Version::Http11));
        assert_eq!(parser.content_length(), Some(3));
    }

    #[test]
    fn single_byte_slices() {
        let mut parser = ResponseParser::new();
        let input = b"HTTP/1.1 404 Not Found\r\nServer: test\r\nContent-Length: 5\r\n\r\nhello";
        let (rec, body, consumed) = feed(&mut parser, input, 1).unwrap();

        assert_eq!(consumed, input.len());
        assert_eq!(body, b"hello");
        assert_eq!(rec.events[1], Event::Status(b"Not Found".to_vec()));
        assert_eq!(
            headers_of(&rec),
            vec![
                (b"Server".to_vec(), b"test".to_vec()),
                (b"Content-Length".to_vec(), b"5".to_vec()),
            ]
        );
        assert_eq!(rec.events.last(), Some(&Event::Complete));
        assert_eq!(parser.status_code(), Some(404));
    }

    #[test]
    fn chunked_body() {
        let input = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                      5\r\nhello\r\n7;ext=1\r\n, world\r\n0\r\nX-Trailer: yes\r\n\r\n";
        for step in [1, 3, 4, input.len()] {
            let mut parser = ResponseParser::new();
            let (rec, body, consumed) = feed(&mut parser, input, step).unwrap();
            assert_eq!(consumed, input.len(), "step {step}");
            assert_eq!(body, b"hello, world", "step {step}");
            assert!(parser.is_chunked());
            assert!(parser.is_complete());
            assert_eq!(rec.events.last(), Some(&Event::Complete));
        }
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let mut parser = ResponseParser::new();
        let input =
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nTransfer-Encoding: gzip, chunked\r\n\r\n2\r\nok\r\n0\r\n\r\n";
        let (_, body, _) = feed(&mut parser, input, input.len()).unwrap();
        assert_eq!(body, b"ok");
        assert!(parser.is_complete());
    }

    #[test]
    fn stops_at_end_of_message() {
        let mut parser = ResponseParser::new();
        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nokHTTP/1.1";
        let mut rec = Recorder::default();
        let n = parser.execute(input, &mut rec).unwrap();
        assert_eq!(n, input.len() - 8);
        assert_eq!(parser.execute(b"more", &mut rec).unwrap(), 0);
    }

    #[test]
    fn bodiless_statuses() {
        for status in ["204 No Content", "304 Not Modified", "101 Switching Protocols"] {
            let mut parser = ResponseParser::new();
            let input = format!("HTTP/1.1 {status}\r\nContent-Length: 10\r\n\r\n");
            let mut rec = Recorder::default();
            let n = parser.execute(input.as_bytes(), &mut rec).unwrap();
            assert_eq!(n, input.len());
            assert!(parser.is_complete(), "{status}");
            assert!(rec.spans.is_empty());
        }
    }

    #[test]
    fn interim_responses_are_skipped() {
        let input = b"HTTP/1.1 100 Continue\r\n\r\n\
                      HTTP/1.1 103 Early Hints\r\nLink: </a.css>\r\n\r\n\
                      HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nfinal";
        for step in [1, 4, 7, input.len()] {
            let mut parser = ResponseParser::new();
            let (rec, body, consumed) = feed(&mut parser, input, step).unwrap();
            assert_eq!(consumed, input.len(), "step {step}");
            assert_eq!(body, b"final", "step {step}");
            assert!(parser.is_complete());
            assert_eq!(parser.status_code(), Some(200));

            let begins = rec.events.iter().filter(|e| **e == Event::Begin).count();
            assert_eq!(begins, 3, "step {step}");
            let completes: Vec<_> = rec
                .events
                .iter()
                .filter(|e| matches!(e, Event::HeadersComplete | Event::Complete))
                .collect();
            assert_eq!(completes, [&Event::HeadersComplete, &Event::Complete]);
            assert_eq!(rec.events.last(), Some(&Event::Complete));
        }
    }

    #[test]
    fn interim_response_keeps_head_flag() {
        let mut parser = ResponseParser::new();
        parser.set_head_response(true);
        let input = b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\n";
        let n = parser.execute(input, &mut Recorder::default()).unwrap();
        assert_eq!(n, input.len());
        assert!(parser.is_complete());
    }

    #[test]
    fn reads_until_close_only_while_open() {
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        parser.execute(b"HTTP/1.1 200 OK\r\n", &mut rec).unwrap();
        assert!(!parser.reads_until_close());
        parser.execute(b"\r\nab", &mut rec).unwrap();
        assert!(parser.reads_until_close());
        parser.finish(&mut rec).unwrap();
        assert!(!parser.reads_until_close());
    }

    #[test]
    fn head_response_has_no_body() {
        let mut parser = ResponseParser::new();
        parser.set_head_response(true);
        let mut rec = Recorder::default();
        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 42\r\n\r\n";
        parser.execute(input, &mut rec).unwrap();
        assert!(parser.is_complete());

        parser.reset();
        let mut rec = Recorder::default();
        parser.execute(input, &mut rec).unwrap();
        assert!(!parser.is_complete());
    }

    #[test]
    fn keep_alive_rules() {
        let cases: &[(&[u8], bool)] = &[
            (b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n", true),
            (
                b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
                false,
            ),
            (
                b"HTTP/1.1 200 OK\r\nConnection: Upgrade, Close\r\nContent-Length: 0\r\n\r\n",
                false,
            ),
            (b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n", false),
            (
                b"HTTP/1.0 200 OK\r\nConnection: keep-alive\r\nContent-Length: 0\r\n\r\n",
                true,
            ),
        ];
        for (input, expected) in cases {
            let mut parser = ResponseParser::new();
            parser.execute(input, &mut Recorder::default()).unwrap();
            assert!(parser.is_complete());
            assert_eq!(
                parser.should_keep_alive(),
                *expected,
                "{}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn body_until_close() {
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        let input = b"HTTP/1.1 200 OK\r\n\r\nstreamed";
        assert_eq!(parser.execute(input, &mut rec).unwrap(), input.len());
        assert!(!parser.is_complete());
        assert!(!parser.should_keep_alive());

        parser.finish(&mut rec).unwrap();
        assert!(parser.is_complete());
        assert_eq!(rec.events.last(), Some(&Event::Complete));
    }

    #[test]
    fn eof_mid_message() {
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        parser
            .execute(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc", &mut rec)
            .unwrap();
        assert_eq!(parser.finish(&mut rec), Err(ParseError::UnexpectedEof));

        let mut parser = ResponseParser::new();
        assert_eq!(parser.finish(&mut rec), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn invalid_input() {
        let cases: &[(&[u8], ParseError)] = &[
            (b"HTTX/1.1 200 OK\r\n", ParseError::InvalidStatusLine),
            (b"HTTP/2.0 200 OK\r\n", ParseError::InvalidVersion),
            (b"HTTP/1.1 2x0 OK\r\n", ParseError::InvalidStatusCode),
            (b"HTTP/1.1 200OK\r\n", ParseError::InvalidStatusCode),
            (b"HTTP/1.1 200 OK\r\nno colon\r\n", ParseError::InvalidHeader),
            (b"HTTP/1.1 200 OK\r\nbad name: x\r\n", ParseError::InvalidHeader),
            (
                b"HTTP/1.1 200 OK\r\nContent-Length: 1x\r\n",
                ParseError::InvalidContentLength,
            ),
            (
                b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\nContent-Length: 2\r\n",
                ParseError::InvalidContentLength,
            ),
            (
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
                ParseError::InvalidChunkSize,
            ),
            (
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nokX",
                ParseError::InvalidChunkSize,
            ),
            (
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nok\r\r\n",
                ParseError::InvalidChunkSize,
            ),
        ];
        for (input, expected) in cases {
            let mut parser = ResponseParser::new();
            let result = parser.execute(input, &mut Recorder::default());
            assert_eq!(
                result,
                Err(expected.clone()),
                "{}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn line_limit() {
        let mut parser = ResponseParser::with_max_line_len(32);
        let mut input = b"HTTP/1.1 200 OK\r\nX-Long: ".to_vec();
        input.extend(std::iter::repeat_n(b'a', 64));
        let result = feed(&mut parser, &input, 5).map(|_| ());
        assert_eq!(result, Err(ParseError::LineTooLong { max: 32 }));
    }

    #[test]
    fn reset_between_messages() {
        let mut parser = ResponseParser::new();
        let first = b"HTTP/1.0 500 Oops\r\nContent-Length: 1\r\n\r\nx";
        parser.execute(first, &mut Recorder::default()).unwrap();
        assert!(parser.is_complete());
        assert_eq!(parser.status_code(), Some(500));

        parser.reset();
        assert!(!parser.is_complete());
        assert_eq!(parser.status_code(), None);

        let second = b"\r\nHTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let mut rec = Recorder::default();
        parser.execute(second, &mut rec).unwrap();
        assert!(parser.is_complete());
        assert!(parser.should_keep_alive());
        assert_eq!(rec.events.first(), Some(&Event::Begin));
    }
}
