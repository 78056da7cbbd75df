//! One request/response exchange over a fixed [`MessageBuffer`].
//!
//! The request head is written into the headers region and the request body
//! into the body region. [`Message::send`] transmits both, then receives the
//! response into the body region, overwriting the request body, and feeds
//! every read to a [`ResponseParser`]. The response body is recorded as a
//! single `(offset, len)` span into that region.
//!
//! Chunked responses interleave framing with data. As each chunk is reported
//! its bytes are moved down to sit right after the previous one, so the
//! recorded span is always contiguous.

use std::io;

use protocol_http::{
    CRLF, Handler, ParseError, ResponseParser, Span, encode_content_length, encode_header,
    encode_line, is_valid_name, is_valid_text,
};

use crate::budget::Budget;
use crate::buffer::{MessageBuffer, Region, View};
use crate::error::Error;
use crate::metrics;
use crate::transport::Transport;

/// Parser events recorded for the current exchange.
#[derive(Debug, Default)]
struct Events {
    status: String,
    headers_complete: bool,
    complete: bool,
    spans: Vec<Span>,
}

impl Events {
    fn clear(&mut self) {
        self.status.clear();
        self.headers_complete = false;
        self.complete = false;
        self.spans.clear();
    }
}

impl Handler for Events {
    fn on_message_begin(&mut self) {
        // A final response replaces any interim one.
        self.status.clear();
        self.headers_complete = false;
    }

    fn on_status(&mut self, reason: &[u8]) {
        self.status.push_str(&String::from_utf8_lossy(reason));
    }

    fn on_headers_complete(&mut self) {
        self.headers_complete = true;
    }

    fn on_body(&mut self, span: Span) {
        self.spans.push(span);
    }

    fn on_message_complete(&mut self) {
        self.complete = true;
    }
}

/// The body region as seen by the caller.
#[derive(Debug)]
pub enum BodyView<'a> {
    /// Free space for the request body. Commit what was written with
    /// [`Message::advance_body`].
    Writable(&'a mut [u8]),
    /// The response body, once the response is complete. Empty when the
    /// response had none.
    Readable(&'a [u8]),
}

#[derive(Debug)]
pub struct Message {
    buffer: MessageBuffer,
    parser: ResponseParser,
    events: Events,
    body_offset: Option<usize>,
    body_len: usize,
}

impl Message {
    /// Allocate a message of `capacity` bytes with a `headers_capacity` byte
    /// headers region.
    pub fn new(capacity: usize, headers_capacity: usize) -> Result<Self, Error> {
        Ok(Self {
            buffer: MessageBuffer::new(capacity, headers_capacity)?,
            parser: ResponseParser::new(),
            events: Events::default(),
            body_offset: None,
            body_len: 0,
        })
    }

    // ── Request ──────────────────────────────────────────────────────

    /// Write the request line, e.g. `GET / HTTP/1.1`.
    ///
    /// Fails with [`Error::InvalidRequest`] on non-ASCII text or line breaks.
    pub fn write_message_start(&mut self, line: &str) -> Result<(), Error> {
        if !is_valid_text(line.as_bytes()) {
            return Err(Error::InvalidRequest("line"));
        }
        self.buffer
            .encode(Region::Headers, |dst| encode_line(dst, line.as_bytes()))?;
        if line.starts_with("HEAD ") {
            self.parser.set_head_response(true);
        }
        Ok(())
    }

    /// Write one `name: value` header. The name must be a token and the
    /// value ASCII without line breaks.
    pub fn write_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        if !is_valid_name(name.as_bytes()) {
            return Err(Error::InvalidRequest("header name"));
        }
        if !is_valid_text(value.as_bytes()) {
            return Err(Error::InvalidRequest("header value"));
        }
        self.buffer.encode(Region::Headers, |dst| {
            encode_header(dst, name.as_bytes(), value.as_bytes())
        })?;
        Ok(())
    }

    /// Write a `Content-Length` header for the request body written so far.
    pub fn write_content_length(&mut self) -> Result<(), Error> {
        let len = self.buffer.cursor(Region::Body);
        self.buffer
            .encode(Region::Headers, |dst| encode_content_length(dst, len))?;
        Ok(())
    }

    /// Append request body bytes, all or nothing.
    pub fn write_body(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.buffer.append(Region::Body, bytes)
    }

    /// A [`std::io::Write`] sink over the free part of the body region.
    pub fn body_writer(&mut self) -> BodyWriter<'_> {
        BodyWriter {
            buffer: &mut self.buffer,
        }
    }

    /// Commit `n` bytes written through [`BodyView::Writable`].
    pub fn advance_body(&mut self, n: usize) -> Result<(), Error> {
        self.buffer
            .encode(Region::Body, |free| (n <= free.len()).then_some(n))
            .map(|_| ())
    }

    /// Request body bytes written so far.
    pub fn body_len(&self) -> usize {
        self.buffer.cursor(Region::Body)
    }

    // ── Exchange ─────────────────────────────────────────────────────

    /// Transmit the request and receive the complete response.
    ///
    /// Every transport call is charged against `budget`. The buffer state
    /// after an error is unspecified until [`recycle`](Message::recycle).
    pub fn send<T: Transport>(&mut self, transport: &mut T, mut budget: Budget) -> Result<(), Error> {
        self.buffer.append(Region::Headers, CRLF)?;
        self.transmit(transport, Region::Headers, &mut budget)?;
        self.transmit(transport, Region::Body, &mut budget)?;
        self.receive(transport, &mut budget)
    }

    fn transmit<T: Transport>(
        &self,
        transport: &mut T,
        region: Region,
        budget: &mut Budget,
    ) -> Result<(), Error> {
        let bytes = self.buffer.slice(self.buffer.written(region));
        let mut sent = 0;
        while sent < bytes.len() {
            budget.check("send")?;
            let n = budget.measure(|b| transport.send(&bytes[sent..], b))?;
            sent += n;
            metrics::BYTES_SENT.add(n as u64);
        }
        Ok(())
    }

    fn receive<T: Transport>(&mut self, transport: &mut T, budget: &mut Budget) -> Result<(), Error> {
        let region = self.buffer.region(Region::Body);
        let mut received = 0;

        while !self.events.complete {
            if received == region.len {
                return self.receive_past_full(transport, budget, region.len);
            }
            budget.check("receive")?;

            let free = View::new(region.offset + received, region.len - received);
            let dst = self.buffer.slice_mut(free);
            let n = budget.measure(|b| transport.receive(dst, b))?;
            if n == 0 {
                self.parser.finish(&mut self.events)?;
                break;
            }
            metrics::BYTES_RECEIVED.add(n as u64);

            let chunk = View::new(free.offset, n);
            let consumed = self
                .parser
                .execute(self.buffer.slice(chunk), &mut self.events)?;
            if consumed != n {
                return Err(ParseError::TrailingData {
                    consumed,
                    supplied: n,
                }
                .into());
            }
            self.absorb_body(chunk.offset);
            received += n;
        }

        Ok(())
    }

    /// The body region is full but the response is not complete. A body
    /// delimited by connection close may still end right here, so look for
    /// EOF before giving up.
    fn receive_past_full<T: Transport>(
        &mut self,
        transport: &mut T,
        budget: &mut Budget,
        capacity: usize,
    ) -> Result<(), Error> {
        if self.parser.reads_until_close() {
            budget.check("receive")?;
            let mut scratch = [0u8; 1];
            if budget.measure(|b| transport.receive(&mut scratch, b))? == 0 {
                self.parser.finish(&mut self.events)?;
                return Ok(());
            }
        }
        Err(Error::ResponseTooLarge { capacity })
    }

    /// Fold the body spans reported for the read at `base` into the
    /// recorded span, moving non-adjacent data down.
    fn absorb_body(&mut self, base: usize) {
        for span in self.events.spans.drain(..) {
            let start = base + span.offset;
            match self.body_offset {
                None => {
                    self.body_offset = Some(start);
                    self.body_len = span.len;
                }
                Some(offset) => {
                    let end = offset + self.body_len;
                    if start != end {
                        self.buffer.move_down(View::new(start, span.len), end);
                    }
                    self.body_len += span.len;
                }
            }
        }
    }

    // ── Response ─────────────────────────────────────────────────────

    /// The reason phrase, once the response headers are complete.
    pub fn status(&self) -> Option<&str> {
        self.events
            .headers_complete
            .then_some(self.events.status.as_str())
    }

    pub fn status_code(&self) -> Option<u16> {
        self.parser.status_code()
    }

    pub fn is_complete(&self) -> bool {
        self.events.complete
    }

    /// Whether the connection may be reused after this response.
    pub fn should_keep_alive(&self) -> bool {
        self.parser.should_keep_alive()
    }

    /// The response body; empty before completion or when there was none.
    pub fn body(&self) -> &[u8] {
        match self.body_offset {
            Some(offset) if self.events.complete => {
                self.buffer.slice(View::new(offset, self.body_len))
            }
            _ => &[],
        }
    }

    pub fn body_view(&mut self) -> BodyView<'_> {
        if self.events.complete {
            return BodyView::Readable(self.body());
        }
        let free = self.buffer.free(Region::Body);
        BodyView::Writable(self.buffer.slice_mut(free))
    }

    /// Return to the freshly constructed state, keeping the allocation.
    pub fn recycle(&mut self) {
        self.events.clear();
        self.body_offset = None;
        self.body_len = 0;
        self.parser.reset();
        self.buffer.reset_cursors();
    }

    #[cfg(test)]
    pub(crate) fn cursors(&self) -> (usize, usize) {
        (
            self.buffer.cursor(Region::Headers),
            self.buffer.cursor(Region::Body),
        )
    }
}

/// Writes into the free part of a message's body region.
///
/// A write that finds the region full returns `Ok(0)`, so `write_all`
/// reports [`io::ErrorKind::WriteZero`].
pub struct BodyWriter<'a> {
    buffer: &'a mut MessageBuffer,
}

impl io::Write for BodyWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.buffer.free(Region::Body).len);
        self.buffer
            .append(Region::Body, &buf[..n])
            .map_err(io::Error::other)?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
