//! Fixed-capacity message buffer split into a headers and a body region.
//!
//! ```text
//!  0                 H                                C
//!  ├── headers ──────┼── body / response ─────────────┤
//! ```
//!
//! The split is fixed at construction. Each region has a write cursor that
//! starts at the region's beginning and only moves forward until
//! [`reset_cursors`](MessageBuffer::reset_cursors).

use std::fmt;

use bytes::BufMut;

use crate::error::Error;

/// One of the two regions of a [`MessageBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Headers,
    Body,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Headers => f.write_str("headers"),
            Region::Body => f.write_str("body"),
        }
    }
}

/// A bounded window into a [`MessageBuffer`], by absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct View {
    pub offset: usize,
    pub len: usize,
}

impl View {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One owned allocation carved into a headers region `[0, H)` and a body
/// region `[H, C)`.
pub struct MessageBuffer {
    data: Box<[u8]>,
    headers_capacity: usize,
    headers_cursor: usize,
    body_cursor: usize,
}

impl fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("capacity", &self.data.len())
            .field("headers_capacity", &self.headers_capacity)
            .field("headers_cursor", &self.headers_cursor)
            .field("body_cursor", &self.body_cursor)
            .finish()
    }
}

impl MessageBuffer {
    /// Allocate `capacity` bytes, the first `headers_capacity` of which hold
    /// the request head.
    pub fn new(capacity: usize, headers_capacity: usize) -> Result<Self, Error> {
        if headers_capacity > capacity {
            return Err(Error::InvalidConfiguration(format!(
                "headers capacity {headers_capacity} exceeds buffer capacity {capacity}"
            )));
        }
        Ok(Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            headers_capacity,
            headers_cursor: 0,
            body_cursor: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Capacity of `region` in bytes.
    pub fn region_capacity(&self, region: Region) -> usize {
        match region {
            Region::Headers => self.headers_capacity,
            Region::Body => self.data.len() - self.headers_capacity,
        }
    }

    /// The whole of `region`, regardless of cursor.
    pub fn region(&self, region: Region) -> View {
        match region {
            Region::Headers => View::new(0, self.headers_capacity),
            Region::Body => View::new(self.headers_capacity, self.region_capacity(Region::Body)),
        }
    }

    /// Bytes written to `region` so far, relative to the region start.
    pub fn cursor(&self, region: Region) -> usize {
        match region {
            Region::Headers => self.headers_cursor,
            Region::Body => self.body_cursor,
        }
    }

    /// The written prefix of `region`.
    pub fn written(&self, region: Region) -> View {
        View::new(self.region(region).offset, self.cursor(region))
    }

    /// The unwritten suffix of `region`.
    pub fn free(&self, region: Region) -> View {
        let full = self.region(region);
        let cursor = self.cursor(region);
        View::new(full.offset + cursor, full.len - cursor)
    }

    pub fn slice(&self, view: View) -> &[u8] {
        &self.data[view.offset..view.end()]
    }

    pub fn slice_mut(&mut self, view: View) -> &mut [u8] {
        &mut self.data[view.offset..view.end()]
    }

    /// Append `bytes` to `region`, all or nothing.
    pub fn append(&mut self, region: Region, bytes: &[u8]) -> Result<(), Error> {
        let capacity = self.region_capacity(region);
        let free = self.free(region);
        let mut dst = self.slice_mut(free);
        if dst.remaining_mut() < bytes.len() {
            return Err(Error::BufferOverflow { region, capacity });
        }
        dst.put_slice(bytes);
        self.advance(region, bytes.len());
        Ok(())
    }

    /// Let `encode` write into the free part of `region`. It returns the
    /// byte count, or `None` when it did not fit and wrote nothing.
    pub fn encode(
        &mut self,
        region: Region,
        encode: impl FnOnce(&mut [u8]) -> Option<usize>,
    ) -> Result<usize, Error> {
        let capacity = self.region_capacity(region);
        let free = self.free(region);
        match encode(self.slice_mut(free)) {
            Some(n) => {
                self.advance(region, n);
                Ok(n)
            }
            None => Err(Error::BufferOverflow { region, capacity }),
        }
    }

    /// Move the bytes of `src` down to `dest`. `dest` must not exceed
    /// `src.offset`.
    pub fn move_down(&mut self, src: View, dest: usize) {
        debug_assert!(dest <= src.offset);
        self.data.copy_within(src.offset..src.end(), dest);
    }

    pub fn reset_cursors(&mut self) {
        self.headers_cursor = 0;
        self.body_cursor = 0;
    }

    fn advance(&mut self, region: Region, n: usize) {
        match region {
            Region::Headers => self.headers_cursor += n,
            Region::Body => self.body_cursor += n,
        }
    }
}
