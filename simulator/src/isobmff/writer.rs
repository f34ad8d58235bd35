//! Box writer with length backpatching.
//!
//! Every box is opened with a zero length placeholder, its payload is written by a
//! closure, and the placeholder is then patched with the byte count actually
//! produced. Nested boxes therefore always declare `8 + payload` without any
//! hand-counted sizes.

use bytes::{BufMut, Bytes, BytesMut};

pub type FourCC = [u8; 4];

const HEADER_SIZE: usize = 8;

#[derive(Debug, Default)]
pub struct BoxWriter {
    buf: BytesMut,
}

impl BoxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Current write offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Writes a plain box and returns its total size.
    pub fn write_box<F>(&mut self, kind: &FourCC, body: F) -> usize
    where
        F: FnOnce(&mut Self),
    {
        let start = self.buf.len();
        self.buf.put_u32(0);
        self.buf.put_slice(kind);

        body(self);

        let size = self.buf.len() - start;
        debug_assert!(size >= HEADER_SIZE);
        let declared = u32::try_from(size).expect("box larger than 4 GiB");
        self.patch_u32(start, declared);
        size
    }

    /// Writes a full box (version + 24-bit flags header) and returns its total size.
    pub fn write_full_box<F>(&mut self, kind: &FourCC, version: u8, flags: u32, body: F) -> usize
    where
        F: FnOnce(&mut Self),
    {
        debug_assert!(flags <= 0x00ff_ffff, "full box flags are 24 bits");
        self.write_box(kind, |w| {
            w.put_u32((version as u32) << 24 | (flags & 0x00ff_ffff));
            body(w);
        })
    }

    /// Overwrites a previously written big-endian `u32` at `offset`.
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    pub fn put_zeros(&mut self, count: usize) {
        self.buf.put_bytes(0, count);
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
