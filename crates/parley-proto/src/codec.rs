//! Fixed-layout field readers and writers.
//!
//! Payload records are C-style packed layouts: every field occupies a
//! fixed number of bytes, integers are big-endian, and strings are
//! NUL-padded byte arrays read up to the first NUL. These two small
//! cursors keep the per-payload encode/decode functions free of offset
//! arithmetic.

use crate::{ProtoError, Result};

/// Appends fixed-width fields to a growing byte buffer.
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    /// Start a writer with the exact final size reserved.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Write `s` into a `cap`-byte field, NUL-padded.
    ///
    /// Oversized input is truncated at the last UTF-8 character boundary
    /// that fits, so a decoded field is always valid UTF-8.
    pub fn put_str(&mut self, s: &str, cap: usize) {
        let mut end = s.len().min(cap);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        self.buf.extend_from_slice(&s.as_bytes()[..end]);
        self.buf.resize(self.buf.len() + (cap - end), 0);
    }

    /// Consume the writer, yielding the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads fixed-width fields from a byte slice, tracking the offset.
pub struct FieldReader<'a> {
    kind: &'static str,
    buf: &'a [u8],
    off: usize,
}

impl<'a> FieldReader<'a> {
    /// Start a reader over `buf`, checking the exact expected length up
    /// front. `kind` names the payload in error messages.
    pub fn new(kind: &'static str, buf: &'a [u8], expected: usize) -> Result<Self> {
        if buf.len() != expected {
            return Err(ProtoError::BadLength {
                kind,
                expected,
                actual: buf.len(),
            });
        }
        Ok(Self { kind, buf, off: 0 })
    }

    /// Start a reader over one record of a concatenated array.
    pub fn over_slice(kind: &'static str, buf: &'a [u8]) -> Self {
        Self { kind, buf, off: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.off + n;
        if end > self.buf.len() {
            return Err(ProtoError::BadLength {
                kind: self.kind,
                expected: end,
                actual: self.buf.len(),
            });
        }
        let s = &self.buf[self.off..end];
        self.off = end;
        Ok(s)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(arr))
    }

    /// Read a `cap`-byte NUL-padded string field.
    ///
    /// Bytes after the first NUL are ignored; invalid UTF-8 is replaced
    /// rather than rejected, matching how C peers treat these fields.
    pub fn get_str(&mut self, cap: usize) -> Result<String> {
        let field = self.take(cap)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(cap);
        Ok(String::from_utf8_lossy(&field[..end]).into_owned())
    }
}
