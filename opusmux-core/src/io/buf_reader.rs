// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::errors::{truncated_error, Result};

/// A `BufReader` reads bytes from a byte buffer.
///
/// The reader is a plain cursor: a borrowed buffer and an index into it. It is cheap to copy, and
/// parsing can be restarted at any offset with [`BufReader::new_at`].
#[derive(Copy, Clone, Debug)]
pub struct BufReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufReader<'a> {
    /// Instantiate a new `BufReader` with a given byte buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        BufReader { buf, pos: 0 }
    }

    /// Instantiate a new `BufReader` positioned at `pos` within the given byte buffer.
    pub fn new_at(buf: &'a [u8], pos: usize) -> Self {
        BufReader { buf, pos: pos.min(buf.len()) }
    }

    /// Gets the underlying buffer.
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    /// Gets the current position of the cursor.
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Gets the number of bytes remaining after the cursor.
    #[inline(always)]
    pub fn bytes_available(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns true if the cursor reached the end of the buffer.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads a single byte.
    #[inline(always)]
    pub fn read_byte(&mut self) -> Result<u8> {
        if self.bytes_available() < 1 {
            return truncated_error();
        }

        self.pos += 1;
        Ok(self.buf[self.pos - 1])
    }

    /// Reads a big-endian unsigned 16-bit integer.
    pub fn read_be_u16(&mut self) -> Result<u16> {
        let bytes = self.read_buf_bytes_ref(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian signed 16-bit integer.
    pub fn read_be_i16(&mut self) -> Result<i16> {
        Ok(self.read_be_u16()? as i16)
    }

    /// Reads a little-endian unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_buf_bytes_ref(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_buf_bytes_ref(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a little-endian unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_buf_bytes_ref(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a big-endian unsigned integer of `len` (<= 8) bytes.
    pub fn read_be_uint(&mut self, len: usize) -> Result<u64> {
        debug_assert!(len <= 8);
        let bytes = self.read_buf_bytes_ref(len)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Returns a reference to the next `len` bytes in the buffer and advances the stream.
    pub fn read_buf_bytes_ref(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.bytes_available() {
            return truncated_error();
        }
        self.pos += len;
        Ok(&self.buf[self.pos - len..self.pos])
    }

    /// Returns a reference to the remaining bytes in the buffer and advances the stream to the end.
    pub fn read_buf_bytes_available_ref(&mut self) -> &'a [u8] {
        let pos = self.pos;
        self.pos = self.buf.len();
        &self.buf[pos..]
    }

    /// Advances the stream by `count` bytes.
    pub fn ignore_bytes(&mut self, count: usize) -> Result<()> {
        if count > self.bytes_available() {
            return truncated_error();
        }
        self.pos += count;
        Ok(())
    }
}
