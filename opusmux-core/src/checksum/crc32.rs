// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// The generator polynomial of the Ogg CRC, processed MSB first (not reflected).
const CRC32_POLY: u32 = 0x04c1_1db7;

const fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut j = 0;

        while j < 8 {
            r = if r & 0x8000_0000 != 0 { (r << 1) ^ CRC32_POLY } else { r << 1 };
            j += 1;
        }

        table[i] = r;
        i += 1;
    }

    table
}

static CRC32_TABLE: [u32; 256] = build_crc32_table();

/// `Crc32` implements the CRC-32 used by the Ogg container.
///
/// This is not the zlib/PKZIP CRC-32: the polynomial is applied MSB-first, there is no input or
/// output reflection, and there is no final XOR. Ogg initializes the state to 0.
#[derive(Copy, Clone, Debug)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    /// Instantiate a new `Crc32` with the given initial state.
    pub fn new(state: u32) -> Self {
        Crc32 { state }
    }

    /// Returns the computed CRC.
    pub fn crc(&self) -> u32 {
        self.state
    }

    /// Feeds a single byte into the CRC.
    #[inline(always)]
    pub fn process_byte(&mut self, byte: u8) {
        let index = ((self.state >> 24) as u8 ^ byte) as usize;
        self.state = (self.state << 8) ^ CRC32_TABLE[index];
    }

    /// Feeds a buffer of bytes into the CRC.
    pub fn process_buf_bytes(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.process_byte(byte);
        }
    }

    /// Computes the Ogg CRC of a buffer in one call.
    pub fn checksum(buf: &[u8]) -> u32 {
        let mut crc32 = Crc32::new(0);
        crc32.process_buf_bytes(buf);
        crc32.crc()
    }
}

#[cfg(test)]
mod tests {
    use super::Crc32;

    #[test]
    fn verify_crc32_check_value() {
        // The CRC-32/POSIX check value with the final XOR undone.
        assert_eq!(Crc32::checksum(b"123456789"), 0x89a1_897f);
    }

    #[test]
    fn verify_crc32_is_not_zlib() {
        // zlib's CRC-32 of the same input is 0xcbf43926.
        assert_ne!(Crc32::checksum(b"123456789"), 0xcbf4_3926);
    }

    #[test]
    fn verify_crc32_incremental() {
        let mut crc32 = Crc32::new(0);
        crc32.process_buf_bytes(b"1234");
        crc32.process_byte(b'5');
        crc32.process_buf_bytes(b"6789");

        assert_eq!(crc32.crc(), Crc32::checksum(b"123456789"));
        assert_eq!(Crc32::checksum(b"OggS"), 0x5fb0_a94f);
        assert_eq!(Crc32::checksum(&[]), 0);
    }
}
