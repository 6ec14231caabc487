// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bitflags::bitflags;
use log::warn;

use opusmux_core::checksum::Crc32;
use opusmux_core::errors::{corrupt_error, Result};
use opusmux_core::io::BufReader;

const OGG_PAGE_MARKER: [u8; 4] = *b"OggS";
const OGG_PAGE_HEADER_SIZE: usize = 27;

/// The maximum number of lacing values in a page's segment table.
pub const OGG_PAGE_MAX_SEGMENTS: usize = 255;

pub const OGG_PAGE_MAX_SIZE: usize = OGG_PAGE_HEADER_SIZE + 255 + 255 * 255;

/// The granule position of a page on which no packet ends.
pub const NO_PACKET_GRANULE: u64 = u64::MAX;

bitflags! {
    /// The header type flags of a page.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct PageFlags: u8 {
        /// The first packet on the page continues a packet from the previous page.
        const CONTINUATION = 0x01;
        /// The first page of a logical stream (BOS).
        const FIRST_PAGE   = 0x02;
        /// The last page of a logical stream (EOS).
        const LAST_PAGE    = 0x04;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub version: u8,
    pub flags: PageFlags,
    /// Absolute granule position.
    pub absgp: u64,
    pub serial: u32,
    pub sequence: u32,
    pub crc: u32,
    pub n_segments: u8,
}

impl PageHeader {
    pub fn is_continuation(&self) -> bool {
        self.flags.contains(PageFlags::CONTINUATION)
    }

    pub fn is_first_page(&self) -> bool {
        self.flags.contains(PageFlags::FIRST_PAGE)
    }

    pub fn is_last_page(&self) -> bool {
        self.flags.contains(PageFlags::LAST_PAGE)
    }
}

/// Reads a `PageHeader` from the the provided reader.
fn read_page_header(reader: &mut BufReader<'_>) -> Result<PageHeader> {
    // The OggS marker should be present.
    let marker = reader.read_buf_bytes_ref(4)?;

    if marker != OGG_PAGE_MARKER {
        return corrupt_error("ogg: missing ogg stream marker");
    }

    let version = reader.read_byte()?;

    // There is only one OGG version, and that is version 0.
    if version != 0 {
        return corrupt_error("ogg: invalid ogg version");
    }

    let flags = reader.read_byte()?;

    // Only the first 3 least-significant bits are used for flags.
    let flags = match PageFlags::from_bits(flags) {
        Some(flags) => flags,
        None => return corrupt_error("ogg: invalid flag bits set"),
    };

    let absgp = reader.read_u64()?;
    let serial = reader.read_u32()?;
    let sequence = reader.read_u32()?;
    let crc = reader.read_u32()?;
    let n_segments = reader.read_byte()?;

    Ok(PageHeader { version, flags, absgp, serial, sequence, crc, n_segments })
}

/// An OGG page.
#[derive(Copy, Clone, Debug)]
pub struct Page<'a> {
    /// The page header.
    pub header: PageHeader,
    /// The lacing values of the page.
    pub segment_table: &'a [u8],
    /// The page payload.
    pub body: &'a [u8],
}

impl<'a> Page<'a> {
    /// Reads and verifies a page. A page cut short by the end of the buffer is
    /// [`opusmux_core::errors::Error::Truncated`].
    pub fn read(reader: &mut BufReader<'a>) -> Result<Page<'a>> {
        let start = reader.pos();

        let header = read_page_header(reader)?;
        let segment_table = reader.read_buf_bytes_ref(usize::from(header.n_segments))?;
        let body_len = segment_table.iter().map(|&lace| usize::from(lace)).sum();
        let body = reader.read_buf_bytes_ref(body_len)?;

        // The CRC of the OGG page requires the page checksum bytes to be zeroed.
        let mut crc32 = Crc32::new(0);
        let page = &reader.buf()[start..reader.pos()];
        crc32.process_buf_bytes(&page[..22]);
        crc32.process_buf_bytes(&[0u8; 4]);
        crc32.process_buf_bytes(&page[26..]);

        // If the CRC for the page is incorrect, then the page is corrupt.
        if header.crc != crc32.crc() {
            warn!("crc mismatch: expected {:#x}, got {:#x}", header.crc, crc32.crc());
            return corrupt_error("ogg: crc mismatch");
        }

        Ok(Page { header, segment_table, body })
    }

    /// Gets the total serialized size of the page.
    pub fn size(&self) -> usize {
        OGG_PAGE_HEADER_SIZE + self.segment_table.len() + self.body.len()
    }

    /// Gets the number of packets completed on this page.
    pub fn num_packets(&self) -> usize {
        self.segment_table.iter().filter(|&&lace| lace < 255).count()
    }

    /// Serializes the page into `buf`, computing its segment count and checksum.
    ///
    /// The `crc` and `n_segments` fields of the header are ignored.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        debug_assert!(self.segment_table.len() <= OGG_PAGE_MAX_SEGMENTS);
        debug_assert_eq!(
            self.body.len(),
            self.segment_table.iter().map(|&lace| usize::from(lace)).sum::<usize>()
        );

        let start = buf.len();

        buf.extend_from_slice(&OGG_PAGE_MARKER);
        buf.push(self.header.version);
        buf.push(self.header.flags.bits());
        buf.extend_from_slice(&self.header.absgp.to_le_bytes());
        buf.extend_from_slice(&self.header.serial.to_le_bytes());
        buf.extend_from_slice(&self.header.sequence.to_le_bytes());
        // Zeroed for the checksum, then patched.
        buf.extend_from_slice(&[0u8; 4]);
        buf.push(self.segment_table.len() as u8);
        buf.extend_from_slice(self.segment_table);
        buf.extend_from_slice(self.body);

        let crc = Crc32::checksum(&buf[start..]);
        buf[start + 22..start + 26].copy_from_slice(&crc.to_le_bytes());
    }
}
