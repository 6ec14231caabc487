// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;
use smallvec::SmallVec;

use opusmux_core::errors::{packet_too_large_error, Result};
use opusmux_core::options::{RemuxOptions, DEFAULT_MAX_PACKET_SIZE, DEFAULT_TARGET_PAGE_SIZE};

use crate::page::{Page, PageFlags, PageHeader, NO_PACKET_GRANULE, OGG_PAGE_MAX_SEGMENTS};

/// Options for an [`OggWriter`].
#[derive(Copy, Clone, Debug)]
pub struct WriterOptions {
    /// The serial number of the logical stream.
    pub serial: u32,
    /// A page is flushed before a packet that would grow its payload past this size.
    pub target_page_size: usize,
    /// Data packets larger than this are rejected.
    pub max_packet_size: usize,
}

impl WriterOptions {
    pub fn new(serial: u32) -> Self {
        WriterOptions {
            serial,
            target_page_size: DEFAULT_TARGET_PAGE_SIZE,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    /// Takes the page tuning values from `options`. The serial is resolved by the caller.
    pub fn from_remux_options(options: &RemuxOptions, serial: u32) -> Self {
        WriterOptions {
            serial,
            target_page_size: options.target_page_size,
            max_packet_size: options.max_packet_size,
        }
    }
}

/// Inline capacity of the segment table. Must be a size smallvec implements `Array` for.
const SEGMENT_TABLE_CAPACITY: usize = 256;

/// The page currently being filled.
#[derive(Default)]
struct PendingPage {
    /// The page starts with the rest of a packet from the previous page.
    continued: bool,
    /// The end granule of the last packet completed on this page.
    granule: Option<u64>,
    segments: SmallVec<[u8; SEGMENT_TABLE_CAPACITY]>,
    payload: Vec<u8>,
}

impl PendingPage {
    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Packs packets of one logical stream into Ogg pages.
pub struct OggWriter {
    options: WriterOptions,
    sequence: u32,
    /// Pages that have no completed packet get this granule.
    incomplete_granule: u64,
    page: PendingPage,
    buf: Vec<u8>,
}

impl OggWriter {
    pub fn new(options: WriterOptions) -> Self {
        OggWriter {
            options,
            sequence: 0,
            incomplete_granule: NO_PACKET_GRANULE,
            page: Default::default(),
            buf: Vec::new(),
        }
    }

    /// Writes a header packet so that it begins and ends its own page(s), all with granule
    /// position 0.
    pub fn write_header_packet(&mut self, packet: &[u8]) {
        if !self.page.is_empty() {
            self.flush(PageFlags::empty());
        }

        self.incomplete_granule = 0;
        self.lace(packet, 0);
        self.flush(PageFlags::empty());
        self.incomplete_granule = NO_PACKET_GRANULE;
    }

    /// Appends a data packet whose last sample has granule position `end_granule`.
    pub fn write_packet(&mut self, packet: &[u8], end_granule: u64) -> Result<()> {
        if packet.len() > self.options.max_packet_size {
            return packet_too_large_error(packet.len(), self.options.max_packet_size);
        }

        // A packet of N bytes needs N / 255 full lacing values and a terminating value.
        let laces = packet.len() / 255 + 1;

        if !self.page.is_empty()
            && (self.page.segments.len() + laces > OGG_PAGE_MAX_SEGMENTS
                || self.page.payload.len() + packet.len() > self.options.target_page_size)
        {
            self.flush(PageFlags::empty());
        }

        self.lace(packet, end_granule);
        Ok(())
    }

    /// Flushes the final page with the end-of-stream flag and returns the stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.flush(PageFlags::LAST_PAGE);
        debug!("wrote {} pages, {} bytes", self.sequence, self.buf.len());
        self.buf
    }

    /// Appends the lacing values and data of a packet, flushing whenever the segment table fills.
    fn lace(&mut self, packet: &[u8], end_granule: u64) {
        let mut chunks = packet.chunks(255);
        let mut remaining = packet.len();

        loop {
            if self.page.segments.len() == OGG_PAGE_MAX_SEGMENTS {
                self.flush(PageFlags::empty());
                self.page.continued = true;
            }

            let lace = remaining.min(255);
            self.page.segments.push(lace as u8);
            if let Some(chunk) = chunks.next() {
                self.page.payload.extend_from_slice(chunk);
            }
            remaining -= lace;

            // A lacing value below 255 terminates the packet. An exact multiple of 255 bytes
            // ends with a zero lacing value.
            if lace < 255 {
                break;
            }
        }

        self.page.granule = Some(end_granule);
    }

    fn flush(&mut self, mut flags: PageFlags) {
        let page = std::mem::take(&mut self.page);

        if page.continued {
            flags |= PageFlags::CONTINUATION;
        }
        if self.sequence == 0 {
            flags |= PageFlags::FIRST_PAGE;
        }

        let header = PageHeader {
            version: 0,
            flags,
            absgp: page.granule.unwrap_or(self.incomplete_granule),
            serial: self.options.serial,
            sequence: self.sequence,
            crc: 0,
            n_segments: page.segments.len() as u8,
        };

        debug!(
            "page {{ sequence={}, absgp={}, flags={:?}, segments={}, payload={} }}",
            header.sequence,
            header.absgp,
            header.flags,
            header.n_segments,
            page.payload.len()
        );

        Page { header, segment_table: &page.segments, body: &page.payload }.write_to(&mut self.buf);
        self.sequence += 1;
    }
}
