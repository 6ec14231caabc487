// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reads back a complete in-memory Ogg stream. Every page must be intact: unlike a demuxer for
//! live streams, this reader does not resynchronize after a bad page.

use log::debug;

use opusmux_core::errors::{corrupt_error, Result};
use opusmux_core::io::BufReader;

use crate::page::Page;

/// Reads and verifies every page of a stream.
pub fn read_pages(buf: &[u8]) -> Result<Vec<Page<'_>>> {
    let mut reader = BufReader::new(buf);
    let mut pages = Vec::new();

    while !reader.is_empty() {
        pages.push(Page::read(&mut reader)?);
    }

    Ok(pages)
}

/// A packet reassembled from one or more pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OggPacket {
    pub serial: u32,
    /// The granule position of the page the packet ends on.
    pub granule: u64,
    /// The sequence number of the page the packet ends on.
    pub sequence: u32,
    pub data: Vec<u8>,
}

/// Reads every page of a single logical stream and reassembles its packets.
pub fn read_packets(buf: &[u8]) -> Result<Vec<OggPacket>> {
    let mut packets = Vec::new();
    let mut partial: Option<Vec<u8>> = None;

    for page in read_pages(buf)? {
        match (page.header.is_continuation(), partial.is_some()) {
            (false, true) => return corrupt_error("ogg: packet not continued on next page"),
            (true, false) => return corrupt_error("ogg: continuation without a packet"),
            _ => (),
        }

        let mut body = page.body;

        for &lace in page.segment_table {
            let (segment, rest) = body.split_at(usize::from(lace));
            body = rest;

            partial.get_or_insert_with(Vec::new).extend_from_slice(segment);

            // A segment with a length < 255 indicates that the segment is the end of a packet.
            if lace < 255 {
                packets.push(OggPacket {
                    serial: page.header.serial,
                    granule: page.header.absgp,
                    sequence: page.header.sequence,
                    data: partial.take().unwrap_or_default(),
                });
            }
        }
    }

    if partial.is_some() {
        return corrupt_error("ogg: stream ends inside a packet");
    }

    debug!("read {} packets", packets.len());

    Ok(packets)
}
