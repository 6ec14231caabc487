// Opusmux Check Tool
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;
use serde::Serialize;

use opusmux::ogg::{read_packets, read_pages, OGG_PAGE_MAX_SIZE};
use opusmux::opus::{OpusHead, OpusPacket, OpusTags};

/// The outcome of checking a remuxed stream against the packets it was built from.
#[derive(Debug, Default, Serialize)]
pub struct Verification {
    pub pages: usize,
    /// Data packets, excluding the two header packets.
    pub packets: usize,
    pub serial: u32,
    pub channel_count: u8,
    pub pre_skip: u16,
    pub final_granule: u64,
    /// Playback duration in seconds, after pre-skip.
    pub duration: f64,
    pub failures: Vec<String>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, msg: String) {
        debug!("verification failure: {}", msg);
        self.failures.push(msg);
    }
}

/// Reads back `ogg` and checks its page structure, headers, packet identity, and granule
/// positions against `expected`.
pub fn verify(ogg: &[u8], expected: &[OpusPacket<'_>]) -> Verification {
    let mut res = Verification::default();

    let pages = match read_pages(ogg) {
        Ok(pages) => pages,
        Err(err) => {
            res.fail(format!("unreadable pages: {}", err));
            return res;
        }
    };

    res.pages = pages.len();

    let (first, last) = match (pages.first(), pages.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            res.fail("stream has no pages".to_string());
            return res;
        }
    };

    res.serial = first.header.serial;

    for (i, page) in pages.iter().enumerate() {
        if page.header.serial != res.serial {
            res.fail(format!("page {}: serial {:#x} differs", i, page.header.serial));
        }
        if page.header.sequence as usize != i {
            res.fail(format!("page {}: sequence number {}", i, page.header.sequence));
        }
        if page.header.is_first_page() != (i == 0) {
            res.fail(format!("page {}: misplaced beginning-of-stream flag", i));
        }
        if page.header.is_last_page() != (i == pages.len() - 1) {
            res.fail(format!("page {}: misplaced end-of-stream flag", i));
        }
        if page.size() > OGG_PAGE_MAX_SIZE {
            res.fail(format!("page {}: {} bytes", i, page.size()));
        }
    }

    if first.segment_table.len() != 1 || first.header.absgp != 0 {
        res.fail("identification header is not alone on the first page".to_string());
    }

    // Granule positions of pages that complete a packet never decrease.
    let mut granule = 0;
    for (i, page) in pages.iter().enumerate().filter(|(_, page)| page.num_packets() > 0) {
        if page.header.absgp < granule {
            res.fail(format!("page {}: granule {} < {}", i, page.header.absgp, granule));
        }
        granule = page.header.absgp;
    }

    if last.num_packets() == 0 {
        res.fail("last page completes no packet".to_string());
    }

    let packets = match read_packets(ogg) {
        Ok(packets) => packets,
        Err(err) => {
            res.fail(format!("unreadable packets: {}", err));
            return res;
        }
    };

    if packets.len() < 2 {
        res.fail("missing header packets".to_string());
        return res;
    }

    match OpusHead::parse(&packets[0].data) {
        Ok(head) => {
            res.channel_count = head.channel_count;
            res.pre_skip = head.pre_skip;
        }
        Err(err) => res.fail(format!("invalid OpusHead: {}", err)),
    }

    if let Err(err) = OpusTags::parse(&packets[1].data) {
        res.fail(format!("invalid OpusTags: {}", err));
    }

    if packets[1].granule != 0 {
        res.fail("comment header page has a non-zero granule".to_string());
    }

    let data = &packets[2..];
    res.packets = data.len();

    if data.len() != expected.len() {
        res.fail(format!("{} packets written, {} expected", data.len(), expected.len()));
    }

    if let Some(i) = data.iter().zip(expected).position(|(read, packet)| read.data != packet.data) {
        res.fail(format!("packet {} differs from its block", i));
    }

    let total: u64 = expected.iter().map(|packet| u64::from(packet.samples)).sum();
    res.final_granule = data.last().map_or(0, |packet| packet.granule);

    if res.final_granule != total {
        res.fail(format!("final granule {}, expected {}", res.final_granule, total));
    }

    res.duration = res.final_granule.saturating_sub(u64::from(res.pre_skip)) as f64 / 48_000.0;

    res
}
