// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Granule position accounting.
//!
//! The granule position of an Ogg Opus page is the total number of 48 kHz samples, including
//! pre-skip, decoded from the start of the stream up to the last packet completed on the page.

use crate::packet::OpusPacket;

/// An Opus packet with the granule position of its last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GranulePacket<'a> {
    pub data: &'a [u8],
    pub samples: u32,
    /// The running sample total after this packet.
    pub end_granule: u64,
}

/// Assigns each packet the running total of samples up to and including it, starting from 0.
pub fn accumulate<'a>(packets: &[OpusPacket<'a>]) -> Vec<GranulePacket<'a>> {
    let mut granule = 0u64;

    packets
        .iter()
        .map(|packet| {
            granule = granule.saturating_add(u64::from(packet.samples));
            GranulePacket { data: packet.data, samples: packet.samples, end_granule: granule }
        })
        .collect()
}
