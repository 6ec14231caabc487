// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opus packet duration.
//!
//! A remuxer never decodes frames, but it must know how many samples each packet produces to
//! compute granule positions. That only requires the TOC byte and, for code 3 packets, the frame
//! count byte that follows it.
//!
//! References:
//! - RFC 6716 §3.2: Frame Packing (<https://tools.ietf.org/html/rfc6716#section-3.2>)

use log::debug;
use thiserror::Error;

use crate::toc::{FrameCount, Toc};

/// The longest duration a single packet may carry: 120 ms at 48 kHz.
pub const MAX_PACKET_SAMPLES: u32 = 5760;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Packet is empty")]
    EmptyPacket,

    #[error("Code 3 packet is missing its frame count byte")]
    MissingFrameCountByte,

    #[error("Number of frames can't be zero")]
    ZeroFrameCount,

    #[error("Code 1 packet has an odd-length body")]
    InvalidCode1PacketLength,

    #[error("Total audio duration exceeds 120 ms: {0} samples")]
    ExcessiveTotalDuration(u32),
}

impl From<Error> for opusmux_core::errors::Error {
    fn from(err: Error) -> Self {
        let desc = match err {
            Error::EmptyPacket => "opus: empty packet",
            Error::MissingFrameCountByte => "opus: missing frame count byte",
            Error::ZeroFrameCount => "opus: zero frame count",
            Error::InvalidCode1PacketLength => "opus: odd-length code 1 packet",
            Error::ExcessiveTotalDuration(_) => "opus: packet longer than 120 ms",
        };
        opusmux_core::errors::Error::MalformedPacket(desc)
    }
}

/// Returns the number of frames in a packet.
pub fn frame_count(packet: &[u8]) -> Result<u32, Error> {
    let toc = Toc::new(*packet.first().ok_or(Error::EmptyPacket)?);

    match toc.frame_count() {
        FrameCount::One => Ok(1),
        FrameCount::TwoEqual => {
            // Both frames share the body equally.
            if (packet.len() - 1) % 2 != 0 {
                return Err(Error::InvalidCode1PacketLength);
            }
            Ok(2)
        }
        FrameCount::TwoDifferent => Ok(2),
        FrameCount::Arbitrary => {
            let byte = packet.get(1).ok_or(Error::MissingFrameCountByte)?;
            match u32::from(byte & 0x3f) {
                0 => Err(Error::ZeroFrameCount),
                count => Ok(count),
            }
        }
    }
}

/// Returns the number of samples per channel at 48 kHz that a packet decodes to.
pub fn sample_count(packet: &[u8]) -> Result<u32, Error> {
    let frames = frame_count(packet)?;
    let toc = Toc::new(packet[0]);
    let samples = frames * toc.frame_size().samples();

    if samples > MAX_PACKET_SAMPLES {
        debug!("toc {:#010b}: {} frames of {:?}", toc.as_byte(), frames, toc.frame_size());
        return Err(Error::ExcessiveTotalDuration(samples));
    }

    Ok(samples)
}

/// An Opus packet copied through the remuxer untouched, with its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusPacket<'a> {
    pub data: &'a [u8],
    /// Samples per channel at 48 kHz.
    pub samples: u32,
}

impl<'a> OpusPacket<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, Error> {
        Ok(OpusPacket { data, samples: sample_count(data)? })
    }
}
