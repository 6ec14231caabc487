// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `options` module defines the tuning knobs shared by the reader and the writer.

/// The default target payload size of an Ogg data page, in bytes.
pub const DEFAULT_TARGET_PAGE_SIZE: usize = 4000;

/// The default upper bound on the size of a single Opus packet, in bytes. This is one full Ogg
/// page worth of lacing.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 255 * 255;

/// The default pre-skip, in 48 kHz samples, used when neither the OpusHead nor the track's codec
/// delay provides one.
pub const DEFAULT_PRE_SKIP: u16 = 312;

/// `LacingPolicy` selects how the WebM reader treats laced blocks.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LacingPolicy {
    /// Laced blocks are rejected with [`crate::errors::Error::UnsupportedLacing`].
    #[default]
    Reject,
    /// Xiph, fixed-size, and EBML lacing are decoded into individual frames.
    Decode,
}

/// `RemuxOptions` is a common set of options that all stages of the remuxer use.
#[derive(Clone, Debug)]
pub struct RemuxOptions {
    /// How laced WebM blocks are handled. Default: [`LacingPolicy::Reject`].
    pub lacing: LacingPolicy,
    /// The payload size, in bytes, beyond which a data page is flushed before the next packet
    /// starts. This is a tuning value, not a correctness requirement. Default: `4000`.
    pub target_page_size: usize,
    /// Packets larger than this many bytes are rejected. Default: `65025`.
    pub max_packet_size: usize,
    /// The Ogg logical stream serial number. If `None`, the serial is derived from the checksum
    /// of the input so that the output is deterministic. Default: `None`.
    pub serial: Option<u32>,
    /// The vendor string written to the OpusTags header. Default: empty.
    pub vendor: String,
    /// The pre-skip used when the input provides none. Default: `312`.
    pub default_pre_skip: u16,
}

impl Default for RemuxOptions {
    fn default() -> Self {
        RemuxOptions {
            lacing: LacingPolicy::Reject,
            target_page_size: DEFAULT_TARGET_PAGE_SIZE,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            serial: None,
            vendor: String::new(),
            default_pre_skip: DEFAULT_PRE_SKIP,
        }
    }
}
