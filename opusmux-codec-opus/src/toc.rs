// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The TOC byte (table of contents) that starts every Opus packet.
//!
//! ```text
//!  0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+
//! | config  |s| c |
//! +-+-+-+-+-+-+-+-+
//! ```
//!
//! The five `config` bits select the operating mode, audio bandwidth and frame duration:
//!
//! ```text
//! +-----------+-----------+-----------+-------------------+
//! | Config    | Mode      | Bandwidth | Frame Sizes       |
//! +-----------+-----------+-----------+-------------------+
//! | 0...3     | SILK-only | NB        | 10, 20, 40, 60 ms |
//! | 4...7     | SILK-only | MB        | 10, 20, 40, 60 ms |
//! | 8...11    | SILK-only | WB        | 10, 20, 40, 60 ms |
//! | 12...13   | Hybrid    | SWB       | 10, 20 ms         |
//! | 14...15   | Hybrid    | FB        | 10, 20 ms         |
//! | 16...19   | CELT-only | NB        | 2.5, 5, 10, 20 ms |
//! | 20...23   | CELT-only | WB        | 2.5, 5, 10, 20 ms |
//! | 24...27   | CELT-only | SWB       | 2.5, 5, 10, 20 ms |
//! | 28...31   | CELT-only | FB        | 2.5, 5, 10, 20 ms |
//! +-----------+-----------+-----------+-------------------+
//! ```
//!
//! `s` is the stereo flag and `c` the frame count code: 0 for one frame, 1 for two frames of
//! equal size, 2 for two frames of different sizes, 3 for an arbitrary number of frames.
//!
//! <https://datatracker.ietf.org/doc/html/rfc6716#section-3.1>

/// The Table of Contents (TOC) byte of an Opus packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toc {
    config: u8,
    stereo: bool,
    frame_count: FrameCount,
}

impl Toc {
    pub fn new(byte: u8) -> Self {
        let frame_count = match byte & 0x03 {
            0 => FrameCount::One,
            1 => FrameCount::TwoEqual,
            2 => FrameCount::TwoDifferent,
            _ => FrameCount::Arbitrary,
        };

        Toc { config: byte >> 3, stereo: byte & 0x04 != 0, frame_count }
    }

    pub fn as_byte(&self) -> u8 {
        let mut byte = (self.config & 0x1f) << 3;
        if self.stereo {
            byte |= 0x04;
        }
        byte | self.frame_count.code()
    }

    /// The configuration number, 0 to 31.
    pub fn config(&self) -> u8 {
        self.config
    }

    pub fn frame_count(&self) -> FrameCount {
        self.frame_count
    }

    /// The duration of each frame of the packet.
    pub fn frame_size(&self) -> FrameSize {
        frame_size_for(self.config)
    }
}

/// The duration of one Opus frame, valued in samples at 48 kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FrameSize {
    Ms2_5 = 120,
    Ms5 = 240,
    Ms10 = 480,
    Ms20 = 960,
    Ms40 = 1920,
    Ms60 = 2880,
}

impl FrameSize {
    /// The number of samples per channel of one frame at 48 kHz.
    pub fn samples(self) -> u32 {
        self as u32
    }
}

fn frame_size_for(config: u8) -> FrameSize {
    const SILK: [FrameSize; 4] = [FrameSize::Ms10, FrameSize::Ms20, FrameSize::Ms40, FrameSize::Ms60];
    const HYBRID: [FrameSize; 2] = [FrameSize::Ms10, FrameSize::Ms20];
    const CELT: [FrameSize; 4] = [FrameSize::Ms2_5, FrameSize::Ms5, FrameSize::Ms10, FrameSize::Ms20];

    let config = config & 0x1f;
    match config {
        0..=11 => SILK[usize::from(config % 4)],
        12..=15 => HYBRID[usize::from(config % 2)],
        _ => CELT[usize::from((config - 16) % 4)],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCount {
    One,
    TwoEqual,
    TwoDifferent,
    Arbitrary,
}

impl FrameCount {
    /// The 2-bit frame count code `c`.
    pub fn code(self) -> u8 {
        match self {
            FrameCount::One => 0,
            FrameCount::TwoEqual => 1,
            FrameCount::TwoDifferent => 2,
            FrameCount::Arbitrary => 3,
        }
    }
}
