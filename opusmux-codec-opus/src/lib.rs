// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opus bitstream knowledge needed to remux Opus without decoding it: the TOC byte, packet
//! durations, the identification and comment headers of RFC 7845, and granule accounting.

pub mod granule;
pub mod header;
pub mod packet;
pub mod toc;

pub use granule::{accumulate, GranulePacket};
pub use header::{OpusHead, OpusTags};
pub use packet::OpusPacket;
pub use toc::Toc;

#[cfg(test)]
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();
}
