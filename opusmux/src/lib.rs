// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Opusmux
//!
//! Opusmux is a pure Rust remuxer that rewraps the Opus audio track of a WebM (or Matroska) file
//! into an Ogg Opus stream, without decoding or re-encoding any audio.
//!
//! # Usage
//!
//! The whole input file is held in memory and the whole output is returned at once:
//!
//! ```no_run
//! let webm = std::fs::read("input.webm").unwrap();
//! let ogg = opusmux::remux(&webm).unwrap();
//! std::fs::write("output.opus", ogg).unwrap();
//! ```
//!
//! A remux runs through four stages:
//!
//! 1.  The WebM reader ([`mkv::parse`]) walks the EBML element tree, collects the track
//!     descriptors, and borrows every block payload from the input buffer.
//! 2.  The extractor ([`extract()`]) selects the single Opus audio track, orders its blocks by
//!     timecode, and validates the TOC byte of every packet to learn its duration.
//! 3.  The granule accountant ([`opus::accumulate`]) assigns each packet the cumulative sample
//!     count at its end.
//! 4.  The Ogg writer ([`ogg::write_opus_stream`]) writes the OpusHead and OpusTags header pages
//!     followed by the data pages.
//!
//! A call either returns a complete Ogg stream or a [`RemuxError`]. No partial output is ever
//! produced. Use [`remux_with_options`] to enable decoding of laced blocks, pick the Ogg serial
//! number, or tune the page size.

mod extract;

pub use opusmux_codec_opus as opus;
pub use opusmux_core as core;
pub use opusmux_format_mkv as mkv;
pub use opusmux_format_ogg as ogg;

pub use opusmux_core::errors::Error as RemuxError;
pub use opusmux_core::options::{LacingPolicy, RemuxOptions};

pub use crate::extract::{extract, OpusStream};

use log::info;

use opusmux_codec_opus::{accumulate, OpusTags};
use opusmux_core::checksum::Crc32;
use opusmux_format_ogg::{write_opus_stream, WriterOptions};

/// Remuxes a complete WebM/Opus file into a complete Ogg/Opus file with the default options.
pub fn remux(input: &[u8]) -> Result<Vec<u8>, RemuxError> {
    remux_with_options(input, &Default::default())
}

/// Remuxes a complete WebM/Opus file into a complete Ogg/Opus file.
///
/// When `options.serial` is `None` the serial number is the CRC-32 of `input`, so the same input
/// always produces byte-identical output.
pub fn remux_with_options(input: &[u8], options: &RemuxOptions) -> Result<Vec<u8>, RemuxError> {
    let doc = mkv::parse(input, options)?;

    let stream = extract(&doc, options)?;

    let packets = accumulate(&stream.packets);

    let serial = options.serial.unwrap_or_else(|| Crc32::checksum(input));

    let tags = OpusTags::new(&options.vendor);

    let output = write_opus_stream(
        &stream.params,
        &tags,
        &packets,
        &WriterOptions::from_remux_options(options, serial),
    )?;

    info!("remuxed {} bytes of {} into {} bytes of ogg", input.len(), doc.doc_type, output.len());

    Ok(output)
}
