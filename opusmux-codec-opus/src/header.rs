// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opus identification and comment headers (RFC 7845 §5).
//!
//! The identification header travels alone on the first page of an Ogg Opus stream, the comment
//! header follows on the next page(s), and audio data starts on a fresh page after that:
//!
//! ```text
//!         Page 0         Pages 1 ... n        Pages (n+1) ...
//!      +------------+ +---+ +---+ ... +---+ +-----------+ +---------+ +--
//!      |            | |   | |   |     |   | |           | |         | |
//!      |+----------+| |+-----------------+| |+-------------------+ +-----
//!      |||ID Header|| ||  Comment Header || ||Audio Data Packet 1| | ...
//!      |+----------+| |+-----------------+| |+-------------------+ +-----
//!      |            | |   | |   |     |   | |           | |         | |
//!      +------------+ +---+ +---+ ... +---+ +-----------+ +---------+ +--
//! ```
//!
//! In WebM the identification header is carried in the track's `CodecPrivate` instead.
//!
//! <https://datatracker.ietf.org/doc/html/rfc7845#section-3>

use opusmux_core::io::BufReader;
use thiserror::Error;

/// Errors that can occur during Opus header parsing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid magic signature")]
    InvalidMagicSignature,

    #[error("Header is too short")]
    HeaderTooShort,

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(u8),
}

impl From<Error> for opusmux_core::errors::Error {
    fn from(err: Error) -> Self {
        let desc = match err {
            Error::InvalidMagicSignature => "opus: codec private is not an OpusHead",
            Error::HeaderTooShort => "opus: OpusHead too short",
            Error::UnsupportedVersion(_) => "opus: unsupported OpusHead version",
            Error::InvalidChannelCount(_) => "opus: invalid OpusHead channel count",
        };
        opusmux_core::errors::Error::UnsupportedCodec(desc)
    }
}

impl From<opusmux_core::errors::Error> for Error {
    fn from(_: opusmux_core::errors::Error) -> Self {
        // The only failure of the cursor is running out of data.
        Error::HeaderTooShort
    }
}

/// Identification header.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      'O'      |      'p'      |      'u'      |      's'      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      'H'      |      'e'      |      'a'      |      'd'      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Version = 1  | Channel Count |           Pre-skip            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Input Sample Rate (Hz)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Output Gain (Q7.8 in dB)    | Mapping Family|               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               :
/// |                                                               |
/// :               Optional Channel Mapping Table...               :
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Only the fixed 19-byte part is modelled. The remuxer always writes channel mapping family 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channel_count: u8,
    /// Samples at 48 kHz to discard from the start of the decoded output.
    pub pre_skip: u16,
    /// The sample rate of the original input. Informational only.
    pub input_sample_rate: u32,
    /// Output gain in Q7.8 dB.
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl OpusHead {
    pub const MAGIC_SIGNATURE: &'static [u8] = b"OpusHead";

    /// The size of a serialized family 0 header.
    pub const SIZE: usize = 19;

    /// Creates a version 1, channel mapping family 0 header with no output gain.
    pub fn new(channel_count: u8, pre_skip: u16, input_sample_rate: u32) -> Self {
        OpusHead {
            version: 1,
            channel_count,
            pre_skip,
            input_sample_rate,
            output_gain: 0,
            mapping_family: 0,
        }
    }

    /// Parses an identification header.
    pub fn parse(buf: &[u8]) -> Result<Self, Error> {
        let mut reader = BufReader::new(buf);

        if reader.read_buf_bytes_ref(Self::MAGIC_SIGNATURE.len())? != Self::MAGIC_SIGNATURE {
            return Err(Error::InvalidMagicSignature);
        }

        let version = reader.read_byte()?;
        if version != 1 {
            return Err(Error::UnsupportedVersion(version));
        }

        let channel_count = reader.read_byte()?;
        if channel_count == 0 {
            return Err(Error::InvalidChannelCount(channel_count));
        }

        let pre_skip = reader.read_u16()?;
        let input_sample_rate = reader.read_u32()?;
        let output_gain = reader.read_u16()? as i16;
        let mapping_family = reader.read_byte()?;

        if mapping_family != 0 {
            // Stream count, coupled count, and one mapping entry per channel.
            reader.ignore_bytes(2 + usize::from(channel_count))?;
        }
        else if channel_count > 2 {
            return Err(Error::InvalidChannelCount(channel_count));
        }

        Ok(OpusHead {
            version,
            channel_count,
            pre_skip,
            input_sample_rate,
            output_gain,
            mapping_family,
        })
    }

    /// Serializes the header as a channel mapping family 0 header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(Self::MAGIC_SIGNATURE);
        buf.push(self.version);
        buf.push(self.channel_count);
        buf.extend_from_slice(&self.pre_skip.to_le_bytes());
        buf.extend_from_slice(&self.input_sample_rate.to_le_bytes());
        buf.extend_from_slice(&self.output_gain.to_le_bytes());
        buf.push(0);
        buf
    }
}

/// Comment header: a vendor string and user comments of the form `NAME=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpusTags {
    pub vendor: String,
    pub comments: Vec<String>,
}

impl OpusTags {
    pub const MAGIC_SIGNATURE: &'static [u8] = b"OpusTags";

    pub fn new(vendor: &str) -> Self {
        OpusTags { vendor: vendor.to_string(), comments: Vec::new() }
    }

    /// Parses a comment header.
    pub fn parse(buf: &[u8]) -> Result<Self, Error> {
        let mut reader = BufReader::new(buf);

        if reader.read_buf_bytes_ref(Self::MAGIC_SIGNATURE.len())? != Self::MAGIC_SIGNATURE {
            return Err(Error::InvalidMagicSignature);
        }

        let vendor = read_string(&mut reader)?;

        let count = reader.read_u32()?;
        let mut comments = Vec::new();
        for _ in 0..count {
            comments.push(read_string(&mut reader)?);
        }

        Ok(OpusTags { vendor, comments })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(Self::MAGIC_SIGNATURE);
        write_string(&mut buf, &self.vendor);
        buf.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for comment in &self.comments {
            write_string(&mut buf, comment);
        }
        buf
    }
}

fn read_string(reader: &mut BufReader<'_>) -> Result<String, Error> {
    let len = reader.read_u32()? as usize;
    let bytes = reader.read_buf_bytes_ref(len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn write_string(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
}
