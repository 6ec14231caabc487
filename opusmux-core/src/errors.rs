// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Opusmux.
///
/// Every error is fatal to the remux call that produced it. No stage retries or recovers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The buffer ended in the middle of an element or page.
    Truncated,
    /// The container is structurally broken, e.g. an element overruns its parent.
    CorruptContainer(&'static str),
    /// The buffer is not a WebM/Matroska container at all, or lacks required elements.
    InvalidContainer(&'static str),
    /// The container does not hold exactly one Opus audio track.
    UnsupportedCodec(&'static str),
    /// A block uses lacing and lacing is not enabled.
    UnsupportedLacing,
    /// An Opus packet is outside the defined configuration space.
    MalformedPacket(&'static str),
    /// The output stream could not be constructed from the given parameters.
    WriterFailure(&'static str),
    /// A packet exceeded the configured size limit.
    PacketTooLarge { len: usize, limit: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Truncated => write!(f, "truncated input: buffer ended mid-element"),
            Error::CorruptContainer(msg) => write!(f, "corrupt container: {}", msg),
            Error::InvalidContainer(msg) => write!(f, "invalid container: {}", msg),
            Error::UnsupportedCodec(msg) => write!(f, "unsupported codec: {}", msg),
            Error::UnsupportedLacing => write!(f, "unsupported feature: laced block"),
            Error::MalformedPacket(msg) => write!(f, "malformed opus packet: {}", msg),
            Error::WriterFailure(msg) => write!(f, "writer failure: {}", msg),
            Error::PacketTooLarge { len, limit } => {
                write!(f, "packet too large: {} bytes exceeds limit of {} bytes", len, limit)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a truncated input error.
pub fn truncated_error<T>() -> Result<T> {
    Err(Error::Truncated)
}

/// Convenience function to create a corrupt container error.
pub fn corrupt_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::CorruptContainer(desc))
}

/// Convenience function to create an invalid container error.
pub fn invalid_container_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidContainer(desc))
}

/// Convenience function to create an unsupported codec error.
pub fn unsupported_codec_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::UnsupportedCodec(desc))
}

/// Convenience function to create a malformed packet error.
pub fn malformed_packet_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedPacket(desc))
}

/// Convenience function to create a writer error.
pub fn writer_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::WriterFailure(desc))
}

/// Convenience function to create a packet size limit error.
pub fn packet_too_large_error<T>(len: usize, limit: usize) -> Result<T> {
    Err(Error::PacketTooLarge { len, limit })
}
