// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use opusmux_core::errors::{corrupt_error, Error, Result};
use opusmux_core::io::BufReader;
use opusmux_core::options::LacingPolicy;

use crate::ebml::{read_signed_vint, read_unsigned_vint};

/// The lacing mode of a block, from bits 1-2 of the block flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Lacing {
    None,
    Xiph,
    FixedSize,
    Ebml,
}

fn parse_flags(flags: u8) -> Lacing {
    match (flags >> 1) & 0b11 {
        0b00 => Lacing::None,
        0b01 => Lacing::Xiph,
        0b10 => Lacing::FixedSize,
        _ => Lacing::Ebml,
    }
}

fn read_ebml_sizes(reader: &mut BufReader<'_>, frames: usize) -> Result<Vec<u64>> {
    let mut sizes = Vec::with_capacity(frames);
    for _ in 0..frames {
        if let Some(last_size) = sizes.last().copied() {
            let delta = read_signed_vint(reader)?;
            match u64::try_from(last_size as i64 + delta) {
                Ok(size) => sizes.push(size),
                Err(_) => return corrupt_error("mkv: negative ebml lace size"),
            }
        }
        else {
            sizes.push(read_unsigned_vint(reader)?);
        }
    }

    Ok(sizes)
}

fn read_xiph_sizes(reader: &mut BufReader<'_>, frames: usize) -> Result<Vec<u64>> {
    let mut prefixes = 0;
    let mut sizes = Vec::with_capacity(frames);
    while sizes.len() < frames {
        let byte = u64::from(reader.read_byte()?);
        if byte == 255 {
            prefixes += 1;
        }
        else {
            let size = prefixes * 255 + byte;
            prefixes = 0;
            sizes.push(size);
        }
    }

    Ok(sizes)
}

pub(crate) struct Frame<'a> {
    pub(crate) track: u64,
    /// Frame timecode relative to the cluster timestamp.
    pub(crate) timecode: i16,
    pub(crate) keyframe: bool,
    pub(crate) lacing: Lacing,
    pub(crate) data: &'a [u8],
}

/// Parses a `SimpleBlock` or `Block` payload and appends its frames to `frames`.
///
/// The block element itself is complete, so any payload that is shorter than its header or lace
/// sizes claim is reported as corrupt rather than truncated.
pub(crate) fn extract_frames<'a>(
    block: &'a [u8],
    simple: bool,
    policy: LacingPolicy,
    frames: &mut Vec<Frame<'a>>,
) -> Result<()> {
    match read_frames(block, simple, policy, frames) {
        Err(Error::Truncated) => corrupt_error("mkv: block shorter than its header"),
        result => result,
    }
}

fn read_frames<'a>(
    block: &'a [u8],
    simple: bool,
    policy: LacingPolicy,
    frames: &mut Vec<Frame<'a>>,
) -> Result<()> {
    let mut reader = BufReader::new(block);
    let track = read_unsigned_vint(&mut reader)?;
    let timecode = reader.read_be_i16()?;
    let flags = reader.read_byte()?;
    let lacing = parse_flags(flags);
    // Only a SimpleBlock carries a keyframe flag. Audio in a Block is always a keyframe.
    let keyframe = !simple || flags & 0x80 != 0;

    let mut push = |data: &'a [u8]| frames.push(Frame { track, timecode, keyframe, lacing, data });

    if lacing != Lacing::None && policy == LacingPolicy::Reject {
        log::debug!("laced block on track {} ({:?})", track, lacing);
        return Err(Error::UnsupportedLacing);
    }

    match lacing {
        Lacing::None => {
            push(reader.read_buf_bytes_available_ref());
        }
        Lacing::Xiph | Lacing::Ebml => {
            // Read number of stored sizes which is actually `number of frames` - 1
            // since size of the last frame is deduced from block size.
            let count = usize::from(reader.read_byte()?);
            let sizes = match lacing {
                Lacing::Xiph => read_xiph_sizes(&mut reader, count)?,
                _ => read_ebml_sizes(&mut reader, count)?,
            };

            for frame_size in sizes {
                let frame_size = match usize::try_from(frame_size) {
                    Ok(size) if size <= reader.bytes_available() => size,
                    _ => return corrupt_error("mkv: lace size exceeds block"),
                };
                push(reader.read_buf_bytes_ref(frame_size)?);
            }

            // Size of last frame is not provided so we read to the end of the block.
            push(reader.read_buf_bytes_available_ref());
        }
        Lacing::FixedSize => {
            let count = usize::from(reader.read_byte()?) + 1;
            let total_size = reader.bytes_available();
            if total_size % count != 0 {
                return corrupt_error("mkv: invalid fixed-size lacing");
            }

            let frame_size = total_size / count;
            for _ in 0..count {
                push(reader.read_buf_bytes_ref(frame_size)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use opusmux_core::errors::Error;
    use opusmux_core::options::LacingPolicy;

    use super::{extract_frames, Frame, Lacing};

    fn frames(block: &[u8], policy: LacingPolicy) -> Result<Vec<Vec<u8>>, Error> {
        let mut frames: Vec<Frame<'_>> = Vec::new();
        extract_frames(block, true, policy, &mut frames)?;
        Ok(frames.iter().map(|frame| frame.data.to_vec()).collect())
    }

    #[test]
    fn verify_unlaced_block() {
        let block = [0x81, 0x00, 0x14, 0x80, 0xfc, 0x01, 0x02];
        let mut out = Vec::new();
        extract_frames(&block, true, LacingPolicy::Reject, &mut out).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track, 1);
        assert_eq!(out[0].timecode, 20);
        assert!(out[0].keyframe);
        assert_eq!(out[0].lacing, Lacing::None);
        assert_eq!(out[0].data, &[0xfc, 0x01, 0x02]);
    }

    #[test]
    fn verify_negative_relative_timecode() {
        let block = [0x81, 0xff, 0xf6, 0x00, 0xfc];
        let mut out = Vec::new();
        extract_frames(&block, false, LacingPolicy::Reject, &mut out).unwrap();

        assert_eq!(out[0].timecode, -10);
        assert!(out[0].keyframe);
    }

    #[test]
    fn verify_laced_block_rejected() {
        // Xiph lacing, two frames.
        let block = [0x81, 0x00, 0x00, 0x82, 0x01, 0x02, 0xfc, 0x01, 0xfc];
        assert_eq!(frames(&block, LacingPolicy::Reject), Err(Error::UnsupportedLacing));
    }

    #[test]
    fn verify_xiph_lacing() {
        let block = [0x81, 0x00, 0x00, 0x82, 0x01, 0x02, 0xfc, 0x01, 0xfc];
        assert_eq!(
            frames(&block, LacingPolicy::Decode).unwrap(),
            vec![vec![0xfc, 0x01], vec![0xfc]]
        );
    }

    #[test]
    fn verify_fixed_size_lacing() {
        let block = [0x81, 0x00, 0x00, 0x84, 0x02, 0xa, 0xb, 0xc, 0xd, 0xe, 0xf];
        assert_eq!(
            frames(&block, LacingPolicy::Decode).unwrap(),
            vec![vec![0xa, 0xb], vec![0xc, 0xd], vec![0xe, 0xf]]
        );

        let block = [0x81, 0x00, 0x00, 0x84, 0x01, 0xa, 0xb, 0xc];
        assert!(matches!(frames(&block, LacingPolicy::Decode), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn verify_ebml_lacing() {
        // Three frames: 2 bytes, 2 + (-1) = 1 byte, and the remainder.
        let block = [0x81, 0x00, 0x00, 0x86, 0x02, 0x82, 0xbe, 0x1, 0x2, 0x3, 0x4, 0x5];
        assert_eq!(
            frames(&block, LacingPolicy::Decode).unwrap(),
            vec![vec![0x1, 0x2], vec![0x3], vec![0x4, 0x5]]
        );
    }

    #[test]
    fn verify_lace_sizes_beyond_block() {
        let block = [0x81, 0x00, 0x00, 0x82, 0x01, 0x09, 0xfc];
        assert!(matches!(frames(&block, LacingPolicy::Decode), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn verify_short_block_is_corrupt() {
        assert!(matches!(frames(&[0x81, 0x00], LacingPolicy::Reject), Err(Error::CorruptContainer(_))));
    }
}
