// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A WebM/Matroska reader that extracts track descriptors and raw block payloads from a complete
//! in-memory file.

mod ebml;
mod element_ids;
mod lacing;
mod segment;

use opusmux_core::errors::{corrupt_error, invalid_container_error, truncated_error, Result};
use opusmux_core::options::RemuxOptions;

use crate::ebml::ElementIterator;
use crate::element_ids::{ElementType, EBML_HEADER_MAGIC};
use crate::lacing::extract_frames;
use crate::segment::{EbmlHeaderElement, SegmentElement, TrackElement};

pub use crate::lacing::Lacing;

/// The Matroska `TrackType` of a track.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrackType {
    Video,
    Audio,
    Complex,
    Logo,
    Subtitle,
    Buttons,
    Control,
    Metadata,
    /// A track type value not defined by Matroska.
    Other(u64),
}

impl From<u64> for TrackType {
    fn from(value: u64) -> Self {
        match value {
            1 => TrackType::Video,
            2 => TrackType::Audio,
            3 => TrackType::Complex,
            0x10 => TrackType::Logo,
            0x11 => TrackType::Subtitle,
            0x12 => TrackType::Buttons,
            0x20 => TrackType::Control,
            0x21 => TrackType::Metadata,
            other => TrackType::Other(other),
        }
    }
}

/// A description of one track of the file.
#[derive(Clone, Debug)]
pub struct TrackDescriptor {
    /// The track number blocks refer to.
    pub number: u64,
    /// The track type, if the file declares one.
    pub track_type: Option<TrackType>,
    /// The Matroska codec ID, e.g. `A_OPUS`.
    pub codec_id: String,
    /// Codec initialization data. For Opus this is an `OpusHead` packet.
    pub codec_private: Option<Vec<u8>>,
    /// Codec built-in delay, in nanoseconds.
    pub codec_delay: Option<u64>,
    /// Decoder pre-roll after seeking, in nanoseconds.
    pub seek_pre_roll: Option<u64>,
    /// Sampling frequency of an audio track.
    pub sample_rate: Option<f64>,
    /// Number of channels of an audio track.
    pub channels: Option<u64>,
    /// Bits per sample of an audio track.
    pub bit_depth: Option<u64>,
}

impl TrackDescriptor {
    /// Returns true if this is an audio track. Files that omit the track type are classified by
    /// the codec ID prefix.
    pub fn is_audio(&self) -> bool {
        match self.track_type {
            Some(track_type) => track_type == TrackType::Audio,
            None => self.codec_id.starts_with("A_"),
        }
    }
}

impl From<TrackElement> for TrackDescriptor {
    fn from(track: TrackElement) -> Self {
        let audio = track.audio.as_ref();
        TrackDescriptor {
            number: track.number,
            track_type: track.track_type.map(TrackType::from),
            sample_rate: audio.map(|audio| audio.sampling_frequency),
            channels: audio.map(|audio| audio.channels),
            bit_depth: audio.and_then(|audio| audio.bit_depth),
            codec_id: track.codec_id,
            codec_private: track.codec_private,
            codec_delay: track.codec_delay,
            seek_pre_roll: track.seek_pre_roll,
        }
    }
}

/// One frame of a block, borrowed from the input buffer.
#[derive(Copy, Clone, Debug)]
pub struct RawBlock<'a> {
    /// The track number this block belongs to.
    pub track: u64,
    /// Absolute timecode in `TimestampScale` units: the cluster timestamp plus the block's
    /// relative timecode.
    pub timecode: i64,
    pub keyframe: bool,
    /// The lacing mode of the block this frame came from.
    pub lacing: Lacing,
    pub data: &'a [u8],
}

/// The parsed contents of a WebM file.
#[derive(Clone, Debug)]
pub struct WebmDocument<'a> {
    /// `webm` or `matroska`.
    pub doc_type: String,
    /// Nanoseconds per timecode unit.
    pub timestamp_scale: u64,
    /// Segment duration in timecode units, if declared.
    pub duration: Option<f64>,
    pub tracks: Vec<TrackDescriptor>,
    /// Block frames of all tracks in file order.
    pub blocks: Vec<RawBlock<'a>>,
}

/// Parses a complete WebM/Matroska file held in `buf`.
///
/// Only the first segment is read. Laced blocks are handled according to `options.lacing`.
pub fn parse<'a>(buf: &'a [u8], options: &RemuxOptions) -> Result<WebmDocument<'a>> {
    if buf.is_empty() {
        return invalid_container_error("mkv: empty input");
    }

    if !buf.starts_with(&EBML_HEADER_MAGIC) {
        // A buffer too short to hold the magic can still be the start of one.
        if buf.len() < EBML_HEADER_MAGIC.len() && EBML_HEADER_MAGIC.starts_with(buf) {
            return truncated_error();
        }
        return invalid_container_error("mkv: missing ebml header");
    }

    let mut it = ElementIterator::new(buf);

    let header = match it.next_element()? {
        Some(element) if element.etype() == ElementType::Ebml => {
            it.read_master::<EbmlHeaderElement>(element)?
        }
        _ => return invalid_container_error("mkv: missing ebml header"),
    };

    if header.doc_type != "webm" && header.doc_type != "matroska" {
        log::debug!("doc type {:?}", header.doc_type);
        return invalid_container_error("mkv: not a webm or matroska document");
    }

    let segment = loop {
        match it.next_element()? {
            Some(element) if element.etype() == ElementType::Segment => {
                break it.read_master::<SegmentElement<'a>>(element)?;
            }
            Some(element) => {
                log::debug!("ignored element {:?}", element.etype());
            }
            None => return invalid_container_error("mkv: missing segment"),
        }
    };

    let tracks = match segment.tracks {
        Some(tracks) => tracks.tracks,
        None => return invalid_container_error("mkv: missing tracks"),
    };

    let (timestamp_scale, duration) = match segment.info {
        Some(info) => (info.timestamp_scale, info.duration),
        None => (1_000_000, None),
    };

    let mut frames = Vec::new();
    let mut blocks = Vec::new();

    for cluster in &segment.clusters {
        let cluster_timestamp = match i64::try_from(cluster.timestamp) {
            Ok(timestamp) => timestamp,
            Err(_) => return corrupt_error("mkv: cluster timestamp out of range"),
        };

        for block in &cluster.blocks {
            frames.clear();
            extract_frames(block.data, block.simple, options.lacing, &mut frames)?;

            for frame in &frames {
                blocks.push(RawBlock {
                    track: frame.track,
                    timecode: cluster_timestamp.saturating_add(i64::from(frame.timecode)),
                    keyframe: frame.keyframe,
                    lacing: frame.lacing,
                    data: frame.data,
                });
            }
        }
    }

    log::debug!(
        "parsed {} document: {} tracks, {} clusters, {} blocks",
        header.doc_type,
        tracks.len(),
        segment.clusters.len(),
        blocks.len()
    );

    Ok(WebmDocument {
        doc_type: header.doc_type,
        timestamp_scale,
        duration,
        tracks: tracks.into_iter().map(TrackDescriptor::from).collect(),
        blocks,
    })
}

#[cfg(test)]
mod tests {
    use opusmux_core::errors::Error;
    use opusmux_core::options::RemuxOptions;

    use super::{parse, TrackType};

    fn element(id: &[u8], body: &[u8]) -> Vec<u8> {
        let mut buf = id.to_vec();
        // 8-byte size.
        buf.push(0x01);
        buf.extend_from_slice(&(body.len() as u64).to_be_bytes()[1..]);
        buf.extend_from_slice(body);
        buf
    }

    fn unknown_sized(id: &[u8], body: &[u8]) -> Vec<u8> {
        let mut buf = id.to_vec();
        buf.push(0xff);
        buf.extend_from_slice(body);
        buf
    }

    fn ebml_header(doc_type: &str) -> Vec<u8> {
        element(&[0x1a, 0x45, 0xdf, 0xa3], &element(&[0x42, 0x82], doc_type.as_bytes()))
    }

    fn opus_tracks() -> Vec<u8> {
        let mut entry = element(&[0xd7], &[1]);
        entry.extend(element(&[0x83], &[2]));
        entry.extend(element(&[0x86], b"A_OPUS"));
        entry.extend(element(&[0x56, 0xaa], &[0x00, 0x63, 0x2e, 0xa0]));
        let mut audio = element(&[0xb5], &48000f64.to_be_bytes());
        audio.extend(element(&[0x9f], &[2]));
        entry.extend(element(&[0xe1], &audio));
        element(&[0x16, 0x54, 0xae, 0x6b], &element(&[0xae], &entry))
    }

    fn cluster(timestamp: u8, blocks: &[&[u8]]) -> Vec<u8> {
        let mut body = element(&[0xe7], &[timestamp]);
        for block in blocks {
            body.extend(element(&[0xa3], block));
        }
        unknown_sized(&[0x1f, 0x43, 0xb6, 0x75], &body)
    }

    #[test]
    fn verify_streaming_document() {
        let mut segment = opus_tracks();
        segment.extend(cluster(0, &[&[0x81, 0x00, 0x00, 0x80, 0xfc], &[0x81, 0x00, 0x14, 0x80, 0xf8]]));
        segment.extend(cluster(40, &[&[0x81, 0xff, 0xec, 0x80, 0xf4]]));

        let mut buf = ebml_header("webm");
        buf.extend(unknown_sized(&[0x18, 0x53, 0x80, 0x67], &segment));

        let doc = parse(&buf, &RemuxOptions::default()).unwrap();
        assert_eq!(doc.doc_type, "webm");
        assert_eq!(doc.timestamp_scale, 1_000_000);
        assert_eq!(doc.tracks.len(), 1);

        let track = &doc.tracks[0];
        assert_eq!(track.track_type, Some(TrackType::Audio));
        assert!(track.is_audio());
        assert_eq!(track.codec_id, "A_OPUS");
        assert_eq!(track.codec_delay, Some(6_500_000));
        assert_eq!(track.sample_rate, Some(48000.0));
        assert_eq!(track.channels, Some(2));

        let timecodes: Vec<i64> = doc.blocks.iter().map(|block| block.timecode).collect();
        assert_eq!(timecodes, vec![0, 20, 20]);
        let data: Vec<&[u8]> = doc.blocks.iter().map(|block| block.data).collect();
        assert_eq!(data, vec![&[0xfc][..], &[0xf8][..], &[0xf4][..]]);
    }

    #[test]
    fn verify_cluster_timestamp_out_of_range() {
        let mut body = element(&[0xe7], &(1u64 << 63).to_be_bytes());
        body.extend(element(&[0xa3], &[0x81, 0x00, 0x00, 0x80, 0xfc]));

        let mut segment = opus_tracks();
        segment.extend(unknown_sized(&[0x1f, 0x43, 0xb6, 0x75], &body));

        let mut buf = ebml_header("webm");
        buf.extend(unknown_sized(&[0x18, 0x53, 0x80, 0x67], &segment));

        assert_eq!(
            parse(&buf, &RemuxOptions::default()).unwrap_err(),
            Error::CorruptContainer("mkv: cluster timestamp out of range")
        );
    }

    #[test]
    fn verify_rejects_foreign_doc_type() {
        let mut buf = ebml_header("mp4");
        buf.extend(element(&[0x18, 0x53, 0x80, 0x67], &opus_tracks()));

        assert!(matches!(
            parse(&buf, &RemuxOptions::default()),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn verify_missing_tracks() {
        let mut buf = ebml_header("webm");
        buf.extend(element(&[0x18, 0x53, 0x80, 0x67], &cluster(0, &[])));

        assert!(matches!(
            parse(&buf, &RemuxOptions::default()),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn verify_not_ebml() {
        let options = RemuxOptions::default();
        assert!(matches!(parse(&[], &options), Err(Error::InvalidContainer(_))));
        assert!(matches!(parse(b"OggS\0\x02", &options), Err(Error::InvalidContainer(_))));
        assert_eq!(parse(&[0x1a, 0x45], &options).unwrap_err(), Error::Truncated);
    }
}
