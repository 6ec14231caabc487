// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use opusmux_core::errors::{corrupt_error, Error, Result};

use crate::ebml::{Element, ElementIterator};
use crate::element_ids::ElementType;

#[derive(Debug)]
pub(crate) struct EbmlHeaderElement {
    pub(crate) doc_type: String,
}

impl<'a> Element<'a> for EbmlHeaderElement {
    const ID: ElementType = ElementType::Ebml;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut doc_type = None;

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::DocType => {
                    doc_type = Some(element.read_string()?);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        // DocType defaults to "matroska" when absent.
        Ok(Self { doc_type: doc_type.unwrap_or_else(|| "matroska".to_string()) })
    }
}

#[derive(Debug)]
pub(crate) struct InfoElement {
    pub(crate) timestamp_scale: u64,
    pub(crate) duration: Option<f64>,
}

impl<'a> Element<'a> for InfoElement {
    const ID: ElementType = ElementType::Info;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut timestamp_scale = None;
        let mut duration = None;

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::TimestampScale => {
                    timestamp_scale = Some(element.read_u64()?);
                }
                ElementType::Duration => {
                    duration = Some(element.read_f64()?);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        Ok(Self { timestamp_scale: timestamp_scale.unwrap_or(1_000_000), duration })
    }
}

#[derive(Debug)]
pub(crate) struct TracksElement {
    pub(crate) tracks: Vec<TrackElement>,
}

impl<'a> Element<'a> for TracksElement {
    const ID: ElementType = ElementType::Tracks;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut tracks = Vec::new();

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::TrackEntry => {
                    tracks.push(it.read_master(element)?);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        Ok(Self { tracks })
    }
}

#[derive(Debug)]
pub(crate) struct TrackElement {
    pub(crate) number: u64,
    pub(crate) track_type: Option<u64>,
    pub(crate) codec_id: String,
    pub(crate) codec_private: Option<Vec<u8>>,
    pub(crate) codec_delay: Option<u64>,
    pub(crate) seek_pre_roll: Option<u64>,
    pub(crate) audio: Option<AudioElement>,
}

impl<'a> Element<'a> for TrackElement {
    const ID: ElementType = ElementType::TrackEntry;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut number = None;
        let mut track_type = None;
        let mut codec_id = None;
        let mut codec_private = None;
        let mut codec_delay = None;
        let mut seek_pre_roll = None;
        let mut audio = None;

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::TrackNumber => {
                    number = Some(element.read_u64()?);
                }
                ElementType::TrackType => {
                    track_type = Some(element.read_u64()?);
                }
                ElementType::CodecId => {
                    codec_id = Some(element.read_string()?);
                }
                ElementType::CodecPrivate => {
                    codec_private = Some(element.read_binary()?.to_vec());
                }
                ElementType::CodecDelay => {
                    codec_delay = Some(element.read_u64()?);
                }
                ElementType::SeekPreRoll => {
                    seek_pre_roll = Some(element.read_u64()?);
                }
                ElementType::Audio => {
                    audio = Some(it.read_master(element)?);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        Ok(Self {
            number: number.ok_or(Error::CorruptContainer("mkv: missing track number"))?,
            track_type,
            codec_id: codec_id.ok_or(Error::CorruptContainer("mkv: missing codec id"))?,
            codec_private,
            codec_delay,
            seek_pre_roll,
            audio,
        })
    }
}

#[derive(Debug)]
pub(crate) struct AudioElement {
    pub(crate) sampling_frequency: f64,
    pub(crate) channels: u64,
    pub(crate) bit_depth: Option<u64>,
}

impl<'a> Element<'a> for AudioElement {
    const ID: ElementType = ElementType::Audio;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut sampling_frequency = None;
        let mut channels = None;
        let mut bit_depth = None;

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::SamplingFrequency => {
                    sampling_frequency = Some(element.read_f64()?);
                }
                ElementType::Channels => {
                    channels = Some(element.read_u64()?);
                }
                ElementType::BitDepth => {
                    bit_depth = Some(element.read_u64()?);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        Ok(Self {
            sampling_frequency: sampling_frequency.unwrap_or(8000.0),
            channels: channels.unwrap_or(1),
            bit_depth,
        })
    }
}

/// A block payload as stored in a cluster, before the block header is parsed.
#[derive(Debug)]
pub(crate) struct BlockData<'a> {
    pub(crate) data: &'a [u8],
    /// True for a `SimpleBlock`, false for a `Block` inside a `BlockGroup`.
    pub(crate) simple: bool,
}

#[derive(Debug)]
pub(crate) struct ClusterElement<'a> {
    pub(crate) timestamp: u64,
    pub(crate) blocks: Vec<BlockData<'a>>,
}

impl<'a> Element<'a> for ClusterElement<'a> {
    const ID: ElementType = ElementType::Cluster;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut timestamp = None;
        let mut blocks = Vec::new();

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::Timestamp => {
                    timestamp = Some(element.read_u64()?);
                }
                ElementType::SimpleBlock => {
                    blocks.push(BlockData { data: element.read_binary()?, simple: true });
                }
                ElementType::BlockGroup => {
                    let group: BlockGroupElement<'a> = it.read_master(element)?;
                    blocks.push(BlockData { data: group.data, simple: false });
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        match timestamp {
            Some(timestamp) => Ok(Self { timestamp, blocks }),
            None => corrupt_error("mkv: missing cluster timestamp"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct BlockGroupElement<'a> {
    pub(crate) data: &'a [u8],
}

impl<'a> Element<'a> for BlockGroupElement<'a> {
    const ID: ElementType = ElementType::BlockGroup;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut data = None;

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::Block => {
                    data = Some(element.read_binary()?);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        Ok(Self { data: data.ok_or(Error::CorruptContainer("mkv: missing block in group"))? })
    }
}

#[derive(Debug)]
pub(crate) struct SegmentElement<'a> {
    pub(crate) info: Option<InfoElement>,
    pub(crate) tracks: Option<TracksElement>,
    pub(crate) clusters: Vec<ClusterElement<'a>>,
}

impl<'a> Element<'a> for SegmentElement<'a> {
    const ID: ElementType = ElementType::Segment;

    fn read(it: &mut ElementIterator<'a>) -> Result<Self> {
        let mut info = None;
        let mut tracks = None;
        let mut clusters = Vec::new();

        while let Some(element) = it.next_element()? {
            match element.etype() {
                ElementType::Info => {
                    info = Some(it.read_master(element)?);
                }
                ElementType::Tracks => {
                    if tracks.is_some() {
                        log::warn!("ignoring additional tracks element");
                        continue;
                    }
                    tracks = Some(it.read_master(element)?);
                }
                ElementType::Cluster => {
                    clusters.push(it.read_master(element)?);
                }
                ElementType::Unknown => {
                    log::warn!("skipping unknown element with tag {:#x}", element.header().tag);
                }
                other => {
                    log::debug!("ignored element {:?}", other);
                }
            }
        }

        Ok(Self { info, tracks, clusters })
    }
}
