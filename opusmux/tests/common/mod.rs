// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A builder for small synthetic WebM files.

#![allow(dead_code)]

const EBML: &[u8] = &[0x1a, 0x45, 0xdf, 0xa3];
const DOC_TYPE: &[u8] = &[0x42, 0x82];
const SEGMENT: &[u8] = &[0x18, 0x53, 0x80, 0x67];
const INFO: &[u8] = &[0x15, 0x49, 0xa9, 0x66];
const TIMESTAMP_SCALE: &[u8] = &[0x2a, 0xd7, 0xb1];
const TRACKS: &[u8] = &[0x16, 0x54, 0xae, 0x6b];
const TRACK_ENTRY: &[u8] = &[0xae];
const TRACK_NUMBER: &[u8] = &[0xd7];
const TRACK_TYPE: &[u8] = &[0x83];
const CODEC_ID: &[u8] = &[0x86];
const CODEC_PRIVATE: &[u8] = &[0x63, 0xa2];
const CODEC_DELAY: &[u8] = &[0x56, 0xaa];
const AUDIO: &[u8] = &[0xe1];
const SAMPLING_FREQUENCY: &[u8] = &[0xb5];
const CHANNELS: &[u8] = &[0x9f];
const CLUSTER: &[u8] = &[0x1f, 0x43, 0xb6, 0x75];
const TIMESTAMP: &[u8] = &[0xe7];
const SIMPLE_BLOCK: &[u8] = &[0xa3];
const BLOCK_GROUP: &[u8] = &[0xa0];
const BLOCK: &[u8] = &[0xa1];
const VOID: &[u8] = &[0xec];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encodes an element with an 8-byte data size.
pub fn element(id: &[u8], body: &[u8]) -> Vec<u8> {
    let mut buf = id.to_vec();
    buf.push(0x01);
    buf.extend_from_slice(&(body.len() as u64).to_be_bytes()[1..]);
    buf.extend_from_slice(body);
    buf
}

/// Encodes a master element of unknown size.
pub fn unknown_sized(id: &[u8], body: &[u8]) -> Vec<u8> {
    let mut buf = id.to_vec();
    buf.push(0xff);
    buf.extend_from_slice(body);
    buf
}

fn uint(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&byte| byte == 0).count().min(7);
    bytes[skip..].to_vec()
}

/// A 19-byte family 0 `OpusHead`.
pub fn opus_head(channels: u8, pre_skip: u16, sample_rate: u32) -> Vec<u8> {
    let mut buf = b"OpusHead".to_vec();
    buf.push(1);
    buf.push(channels);
    buf.extend_from_slice(&pre_skip.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&[0, 0, 0]);
    buf
}

/// `count` distinct packets with the given TOC byte.
pub fn packets(count: usize, toc: u8) -> Vec<Vec<u8>> {
    (0..count).map(|i| vec![toc, i as u8, (i >> 8) as u8, 0x5a]).collect()
}

#[derive(Clone, Debug)]
pub struct Track {
    pub number: u64,
    pub track_type: Option<u64>,
    pub codec_id: String,
    pub codec_private: Option<Vec<u8>>,
    pub codec_delay: Option<u64>,
    pub sample_rate: Option<f64>,
    pub channels: Option<u64>,
}

impl Track {
    pub fn opus(number: u64) -> Self {
        Track {
            number,
            track_type: Some(2),
            codec_id: "A_OPUS".to_string(),
            codec_private: Some(opus_head(2, 312, 48000)),
            codec_delay: None,
            sample_rate: Some(48000.0),
            channels: Some(2),
        }
    }

    pub fn video(number: u64, codec_id: &str) -> Self {
        Track {
            number,
            track_type: Some(1),
            codec_id: codec_id.to_string(),
            codec_private: None,
            codec_delay: None,
            sample_rate: None,
            channels: None,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut body = element(TRACK_NUMBER, &uint(self.number));
        if let Some(track_type) = self.track_type {
            body.extend(element(TRACK_TYPE, &uint(track_type)));
        }
        body.extend(element(CODEC_ID, self.codec_id.as_bytes()));
        if let Some(codec_private) = &self.codec_private {
            body.extend(element(CODEC_PRIVATE, codec_private));
        }
        if let Some(codec_delay) = self.codec_delay {
            body.extend(element(CODEC_DELAY, &uint(codec_delay)));
        }
        if self.sample_rate.is_some() || self.channels.is_some() {
            let mut audio = Vec::new();
            if let Some(sample_rate) = self.sample_rate {
                audio.extend(element(SAMPLING_FREQUENCY, &sample_rate.to_be_bytes()));
            }
            if let Some(channels) = self.channels {
                audio.extend(element(CHANNELS, &uint(channels)));
            }
            body.extend(element(AUDIO, &audio));
        }
        element(TRACK_ENTRY, &body)
    }
}

/// A block of one or more frames.
#[derive(Clone, Debug)]
pub struct Block {
    pub track: u64,
    /// Relative to the cluster timestamp.
    pub timecode: i16,
    pub frames: Vec<Vec<u8>>,
    /// Encode as a `BlockGroup` instead of a `SimpleBlock`.
    pub grouped: bool,
}

impl Block {
    pub fn simple(track: u64, timecode: i16, data: &[u8]) -> Self {
        Block { track, timecode, frames: vec![data.to_vec()], grouped: false }
    }

    /// A Xiph-laced block.
    pub fn laced(track: u64, timecode: i16, frames: Vec<Vec<u8>>) -> Self {
        Block { track, timecode, frames, grouped: false }
    }

    fn encode(&self) -> Vec<u8> {
        assert!(self.track < 127);
        let mut body = vec![0x80 | self.track as u8];
        body.extend_from_slice(&self.timecode.to_be_bytes());

        let keyframe = if self.grouped { 0x00 } else { 0x80 };

        if let [frame] = &self.frames[..] {
            body.push(keyframe);
            body.extend_from_slice(frame);
        }
        else {
            body.push(keyframe | 0x02);
            body.push((self.frames.len() - 1) as u8);
            for frame in &self.frames[..self.frames.len() - 1] {
                let mut len = frame.len();
                while len >= 255 {
                    body.push(255);
                    len -= 255;
                }
                body.push(len as u8);
            }
            for frame in &self.frames {
                body.extend_from_slice(frame);
            }
        }

        if self.grouped {
            element(BLOCK_GROUP, &element(BLOCK, &body))
        }
        else {
            element(SIMPLE_BLOCK, &body)
        }
    }
}

/// Builds a WebM file from tracks and clusters.
#[derive(Clone, Debug, Default)]
pub struct WebmBuilder {
    pub doc_type: Option<String>,
    pub tracks: Vec<Track>,
    pub clusters: Vec<(u64, Vec<Block>)>,
    /// Write the segment and clusters with unknown sizes, as live encoders do.
    pub live: bool,
}

impl WebmBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn cluster(mut self, timestamp: u64, blocks: Vec<Block>) -> Self {
        self.clusters.push((timestamp, blocks));
        self
    }

    /// Puts `packets` on track `track` in clusters of `per_cluster` blocks, one block per
    /// `frame_ms` milliseconds.
    pub fn packets(
        mut self,
        track: u64,
        packets: &[Vec<u8>],
        frame_ms: u64,
        per_cluster: usize,
    ) -> Self {
        for (i, chunk) in packets.chunks(per_cluster).enumerate() {
            let timestamp = (i * per_cluster) as u64 * frame_ms;
            let blocks = chunk
                .iter()
                .enumerate()
                .map(|(j, packet)| Block::simple(track, (j as u64 * frame_ms) as i16, packet))
                .collect();
            self = self.cluster(timestamp, blocks);
        }
        self
    }

    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let doc_type = self.doc_type.as_deref().unwrap_or("webm");
        let mut buf = element(EBML, &element(DOC_TYPE, doc_type.as_bytes()));

        let mut segment = element(INFO, &element(TIMESTAMP_SCALE, &uint(1_000_000)));
        segment.extend(element(VOID, &[0; 4]));

        let tracks: Vec<u8> = self.tracks.iter().flat_map(Track::encode).collect();
        segment.extend(element(TRACKS, &tracks));

        for (timestamp, blocks) in &self.clusters {
            let mut body = element(TIMESTAMP, &uint(*timestamp));
            for block in blocks {
                body.extend(block.encode());
            }
            if self.live {
                segment.extend(unknown_sized(CLUSTER, &body));
            }
            else {
                segment.extend(element(CLUSTER, &body));
            }
        }

        if self.live {
            buf.extend(unknown_sized(SEGMENT, &segment));
        }
        else {
            buf.extend(element(SEGMENT, &segment));
        }
        buf
    }
}
