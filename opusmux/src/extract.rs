// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, warn};

use opusmux_codec_opus::{OpusHead, OpusPacket};
use opusmux_core::errors::{invalid_container_error, unsupported_codec_error, Error, Result};
use opusmux_core::options::RemuxOptions;
use opusmux_format_mkv::{TrackDescriptor, WebmDocument};
use opusmux_format_ogg::OpusStreamParams;

const OPUS_CODEC_ID: &str = "A_OPUS";

/// The Opus track of a WebM document, ready to be granule-accounted and written.
#[derive(Clone, Debug)]
pub struct OpusStream<'a> {
    /// The WebM track number the packets were taken from.
    pub track: u64,
    pub params: OpusStreamParams,
    /// Packets in presentation order.
    pub packets: Vec<OpusPacket<'a>>,
}

/// Selects the single Opus audio track of `doc` and validates every one of its packets.
///
/// The document must contain exactly one audio track, and that track must be Opus. Blocks are
/// stably sorted by timecode, so blocks sharing a timecode keep their file order.
pub fn extract<'a>(doc: &WebmDocument<'a>, options: &RemuxOptions) -> Result<OpusStream<'a>> {
    let track = select_track(&doc.tracks)?;

    let params = stream_params(track, options)?;

    let mut blocks: Vec<_> =
        doc.blocks.iter().filter(|block| block.track == track.number).collect();

    if blocks.is_empty() {
        return invalid_container_error("webm: opus track has no blocks");
    }

    if blocks.windows(2).any(|pair| pair[0].timecode > pair[1].timecode) {
        warn!("blocks of track {} are out of order, sorting by timecode", track.number);
        blocks.sort_by_key(|block| block.timecode);
    }

    let packets = blocks
        .iter()
        .map(|block| OpusPacket::new(block.data).map_err(Error::from))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "track {}: {} packets, channels={}, pre_skip={}, input_sample_rate={}",
        track.number,
        packets.len(),
        params.channel_count,
        params.pre_skip,
        params.input_sample_rate
    );

    Ok(OpusStream { track: track.number, params, packets })
}

fn select_track(tracks: &[TrackDescriptor]) -> Result<&TrackDescriptor> {
    let mut audio = tracks.iter().filter(|track| track.is_audio());

    let track = match (audio.next(), audio.next()) {
        (Some(track), None) => track,
        (None, _) => return unsupported_codec_error("webm: no audio track"),
        (Some(_), Some(_)) => return unsupported_codec_error("webm: more than one audio track"),
    };

    if track.codec_id != OPUS_CODEC_ID {
        debug!("audio track {} has codec id {:?}", track.number, track.codec_id);
        return unsupported_codec_error("webm: audio track is not opus");
    }

    Ok(track)
}

/// Resolves the identification header values. The `OpusHead` in `CodecPrivate` takes precedence
/// over the track's `Audio` element.
fn stream_params(track: &TrackDescriptor, options: &RemuxOptions) -> Result<OpusStreamParams> {
    let head = match &track.codec_private {
        Some(codec_private) => Some(OpusHead::parse(codec_private)?),
        None => None,
    };

    // Only family 0 packets are single-stream. The identification header written to the Ogg
    // stream is always family 0.
    if head.is_some_and(|head| head.mapping_family != 0) {
        return unsupported_codec_error("webm: opus channel mapping family is not 0");
    }

    let channel_count = match head {
        Some(head) => u64::from(head.channel_count),
        None => track.channels.unwrap_or(1),
    };

    let input_sample_rate = match head {
        Some(head) if head.input_sample_rate != 0 => head.input_sample_rate,
        _ => match track.sample_rate {
            Some(rate) if (1.0..=f64::from(u32::MAX)).contains(&rate) => rate.round() as u32,
            _ => 48_000,
        },
    };

    let pre_skip = match head {
        Some(head) if head.pre_skip != 0 => head.pre_skip,
        _ => match track.codec_delay {
            Some(delay) if delay != 0 => codec_delay_to_pre_skip(delay),
            _ => options.default_pre_skip,
        },
    };

    Ok(OpusStreamParams { channel_count, pre_skip, input_sample_rate })
}

/// Converts a codec delay in nanoseconds into 48 kHz samples, rounding to nearest.
fn codec_delay_to_pre_skip(delay: u64) -> u16 {
    let samples = (u128::from(delay) * 48 + 500_000) / 1_000_000;
    u16::try_from(samples).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use opusmux_core::errors::Error;
    use opusmux_core::options::RemuxOptions;
    use opusmux_format_mkv::{Lacing, RawBlock, TrackDescriptor, TrackType, WebmDocument};

    use super::{codec_delay_to_pre_skip, extract};

    fn track(number: u64, track_type: Option<TrackType>, codec_id: &str) -> TrackDescriptor {
        TrackDescriptor {
            number,
            track_type,
            codec_id: codec_id.to_string(),
            codec_private: None,
            codec_delay: None,
            seek_pre_roll: None,
            sample_rate: Some(48000.0),
            channels: Some(2),
            bit_depth: None,
        }
    }

    fn block(track: u64, timecode: i64, data: &[u8]) -> RawBlock<'_> {
        RawBlock { track, timecode, keyframe: true, lacing: Lacing::None, data }
    }

    fn doc<'a>(tracks: Vec<TrackDescriptor>, blocks: Vec<RawBlock<'a>>) -> WebmDocument<'a> {
        WebmDocument {
            doc_type: "webm".to_string(),
            timestamp_scale: 1_000_000,
            duration: None,
            tracks,
            blocks,
        }
    }

    #[test]
    fn verify_track_selection() {
        let options = RemuxOptions::default();
        let packet = [0xfc, 0x01];

        let video = doc(vec![track(1, Some(TrackType::Video), "V_VP9")], vec![]);
        assert_eq!(
            extract(&video, &options).unwrap_err(),
            Error::UnsupportedCodec("webm: no audio track")
        );

        let two = doc(
            vec![track(1, Some(TrackType::Audio), "A_OPUS"), track(2, None, "A_VORBIS")],
            vec![block(1, 0, &packet)],
        );
        assert!(matches!(extract(&two, &options), Err(Error::UnsupportedCodec(_))));

        let vorbis = doc(vec![track(1, Some(TrackType::Audio), "A_VORBIS")], vec![]);
        assert!(matches!(extract(&vorbis, &options), Err(Error::UnsupportedCodec(_))));

        let empty = doc(
            vec![track(1, Some(TrackType::Video), "V_VP8"), track(2, None, "A_OPUS")],
            vec![block(1, 0, &[1, 2, 3])],
        );
        assert!(matches!(extract(&empty, &options), Err(Error::InvalidContainer(_))));

        let mixed = doc(
            vec![track(1, Some(TrackType::Video), "V_VP8"), track(2, None, "A_OPUS")],
            vec![block(1, 0, &[1, 2, 3]), block(2, 0, &packet), block(1, 33, &[4])],
        );
        let stream = extract(&mixed, &options).unwrap();
        assert_eq!(stream.track, 2);
        assert_eq!(stream.packets.len(), 1);
        assert_eq!(stream.packets[0].samples, 960);
    }

    #[test]
    fn verify_stable_sort() {
        let (a, b, c) = ([0xfc, 1], [0xfc, 2], [0xfc, 3]);
        let doc = doc(
            vec![track(1, Some(TrackType::Audio), "A_OPUS")],
            vec![block(1, 40, &a), block(1, 20, &b), block(1, 20, &c)],
        );

        let stream = extract(&doc, &RemuxOptions::default()).unwrap();
        let order: Vec<&[u8]> = stream.packets.iter().map(|packet| packet.data).collect();
        assert_eq!(order, vec![&b[..], &c[..], &a[..]]);
    }

    #[test]
    fn verify_malformed_packet() {
        let doc = doc(
            vec![track(1, Some(TrackType::Audio), "A_OPUS")],
            vec![block(1, 0, &[0xfc, 1]), block(1, 20, &[])],
        );
        assert!(matches!(extract(&doc, &RemuxOptions::default()), Err(Error::MalformedPacket(_))));
    }

    #[test]
    fn verify_stream_params() {
        let packet = [0xfc, 0x01];
        let options = RemuxOptions { default_pre_skip: 100, ..Default::default() };

        // No codec private, no codec delay.
        let mut opus = track(1, Some(TrackType::Audio), "A_OPUS");
        opus.sample_rate = Some(44100.0);
        let stream = extract(&doc(vec![opus.clone()], vec![block(1, 0, &packet)]), &options)
            .unwrap();
        assert_eq!(stream.params.channel_count, 2);
        assert_eq!(stream.params.input_sample_rate, 44100);
        assert_eq!(stream.params.pre_skip, 100);

        // Codec delay of 6.5 ms.
        opus.codec_delay = Some(6_500_000);
        let stream = extract(&doc(vec![opus.clone()], vec![block(1, 0, &packet)]), &options)
            .unwrap();
        assert_eq!(stream.params.pre_skip, 312);

        // The OpusHead wins.
        let mut head = b"OpusHead".to_vec();
        head.extend_from_slice(&[1, 1]);
        head.extend_from_slice(&3840u16.to_le_bytes());
        head.extend_from_slice(&16000u32.to_le_bytes());
        head.extend_from_slice(&[0, 0, 0]);
        opus.codec_private = Some(head);
        let stream = extract(&doc(vec![opus.clone()], vec![block(1, 0, &packet)]), &options)
            .unwrap();
        assert_eq!(stream.params.channel_count, 1);
        assert_eq!(stream.params.input_sample_rate, 16000);
        assert_eq!(stream.params.pre_skip, 3840);

        opus.codec_private = Some(b"OpusTags".to_vec());
        assert!(matches!(
            extract(&doc(vec![opus], vec![block(1, 0, &packet)]), &options),
            Err(Error::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn verify_multistream_head_rejected() {
        let mut head = b"OpusHead".to_vec();
        head.extend_from_slice(&[1, 2]);
        head.extend_from_slice(&312u16.to_le_bytes());
        head.extend_from_slice(&48000u32.to_le_bytes());
        // Gain, family 1, two streams, no coupled streams, one mapping entry per channel.
        head.extend_from_slice(&[0, 0, 1, 2, 0, 0, 1]);

        let mut opus = track(1, Some(TrackType::Audio), "A_OPUS");
        opus.codec_private = Some(head);

        let packet = [0xfc, 0x01];
        assert_eq!(
            extract(&doc(vec![opus], vec![block(1, 0, &packet)]), &RemuxOptions::default())
                .unwrap_err(),
            Error::UnsupportedCodec("webm: opus channel mapping family is not 0")
        );
    }

    #[test]
    fn verify_codec_delay_rounding() {
        assert_eq!(codec_delay_to_pre_skip(6_500_000), 312);
        assert_eq!(codec_delay_to_pre_skip(10_000), 0);
        assert_eq!(codec_delay_to_pre_skip(11_000), 1);
        assert_eq!(codec_delay_to_pre_skip(u64::MAX), u16::MAX);
    }
}
