// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::info;

use opusmux_codec_opus::{GranulePacket, OpusHead, OpusTags};
use opusmux_core::errors::{writer_error, Result};

use crate::writer::{OggWriter, WriterOptions};

/// The parameters of an Opus stream that go into its identification header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpusStreamParams {
    pub channel_count: u64,
    /// Samples at 48 kHz the decoder discards from the start of the stream.
    pub pre_skip: u16,
    /// The sample rate of the original input, in Hz.
    pub input_sample_rate: u32,
}

impl OpusStreamParams {
    /// Builds the identification header for channel mapping family 0, which covers mono and
    /// stereo streams only.
    fn to_head(&self) -> Result<OpusHead> {
        let channel_count = match self.channel_count {
            1 | 2 => self.channel_count as u8,
            _ => return writer_error("ogg: channel count must be 1 or 2 for mapping family 0"),
        };

        if self.input_sample_rate == 0 {
            return writer_error("ogg: input sample rate must be non-zero");
        }

        Ok(OpusHead::new(channel_count, self.pre_skip, self.input_sample_rate))
    }
}

/// Writes a complete Ogg Opus logical stream.
///
/// The identification header is alone on page 0 (the beginning-of-stream page), the comment
/// header on page 1, and audio data starts on page 2. The last page carries the end-of-stream flag.
pub fn write_opus_stream(
    params: &OpusStreamParams,
    tags: &OpusTags,
    packets: &[GranulePacket<'_>],
    options: &WriterOptions,
) -> Result<Vec<u8>> {
    let head = params.to_head()?;

    let mut writer = OggWriter::new(*options);
    writer.write_header_packet(&head.to_bytes());
    writer.write_header_packet(&tags.to_bytes());

    for packet in packets {
        writer.write_packet(packet.data, packet.end_granule)?;
    }

    let buf = writer.finish();

    info!(
        "ogg opus stream: serial={:#010x}, channels={}, pre_skip={}, packets={}, granule={}, \
         {} bytes",
        options.serial,
        head.channel_count,
        head.pre_skip,
        packets.len(),
        packets.last().map_or(0, |packet| packet.end_granule),
        buf.len()
    );

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use opusmux_codec_opus::{GranulePacket, OpusTags};
    use opusmux_core::errors::Error;

    use super::{write_opus_stream, OpusStreamParams};
    use crate::reader::read_pages;
    use crate::writer::WriterOptions;

    const PARAMS: OpusStreamParams =
        OpusStreamParams { channel_count: 2, pre_skip: 312, input_sample_rate: 48000 };

    #[test]
    fn verify_header_pages() {
        let data = [0xfc, 0x00];
        let packets = [GranulePacket { data: &data, samples: 960, end_granule: 960 }];

        let buf = write_opus_stream(
            &PARAMS,
            &OpusTags::new("opusmux"),
            &packets,
            &WriterOptions::new(0xdead_beef),
        )
        .unwrap();

        let pages = read_pages(&buf).unwrap();
        assert_eq!(pages.len(), 3);

        assert!(pages[0].header.is_first_page());
        assert_eq!(pages[0].header.absgp, 0);
        assert_eq!(pages[0].segment_table, &[19]);
        assert_eq!(&pages[0].body[..8], b"OpusHead");
        assert_eq!(&pages[0].body[10..12], &312u16.to_le_bytes());

        assert!(!pages[1].header.is_first_page());
        assert_eq!(pages[1].header.absgp, 0);
        assert_eq!(pages[1].header.sequence, 1);
        assert_eq!(&pages[1].body[..8], b"OpusTags");

        assert!(pages[2].header.is_last_page());
        assert_eq!(pages[2].header.sequence, 2);
        assert_eq!(pages[2].header.absgp, 960);
        assert_eq!(pages[2].body, &data);

        assert!(pages.iter().all(|page| page.header.serial == 0xdead_beef));
    }

    #[test]
    fn verify_invalid_params() {
        let options = WriterOptions::new(1);
        let tags = OpusTags::default();

        for channel_count in [0, 3, 8] {
            let params = OpusStreamParams { channel_count, ..PARAMS };
            assert!(matches!(
                write_opus_stream(&params, &tags, &[], &options),
                Err(Error::WriterFailure(_))
            ));
        }

        let params = OpusStreamParams { input_sample_rate: 0, ..PARAMS };
        assert!(matches!(
            write_opus_stream(&params, &tags, &[], &options),
            Err(Error::WriterFailure(_))
        ));
    }
}
