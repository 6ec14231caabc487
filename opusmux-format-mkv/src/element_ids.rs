// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// The shape of an element's payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Type {
    Master,
    Unsigned,
    Binary,
    String,
    Float,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElementType {
    Ebml,
    EbmlVersion,
    EbmlReadVersion,
    EbmlMaxIdLength,
    EbmlMaxSizeLength,
    DocType,
    DocTypeVersion,
    DocTypeReadVersion,
    Crc32,
    Void,
    Segment,
    SeekHead,
    Info,
    TimestampScale,
    Duration,
    MuxingApp,
    WritingApp,
    Cluster,
    Timestamp,
    Position,
    PrevSize,
    SimpleBlock,
    BlockGroup,
    Block,
    BlockDuration,
    ReferenceBlock,
    DiscardPadding,
    Tracks,
    TrackEntry,
    TrackNumber,
    TrackUid,
    TrackType,
    FlagEnabled,
    FlagDefault,
    FlagLacing,
    DefaultDuration,
    Name,
    Language,
    CodecId,
    CodecPrivate,
    CodecName,
    CodecDelay,
    SeekPreRoll,
    Video,
    Audio,
    SamplingFrequency,
    OutputSamplingFrequency,
    Channels,
    BitDepth,
    Cues,
    Chapters,
    Tags,
    Attachments,
    /// Special type for unknown tags.
    Unknown,
}

impl ElementType {
    pub(crate) fn is_top_level(&self) -> bool {
        matches!(
            self,
            ElementType::SeekHead
                | ElementType::Info
                | ElementType::Tracks
                | ElementType::Cluster
                | ElementType::Cues
                | ElementType::Chapters
                | ElementType::Tags
                | ElementType::Attachments
        )
    }

    /// Returns true if an element of this type cannot be a child of an element of type `parent`,
    /// and therefore marks the end of `parent` when `parent` has an unknown size.
    pub(crate) fn ends_unknown_sized(&self, parent: ElementType) -> bool {
        match parent {
            ElementType::Segment => matches!(self, ElementType::Ebml | ElementType::Segment),
            ElementType::Cluster => {
                self.is_top_level() || matches!(self, ElementType::Ebml | ElementType::Segment)
            }
            _ => false,
        }
    }
}

lazy_static! {
    pub(crate) static ref ELEMENTS: HashMap<u32, (Type, ElementType)> = {
        let mut elems = HashMap::new();
        elems.insert(0x1A45DFA3, (Type::Master, ElementType::Ebml));
        elems.insert(0x4286, (Type::Unsigned, ElementType::EbmlVersion));
        elems.insert(0x42F7, (Type::Unsigned, ElementType::EbmlReadVersion));
        elems.insert(0x42F2, (Type::Unsigned, ElementType::EbmlMaxIdLength));
        elems.insert(0x42F3, (Type::Unsigned, ElementType::EbmlMaxSizeLength));
        elems.insert(0x4282, (Type::String, ElementType::DocType));
        elems.insert(0x4287, (Type::Unsigned, ElementType::DocTypeVersion));
        elems.insert(0x4285, (Type::Unsigned, ElementType::DocTypeReadVersion));
        elems.insert(0xBF, (Type::Binary, ElementType::Crc32));
        elems.insert(0xEC, (Type::Binary, ElementType::Void));
        elems.insert(0x18538067, (Type::Master, ElementType::Segment));
        elems.insert(0x114D9B74, (Type::Master, ElementType::SeekHead));
        elems.insert(0x1549A966, (Type::Master, ElementType::Info));
        elems.insert(0x2AD7B1, (Type::Unsigned, ElementType::TimestampScale));
        elems.insert(0x4489, (Type::Float, ElementType::Duration));
        elems.insert(0x4D80, (Type::String, ElementType::MuxingApp));
        elems.insert(0x5741, (Type::String, ElementType::WritingApp));
        elems.insert(0x1F43B675, (Type::Master, ElementType::Cluster));
        elems.insert(0xE7, (Type::Unsigned, ElementType::Timestamp));
        elems.insert(0xA7, (Type::Unsigned, ElementType::Position));
        elems.insert(0xAB, (Type::Unsigned, ElementType::PrevSize));
        elems.insert(0xA3, (Type::Binary, ElementType::SimpleBlock));
        elems.insert(0xA0, (Type::Master, ElementType::BlockGroup));
        elems.insert(0xA1, (Type::Binary, ElementType::Block));
        elems.insert(0x9B, (Type::Unsigned, ElementType::BlockDuration));
        elems.insert(0xFB, (Type::Binary, ElementType::ReferenceBlock));
        elems.insert(0x75A2, (Type::Binary, ElementType::DiscardPadding));
        elems.insert(0x1654AE6B, (Type::Master, ElementType::Tracks));
        elems.insert(0xAE, (Type::Master, ElementType::TrackEntry));
        elems.insert(0xD7, (Type::Unsigned, ElementType::TrackNumber));
        elems.insert(0x73C5, (Type::Unsigned, ElementType::TrackUid));
        elems.insert(0x83, (Type::Unsigned, ElementType::TrackType));
        elems.insert(0xB9, (Type::Unsigned, ElementType::FlagEnabled));
        elems.insert(0x88, (Type::Unsigned, ElementType::FlagDefault));
        elems.insert(0x9C, (Type::Unsigned, ElementType::FlagLacing));
        elems.insert(0x23E383, (Type::Unsigned, ElementType::DefaultDuration));
        elems.insert(0x536E, (Type::String, ElementType::Name));
        elems.insert(0x22B59C, (Type::String, ElementType::Language));
        elems.insert(0x86, (Type::String, ElementType::CodecId));
        elems.insert(0x63A2, (Type::Binary, ElementType::CodecPrivate));
        elems.insert(0x258688, (Type::String, ElementType::CodecName));
        elems.insert(0x56AA, (Type::Unsigned, ElementType::CodecDelay));
        elems.insert(0x56BB, (Type::Unsigned, ElementType::SeekPreRoll));
        elems.insert(0xE0, (Type::Master, ElementType::Video));
        elems.insert(0xE1, (Type::Master, ElementType::Audio));
        elems.insert(0xB5, (Type::Float, ElementType::SamplingFrequency));
        elems.insert(0x78B5, (Type::Float, ElementType::OutputSamplingFrequency));
        elems.insert(0x9F, (Type::Unsigned, ElementType::Channels));
        elems.insert(0x6264, (Type::Unsigned, ElementType::BitDepth));
        elems.insert(0x1C53BB6B, (Type::Master, ElementType::Cues));
        elems.insert(0x1043A770, (Type::Master, ElementType::Chapters));
        elems.insert(0x1254C367, (Type::Master, ElementType::Tags));
        elems.insert(0x1941A469, (Type::Master, ElementType::Attachments));
        elems
    };
}

/// The EBML header element ID as it appears at the start of every WebM/Matroska file.
pub(crate) const EBML_HEADER_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
