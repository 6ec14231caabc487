// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ogg container pages: a writer that packs packets into check-summed pages, the Opus mapping that
//! lays out an Ogg Opus stream, and a reader used to verify the result.

pub mod mappings;
pub mod page;
pub mod reader;
pub mod writer;

pub use mappings::opus::{write_opus_stream, OpusStreamParams};
pub use page::{Page, PageFlags, PageHeader, OGG_PAGE_MAX_SIZE};
pub use reader::{read_packets, read_pages, OggPacket};
pub use writer::{OggWriter, WriterOptions};
