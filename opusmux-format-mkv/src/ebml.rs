// Opusmux
// Copyright (c) 2026 The Opusmux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use opusmux_core::errors::{corrupt_error, truncated_error, Result};
use opusmux_core::io::BufReader;

use crate::element_ids::{ElementType, Type, ELEMENTS};

/// Reads a single EBML element ID (as in RFC8794) from the stream
/// and returns its value and length in bytes (1-4 bytes), or an error.
pub(crate) fn read_tag(reader: &mut BufReader<'_>) -> Result<(u32, u32)> {
    let byte = reader.read_byte()?;
    let remaining_octets = byte.leading_zeros();
    if remaining_octets > 3 {
        return corrupt_error("mkv: invalid element id");
    }

    // Read remaining octets
    let mut vint = u32::from(byte);
    for _ in 0..remaining_octets {
        let byte = reader.read_byte()?;
        vint = (vint << 8) | u32::from(byte);
    }

    Ok((vint, remaining_octets + 1))
}

/// Reads an element data size. Returns `None` if the size is unknown.
pub(crate) fn read_size(reader: &mut BufReader<'_>) -> Result<Option<u64>> {
    let (size, len) = read_vint(reader)?;
    // All value bits set is reserved to signal an unknown size.
    if size == (1u64 << (7 * len)) - 1 {
        return Ok(None);
    }
    Ok(Some(size))
}

/// Reads a single unsigned variable size integer (as in RFC8794) from the stream
/// and returns it or an error.
pub(crate) fn read_unsigned_vint(reader: &mut BufReader<'_>) -> Result<u64> {
    Ok(read_vint(reader)?.0)
}

/// Reads a single signed variable size integer (as in RFC8794) from the stream
/// and returns it or an error.
pub(crate) fn read_signed_vint(reader: &mut BufReader<'_>) -> Result<i64> {
    let (value, len) = read_vint(reader)?;
    // Convert to a signed integer by range shifting.
    let half_range = (1i64 << ((len * 7) - 1)) - 1;
    Ok(value as i64 - half_range)
}

/// Reads a single unsigned variable size integer (as in RFC8794) from the stream
/// and returns both its value and length in octets, or an error.
fn read_vint(reader: &mut BufReader<'_>) -> Result<(u64, u32)> {
    let byte = reader.read_byte()?;
    if byte == 0 {
        return corrupt_error("mkv: invalid variable-size integer");
    }

    let vint_width = byte.leading_zeros();
    let mut vint = u64::from(byte);
    // Clear VINT_MARKER bit
    vint ^= 1 << (7 - vint_width);

    // Read remaining octets
    for _ in 0..vint_width {
        let byte = reader.read_byte()?;
        vint = (vint << 8) | u64::from(byte);
    }

    Ok((vint, vint_width + 1))
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct ElementHeader {
    /// The element tag.
    pub tag: u32,
    /// The element type.
    pub etype: ElementType,
    /// The element's data offset in the buffer.
    pub data_pos: usize,
    /// The size of the payload data, or `None` if the size is unknown.
    pub data_len: Option<u64>,
}

impl ElementHeader {
    /// Reads a single EBML element header from the stream.
    pub(crate) fn read(reader: &mut BufReader<'_>) -> Result<ElementHeader> {
        let (tag, _) = read_tag(reader)?;
        let data_len = read_size(reader)?;

        Ok(ElementHeader {
            tag,
            etype: ELEMENTS.get(&tag).map_or(ElementType::Unknown, |(_, etype)| *etype),
            data_pos: reader.pos(),
            data_len,
        })
    }

    /// Gets the payload shape of the element, or `None` if the element is unknown.
    fn shape(&self) -> Option<Type> {
        ELEMENTS.get(&self.tag).map(|(ty, _)| *ty)
    }

    /// Gets the position immediately past the last byte of the element, if its size is known.
    /// Sizes too large to address saturate so that they compare as past any real buffer.
    pub(crate) fn end(&self) -> Option<usize> {
        self.data_len.map(|len| {
            usize::try_from(len)
                .ok()
                .and_then(|len| self.data_pos.checked_add(len))
                .unwrap_or(usize::MAX)
        })
    }
}

/// An EBML element, as classified by the element table.
#[derive(Copy, Clone, Debug)]
pub(crate) enum EbmlElement<'a> {
    /// An element containing child elements. Its children are read with
    /// [`ElementIterator::read_master`], or skipped by continuing the iteration.
    Master(ElementHeader),
    /// An element with a primitive payload. Elements missing from the table are opaque leaves.
    Leaf(ElementHeader, &'a [u8]),
}

impl<'a> EbmlElement<'a> {
    pub(crate) fn header(&self) -> &ElementHeader {
        match self {
            EbmlElement::Master(header) | EbmlElement::Leaf(header, _) => header,
        }
    }

    pub(crate) fn etype(&self) -> ElementType {
        self.header().etype
    }

    /// Decodes the primitive data of the element according to its shape.
    pub(crate) fn data(&self) -> Result<ElementData<'a>> {
        let (header, data) = match *self {
            EbmlElement::Leaf(header, data) => (header, data),
            EbmlElement::Master(_) => return corrupt_error("mkv: element has no primitive data"),
        };

        Ok(match header.shape().unwrap_or(Type::Binary) {
            Type::Master => return corrupt_error("mkv: element has no primitive data"),
            Type::Unsigned => {
                if data.len() > 8 {
                    return corrupt_error("mkv: invalid unsigned integer length");
                }
                ElementData::UnsignedInt(be_uint(data))
            }
            Type::Float => {
                let value = match data.len() {
                    0 => 0.0,
                    4 => f32::from_be_bytes([data[0], data[1], data[2], data[3]]) as f64,
                    8 => {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(data);
                        f64::from_be_bytes(bytes)
                    }
                    _ => return corrupt_error("mkv: invalid float length"),
                };
                ElementData::Float(value)
            }
            Type::String => {
                let bytes = data.split(|b| *b == 0).next().unwrap_or(data);
                ElementData::String(String::from_utf8_lossy(bytes).into_owned())
            }
            Type::Binary => ElementData::Binary(data),
        })
    }

    /// Reads data of the element as an unsigned integer.
    pub(crate) fn read_u64(&self) -> Result<u64> {
        match self.data()? {
            ElementData::UnsignedInt(value) => Ok(value),
            _ => corrupt_error("mkv: expected an unsigned int"),
        }
    }

    /// Reads data of the element as a floating-point number.
    pub(crate) fn read_f64(&self) -> Result<f64> {
        match self.data()? {
            ElementData::Float(value) => Ok(value),
            _ => corrupt_error("mkv: expected a float"),
        }
    }

    /// Reads data of the element as a string.
    pub(crate) fn read_string(&self) -> Result<String> {
        match self.data()? {
            ElementData::String(value) => Ok(value),
            _ => corrupt_error("mkv: expected a string"),
        }
    }

    /// Reads binary data of the element.
    pub(crate) fn read_binary(&self) -> Result<&'a [u8]> {
        match self.data()? {
            ElementData::Binary(value) => Ok(value),
            _ => corrupt_error("mkv: expected binary data"),
        }
    }
}

fn be_uint(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// An EBML element data.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ElementData<'a> {
    /// A binary buffer.
    Binary(&'a [u8]),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An unsigned integer.
    UnsignedInt(u64),
}

/// A master element that can be read from its children.
pub(crate) trait Element<'a>: Sized {
    const ID: ElementType;

    /// Reads the element from an iterator over its children. Implementations must iterate until
    /// the iterator is exhausted.
    fn read(it: &mut ElementIterator<'a>) -> Result<Self>;
}

/// Iterates over sibling elements of one level of the EBML tree.
pub(crate) struct ElementIterator<'a> {
    /// The whole input buffer.
    buf: &'a [u8],
    /// Position of the next element header that would be read. May lie past the end of the
    /// buffer after skipping an element that is cut short.
    next_pos: usize,
    /// Position immediately past the last byte of the parent element, if known.
    end: Option<usize>,
    /// The type of the parent element if its size is unknown.
    open_parent: Option<ElementType>,
    /// A master element of unknown size that was returned, but not yet read.
    pending: Option<ElementHeader>,
}

impl<'a> ElementIterator<'a> {
    /// Creates a new iterator over the top-level elements of a buffer.
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        ElementIterator { buf, next_pos: 0, end: None, open_parent: None, pending: None }
    }

    /// Creates a new iterator over children of the given master element.
    fn children_of(&self, header: &ElementHeader) -> Self {
        ElementIterator {
            buf: self.buf,
            next_pos: header.data_pos,
            // An unknown-size element is still bounded by its parent.
            end: header.end().or(self.end),
            open_parent: if header.data_len.is_none() { Some(header.etype) } else { None },
            pending: None,
        }
    }

    /// Reads the next element at this level. Returns [None] if the parent element has no more
    /// children, or the top level reached the end of the buffer.
    pub(crate) fn next_element(&mut self) -> Result<Option<EbmlElement<'a>>> {
        if let Some(header) = self.pending.take() {
            log::debug!("unread element of unknown size {:?}", header);
            return corrupt_error("mkv: cannot skip an element of unknown size");
        }

        if let Some(end) = self.end {
            if self.next_pos >= end {
                return Ok(None);
            }
        }

        if self.next_pos > self.buf.len() {
            return truncated_error();
        }
        else if self.next_pos == self.buf.len() {
            // The parent element declared more data than the buffer holds.
            return if self.end.is_some() { truncated_error() } else { Ok(None) };
        }

        let header = ElementHeader::read(&mut BufReader::new_at(self.buf, self.next_pos))?;

        // An element that cannot be a child of an unknown-size parent terminates the parent. It
        // is left unread for the parent's own iterator.
        if let Some(parent) = self.open_parent {
            if header.etype.ends_unknown_sized(parent) {
                return Ok(None);
            }
        }

        let is_master = header.shape() == Some(Type::Master);

        let data_end = match header.end() {
            Some(data_end) => data_end,
            None if is_master => {
                self.next_pos = header.data_pos;
                self.pending = Some(header);
                return Ok(Some(EbmlElement::Master(header)));
            }
            None => return corrupt_error("mkv: element of unknown size is not a master element"),
        };

        if let Some(end) = self.end {
            if data_end > end {
                log::debug!("element {:?} overruns parent end={}", header, end);
                return corrupt_error("mkv: element overruns its parent");
            }
        }

        self.next_pos = data_end;

        if is_master {
            Ok(Some(EbmlElement::Master(header)))
        }
        else if data_end > self.buf.len() {
            truncated_error()
        }
        else {
            Ok(Some(EbmlElement::Leaf(header, &self.buf[header.data_pos..data_end])))
        }
    }

    /// Reads a master element from its children.
    pub(crate) fn read_master<E: Element<'a>>(&mut self, element: EbmlElement<'a>) -> Result<E> {
        let header = match element {
            EbmlElement::Master(header) => header,
            EbmlElement::Leaf(..) => return corrupt_error("mkv: expected a master element"),
        };

        // Ensure the EBML element header has the same element type as the one being read.
        if header.etype != E::ID {
            return corrupt_error("mkv: unexpected EBML element");
        }

        let mut children = self.children_of(&header);
        let value = E::read(&mut children)?;

        if header.data_len.is_none() {
            // An unknown-size element ends where its children end.
            self.pending = None;
            self.next_pos = children.next_pos;
        }

        Ok(value)
    }
}
