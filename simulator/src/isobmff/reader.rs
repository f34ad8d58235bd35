//! Zero-copy box tree reader, used to inspect what the encoder produced.

use super::writer::FourCC;
use std::fmt;

/// Boxes whose payload is a sequence of child boxes.
const CONTAINERS: [&FourCC; 10] = [
    b"moov", b"trak", b"mdia", b"minf", b"dinf", b"stbl", b"mvex", b"moof", b"traf", b"edts",
];

/// Number of bytes between a container's header and its first child.
fn child_offset(kind: &FourCC) -> Option<usize> {
    match kind {
        // full boxes carrying an entry count before the entries
        b"dref" | b"stsd" => Some(8),
        k if CONTAINERS.contains(&k) => Some(0),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    Truncated { offset: usize },
    BadSize { offset: usize, size: u32 },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Truncated { offset } => write!(f, "truncated box header at {}", offset),
            ReadError::BadSize { offset, size } => {
                write!(f, "box at {} declares invalid size {}", offset, size)
            }
        }
    }
}

impl std::error::Error for ReadError {}

/// A box located inside a buffer. `payload` excludes the 8-byte header.
#[derive(Debug, Clone, Copy)]
pub struct BoxRef<'a> {
    pub kind: FourCC,
    pub offset: usize,
    pub size: usize,
    pub payload: &'a [u8],
}

impl<'a> BoxRef<'a> {
    pub fn kind_str(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }

    /// Children of a known container box, or an empty list for leaf boxes.
    pub fn children(&self) -> Result<Vec<BoxRef<'a>>, ReadError> {
        match child_offset(&self.kind) {
            Some(skip) if self.payload.len() >= skip => {
                parse_boxes_at(&self.payload[skip..], self.offset + 8 + skip)
            }
            Some(_) => Err(ReadError::Truncated {
                offset: self.offset + 8,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Version and flags of a full box.
    pub fn full_header(&self) -> Option<(u8, u32)> {
        let word = read_u32(self.payload, 0)?;
        Some(((word >> 24) as u8, word & 0x00ff_ffff))
    }
}

/// Splits `data` into consecutive sibling boxes. Every declared size must fit the
/// buffer exactly; trailing bytes are an error.
pub fn parse_boxes(data: &[u8]) -> Result<Vec<BoxRef<'_>>, ReadError> {
    parse_boxes_at(data, 0)
}

fn parse_boxes_at(data: &[u8], base: usize) -> Result<Vec<BoxRef<'_>>, ReadError> {
    let mut boxes = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let offset = base + pos;
        if data.len() - pos < 8 {
            return Err(ReadError::Truncated { offset });
        }

        let declared = read_u32(data, pos).ok_or(ReadError::Truncated { offset })?;
        let size = declared as usize;
        if size < 8 || size > data.len() - pos {
            return Err(ReadError::BadSize {
                offset,
                size: declared,
            });
        }

        let mut kind = [0u8; 4];
        kind.copy_from_slice(&data[pos + 4..pos + 8]);
        boxes.push(BoxRef {
            kind,
            offset,
            size,
            payload: &data[pos + 8..pos + size],
        });
        pos += size;
    }

    Ok(boxes)
}

/// Finds the first box matching a path of types, e.g. `[b"moof", b"traf", b"tfdt"]`.
pub fn find<'a>(data: &'a [u8], path: &[&FourCC]) -> Result<Option<BoxRef<'a>>, ReadError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(None);
    };

    let mut current = match parse_boxes(data)?.into_iter().find(|b| &&b.kind == first) {
        Some(b) => b,
        None => return Ok(None),
    };

    for kind in rest {
        match current.children()?.into_iter().find(|b| &&b.kind == kind) {
            Some(b) => current = b,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

/// Validates the whole tree and renders it as an indented listing.
pub fn describe(data: &[u8]) -> Result<String, ReadError> {
    let mut out = String::new();
    for b in parse_boxes(data)? {
        describe_box(&b, 0, &mut out)?;
    }
    Ok(out)
}

fn describe_box(b: &BoxRef<'_>, depth: usize, out: &mut String) -> Result<(), ReadError> {
    out.push_str(&format!(
        "{:indent$}{} size={} offset={}\n",
        "",
        b.kind_str(),
        b.size,
        b.offset,
        indent = depth * 2
    ));
    for child in b.children()? {
        describe_box(&child, depth + 1, out)?;
    }
    Ok(())
}

pub fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

pub fn read_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes = data.get(at..at.checked_add(8)?)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}
