//! Movie fragments (`moof` + `mdat`) carrying one synthetic sample each.

use super::writer::BoxWriter;
use super::{DEFAULT_SAMPLE_FLAGS, SAMPLE_PAYLOAD, SAMPLE_SIZE, TRACK_ID};
use crate::timing::Timing;
use bytes::Bytes;

// tfhd flags
const DEFAULT_BASE_IS_MOOF: u32 = 0x020000;
const DEFAULT_SAMPLE_DURATION_PRESENT: u32 = 0x000008;
const DEFAULT_SAMPLE_SIZE_PRESENT: u32 = 0x000010;
const DEFAULT_SAMPLE_FLAGS_PRESENT: u32 = 0x000020;

// trun flags
const DATA_OFFSET_PRESENT: u32 = 0x000001;
const SAMPLE_SIZE_PRESENT: u32 = 0x000200;

const MDAT_HEADER_SIZE: usize = 8;

/// Encodes the fragments of the simulated track. Output depends only on the
/// fragment index and the timing profile.
#[derive(Debug, Clone, Copy)]
pub struct FragmentEncoder {
    timing: Timing,
}

impl FragmentEncoder {
    pub fn new(timing: Timing) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Encodes fragment `index`. The `mfhd` sequence number is the index truncated
    /// to 32 bits; the decode time keeps the full 64 bits. `None` when the decode
    /// time does not fit.
    pub fn encode_fragment(&self, index: u64) -> Option<Bytes> {
        let decode_time = self.timing.decode_time(index)?;
        let mut w = BoxWriter::with_capacity(128);
        let mut data_offset_at = 0;

        let moof = w.write_box(b"moof", |w| {
            w.write_full_box(b"mfhd", 0, 0, |w| w.put_u32(index as u32));
            w.write_box(b"traf", |w| {
                let flags = DEFAULT_BASE_IS_MOOF
                    | DEFAULT_SAMPLE_DURATION_PRESENT
                    | DEFAULT_SAMPLE_SIZE_PRESENT
                    | DEFAULT_SAMPLE_FLAGS_PRESENT;
                w.write_full_box(b"tfhd", 0, flags, |w| {
                    w.put_u32(TRACK_ID);
                    w.put_u32(self.timing.fragment_duration() as u32);
                    w.put_u32(SAMPLE_SIZE);
                    w.put_u32(DEFAULT_SAMPLE_FLAGS);
                });
                w.write_full_box(b"tfdt", 1, 0, |w| w.put_u64(decode_time));
                w.write_full_box(b"trun", 0, DATA_OFFSET_PRESENT | SAMPLE_SIZE_PRESENT, |w| {
                    w.put_u32(1); // sample_count
                    data_offset_at = w.position();
                    w.put_i32(0);
                    w.put_u32(SAMPLE_SIZE);
                });
            });
        });

        // relative to the first byte of moof, which starts this buffer
        w.patch_u32(data_offset_at, (moof + MDAT_HEADER_SIZE) as u32);

        w.write_box(b"mdat", |w| w.put_slice(&SAMPLE_PAYLOAD));
        Some(w.freeze())
    }

    /// Lazily encodes the fragments of segment `n`, in decode order. `None` when
    /// the segment's fragment indexes or decode times overflow.
    pub fn encode_segment(&self, n: u64) -> Option<SegmentFragments> {
        let first = self.timing.first_fragment(n)?;
        Some(SegmentFragments {
            encoder: *self,
            next: first,
            end: first + self.timing.fragments_per_segment(),
        })
    }
}

/// Iterator over the fragments of one segment; each is encoded on demand.
#[derive(Debug, Clone)]
pub struct SegmentFragments {
    encoder: FragmentEncoder,
    next: u64,
    end: u64,
}

impl Iterator for SegmentFragments {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let fragment = self.encoder.encode_fragment(self.next)?;
        self.next += 1;
        Some(fragment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SegmentFragments {}
