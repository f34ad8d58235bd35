//! ISO Base Media File Format encoding for the simulated track.

pub mod fragment;
pub mod init;
pub mod reader;
pub mod writer;

pub use fragment::{FragmentEncoder, SegmentFragments};
pub use init::build_init_segment;

pub const TRACK_ID: u32 = 1;

/// Sample entry type advertised by the init segment and the manifest.
pub const CODEC: &writer::FourCC = b"cwi1";

/// Size in bytes of the single sample each fragment carries.
pub const SAMPLE_SIZE: u32 = 8;

/// Filler stored in every `mdat`; players only read it back as an opaque frame.
pub const SAMPLE_PAYLOAD: [u8; SAMPLE_SIZE as usize] = 0x1122_3344_5566_7788u64.to_be_bytes();

/// sample_depends_on = 2 (does not depend on others): every sample is a sync sample.
pub const DEFAULT_SAMPLE_FLAGS: u32 = 0x0200_0000;
