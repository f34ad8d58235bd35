//! Initialization segment: `ftyp` + `moov` for a single fragmented video track.

use super::writer::BoxWriter;
use super::{CODEC, DEFAULT_SAMPLE_FLAGS, SAMPLE_SIZE, TRACK_ID};
use crate::timing::{Timing, TIMESCALE};
use bytes::Bytes;

const UNITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

// ISO 639-2 "und", packed as three 5-bit letters
const LANGUAGE_UND: u16 = 0x55c4;

const HANDLER_NAME: &[u8] = b"Simulated Video Handler\0";

pub fn build_init_segment(timing: &Timing) -> Bytes {
    let mut w = BoxWriter::with_capacity(640);
    let ftyp = write_ftyp(&mut w);
    let moov = w.write_box(b"moov", |w| {
        write_mvhd(w);
        write_trak(w);
        write_mvex(w, timing);
    });

    let data = w.freeze();
    assert_eq!(data.len(), ftyp + moov, "init segment size mismatch");
    data
}

fn write_ftyp(w: &mut BoxWriter) -> usize {
    w.write_box(b"ftyp", |w| {
        w.put_slice(b"isom"); // major brand
        w.put_u32(1); // minor version
        w.put_slice(b"isom");
        w.put_slice(b"dash");
    })
}

fn write_mvhd(w: &mut BoxWriter) {
    w.write_full_box(b"mvhd", 0, 0, |w| {
        w.put_u32(0); // creation time
        w.put_u32(0); // modification time
        w.put_u32(TIMESCALE);
        w.put_u32(0); // duration, unknown for live
        w.put_u32(0x0001_0000); // rate 1.0
        w.put_u16(0x0100); // volume 1.0
        w.put_zeros(2 + 8);
        for value in UNITY_MATRIX {
            w.put_u32(value);
        }
        w.put_zeros(24); // pre_defined
        w.put_u32(TRACK_ID + 1); // next_track_ID
    });
}

fn write_trak(w: &mut BoxWriter) {
    w.write_box(b"trak", |w| {
        // flags: track_enabled
        w.write_full_box(b"tkhd", 0, 0x000001, |w| {
            w.put_u32(0);
            w.put_u32(0);
            w.put_u32(TRACK_ID);
            w.put_u32(0);
            w.put_u32(0); // duration
            w.put_zeros(8);
            w.put_u16(0); // layer
            w.put_u16(0); // alternate group
            w.put_u16(0); // volume, zero for video
            w.put_u16(0);
            for value in UNITY_MATRIX {
                w.put_u32(value);
            }
            w.put_u32(0); // width, 16.16
            w.put_u32(0); // height, 16.16
        });
        w.write_box(b"mdia", |w| {
            w.write_full_box(b"mdhd", 0, 0, |w| {
                w.put_u32(0);
                w.put_u32(0);
                w.put_u32(TIMESCALE);
                w.put_u32(0);
                w.put_u16(LANGUAGE_UND);
                w.put_u16(0);
            });
            w.write_full_box(b"hdlr", 0, 0, |w| {
                w.put_u32(0);
                w.put_slice(b"vide");
                w.put_zeros(12);
                w.put_slice(HANDLER_NAME);
            });
            write_minf(w);
        });
    });
}

fn write_minf(w: &mut BoxWriter) {
    w.write_box(b"minf", |w| {
        w.write_full_box(b"vmhd", 0, 0x000001, |w| {
            w.put_u16(0); // graphicsmode
            w.put_zeros(6); // opcolor
        });
        w.write_box(b"dinf", |w| {
            w.write_full_box(b"dref", 0, 0, |w| {
                w.put_u32(1);
                // flags: media data is in the same file
                w.write_full_box(b"url ", 0, 0x000001, |_| {});
            });
        });
        w.write_box(b"stbl", |w| {
            write_stsd(w);
            // samples live in the fragments, every table stays empty
            for kind in [b"stts", b"stss", b"stsc"] {
                w.write_full_box(kind, 0, 0, |w| w.put_u32(0));
            }
            w.write_full_box(b"stsz", 0, 0, |w| {
                w.put_u32(0);
                w.put_u32(0);
            });
            w.write_full_box(b"stco", 0, 0, |w| w.put_u32(0));
        });
    });
}

fn write_stsd(w: &mut BoxWriter) {
    w.write_full_box(b"stsd", 0, 0, |w| {
        w.put_u32(1);
        // placeholder visual sample entry, the payload is not real video
        w.write_box(CODEC, |w| {
            w.put_zeros(6);
            w.put_u16(1); // data_reference_index
            w.put_zeros(16); // pre_defined + reserved
            w.put_u16(0); // width
            w.put_u16(0); // height
            w.put_u32(0x0048_0000); // 72 dpi
            w.put_u32(0x0048_0000);
            w.put_u32(0);
            w.put_u16(1); // frame_count
            w.put_zeros(32); // compressorname
            w.put_u16(0x0018); // depth
            w.put_u16(0xffff); // pre_defined = -1
        });
    });
}

fn write_mvex(w: &mut BoxWriter, timing: &Timing) {
    w.write_box(b"mvex", |w| {
        w.write_full_box(b"mehd", 0, 0, |w| w.put_u32(0));
        w.write_full_box(b"trex", 0, 0, |w| {
            w.put_u32(TRACK_ID);
            w.put_u32(1); // sample description index
            w.put_u32(timing.fragment_duration() as u32);
            w.put_u32(SAMPLE_SIZE);
            w.put_u32(DEFAULT_SAMPLE_FLAGS);
        });
    });
}
