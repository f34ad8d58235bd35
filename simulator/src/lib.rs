//! Live MPEG-DASH origin simulator: a dynamic manifest, an init segment and
//! segments synthesized on demand that only become available once the wall
//! clock reaches their start time.

pub mod api;
pub mod availability;
pub mod cgi;
pub mod chunked;
pub mod config;
pub mod error;
pub mod isobmff;
pub mod manifest;
pub mod router;
pub mod simulator;
pub mod timing;
