use crate::isobmff::CODEC;
use crate::timing::{Timing, TIMESCALE};
use bytes::Bytes;

pub const MANIFEST_PATH: &str = "/latency.mpd";
pub const INIT_NAME: &str = "init.mp4";
pub const MEDIA_SUFFIX: &str = ".m4s";

const TIME_SHIFT_BUFFER_DEPTH: &str = "PT5M";
const BANDWIDTH: u32 = 300_000;

/// Renders the MPD advertised to players. The document describes a policy (any
/// segment number past the epoch can be requested) rather than an actual window,
/// so it never changes for a given timing profile.
pub fn build_manifest(timing: &Timing) -> Bytes {
    let codec = String::from_utf8_lossy(CODEC);
    let mpd = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<MPD
  xmlns="urn:mpeg:dash:schema:mpd:2011"
  profiles="urn:mpeg:dash:profile:isoff-live:2011"
  availabilityStartTime="1970-01-01T00:00:00Z"
  minBufferTime="{min_buffer}"
  maxSegmentDuration="{max_segment}"
  timeShiftBufferDepth="{depth}"
  type="dynamic">
  <Period id="p0" start="PT0S">
    <AdaptationSet contentType="video" mimeType="video/mp4" segmentAlignment="true" startWithSAP="1">
      <SegmentTemplate
        timescale="{timescale}" duration="{duration}"
        initialization="{init}"
        media="$Number${suffix}"
        startNumber="0" />
      <Representation bandwidth="{bandwidth}" codecs="{codec}" id="1" />
    </AdaptationSet>
  </Period>
</MPD>
"#,
        min_buffer = iso8601_duration(timing.fragment_duration()),
        max_segment = iso8601_duration(timing.segment_duration()),
        depth = TIME_SHIFT_BUFFER_DEPTH,
        timescale = TIMESCALE,
        duration = timing.segment_duration(),
        init = INIT_NAME,
        suffix = MEDIA_SUFFIX,
        bandwidth = BANDWIDTH,
        codec = codec,
    );

    Bytes::from(mpd)
}

/// Formats milliseconds as an `xs:duration`, e.g. `PT1S` or `PT0.2S`.
fn iso8601_duration(ms: u64) -> String {
    let (secs, millis) = (ms / 1000, ms % 1000);
    if millis == 0 {
        return format!("PT{}S", secs);
    }

    let fraction = format!("{:03}", millis);
    format!("PT{}.{}S", secs, fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(timing: &Timing) -> String {
        String::from_utf8(build_manifest(timing).to_vec()).unwrap()
    }

    #[test]
    fn advertises_dynamic_live_profile() {
        let mpd = text(&Timing::default());
        assert!(mpd.starts_with("<?xml"));
        assert!(mpd.contains(r#"type="dynamic""#));
        assert!(mpd.contains(r#"availabilityStartTime="1970-01-01T00:00:00Z""#));
        assert!(mpd.contains(r#"maxSegmentDuration="PT1S""#));
        assert!(mpd.contains(r#"timeShiftBufferDepth="PT5M""#));
        assert!(mpd.contains(r#"<Period id="p0" start="PT0S">"#));
        assert!(mpd.contains(r#"timescale="1000" duration="1000""#));
        assert!(mpd.contains(r#"startNumber="0""#));
        assert!(mpd.contains(r#"initialization="init.mp4""#));
        assert!(mpd.contains(r#"media="$Number$.m4s""#));
        assert!(mpd.contains(r#"codecs="cwi1""#));
    }

    #[test]
    fn byte_identical_across_calls() {
        let timing = Timing::default();
        assert_eq!(build_manifest(&timing), build_manifest(&timing));
    }

    #[test]
    fn follows_timing_profile() {
        let mpd = text(&Timing::new(2000, 500).unwrap());
        assert!(mpd.contains(r#"maxSegmentDuration="PT2S""#));
        assert!(mpd.contains(r#"duration="2000""#));
        assert!(mpd.contains(r#"minBufferTime="PT0.5S""#));
    }

    #[test]
    fn formats_durations() {
        assert_eq!(iso8601_duration(0), "PT0S");
        assert_eq!(iso8601_duration(1000), "PT1S");
        assert_eq!(iso8601_duration(200), "PT0.2S");
        assert_eq!(iso8601_duration(1250), "PT1.25S");
        assert_eq!(iso8601_duration(90_005), "PT90.005S");
    }
}
