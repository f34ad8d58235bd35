use crate::error::SimulatorError;
use std::time::Duration;

/// Track timescale shared by the init segment, the fragments and the manifest.
/// All durations below are expressed in this unit (milliseconds).
pub const TIMESCALE: u32 = 1000;

/// Segment and fragment durations of the simulated live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    segment_duration: u64,
    fragment_duration: u64,
}

impl Timing {
    pub fn new(segment_duration: u64, fragment_duration: u64) -> Result<Self, SimulatorError> {
        if segment_duration == 0 || fragment_duration == 0 {
            return Err(SimulatorError::ConfigError(
                "segment and fragment durations must be positive".to_string(),
            ));
        }

        if segment_duration > u32::MAX as u64 {
            return Err(SimulatorError::ConfigError(format!(
                "segment duration {}ms does not fit a 32-bit template duration",
                segment_duration
            )));
        }

        if fragment_duration > u32::MAX as u64 {
            return Err(SimulatorError::ConfigError(format!(
                "fragment duration {}ms does not fit a 32-bit sample duration",
                fragment_duration
            )));
        }

        if segment_duration % fragment_duration != 0 {
            return Err(SimulatorError::ConfigError(format!(
                "segment duration {}ms is not a multiple of fragment duration {}ms",
                segment_duration, fragment_duration
            )));
        }

        Ok(Self {
            segment_duration,
            fragment_duration,
        })
    }

    /// Builds a timing profile from wall-clock durations. Both must be whole
    /// milliseconds.
    pub fn from_durations(segment: Duration, fragment: Duration) -> Result<Self, SimulatorError> {
        Self::new(whole_millis(segment)?, whole_millis(fragment)?)
    }

    pub fn segment_duration(&self) -> u64 {
        self.segment_duration
    }

    pub fn fragment_duration(&self) -> u64 {
        self.fragment_duration
    }

    pub fn fragments_per_segment(&self) -> u64 {
        self.segment_duration / self.fragment_duration
    }

    /// Nominal start of segment `n` in milliseconds since the epoch, `None` on overflow.
    pub fn segment_start(&self, n: u64) -> Option<u64> {
        n.checked_mul(self.segment_duration)
    }

    /// Global index of the first fragment of segment `n`. `None` unless every
    /// fragment of the segment has an index and a decode time that fit in u64.
    pub fn first_fragment(&self, n: u64) -> Option<u64> {
        let first = n.checked_mul(self.fragments_per_segment())?;
        let last = first.checked_add(self.fragments_per_segment() - 1)?;
        self.decode_time(last)?;
        Some(first)
    }

    /// Decode time of fragment `i`, in timescale units. `None` on overflow.
    pub fn decode_time(&self, i: u64) -> Option<u64> {
        i.checked_mul(self.fragment_duration)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            segment_duration: 1000,
            fragment_duration: 200,
        }
    }
}

fn whole_millis(duration: Duration) -> Result<u64, SimulatorError> {
    if duration.subsec_nanos() % 1_000_000 != 0 {
        return Err(SimulatorError::ConfigError(format!(
            "duration {:?} is not a whole number of milliseconds",
            duration
        )));
    }

    u64::try_from(duration.as_millis())
        .map_err(|_| SimulatorError::ConfigError(format!("duration {:?} is too long", duration)))
}
