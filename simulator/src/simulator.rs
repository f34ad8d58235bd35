use crate::availability::{Admission, AvailabilityGate, Clock};
use crate::config::Settings;
use crate::error::SimulatorError;
use crate::isobmff::{build_init_segment, FragmentEncoder, SegmentFragments};
use crate::manifest::build_manifest;
use crate::router::Route;
use crate::timing::Timing;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to answer a request: the memoized manifest and init
/// segment, the fragment encoder and the availability gate.
#[derive(Clone)]
pub struct Simulator {
    timing: Timing,
    manifest: Bytes,
    init: Bytes,
    encoder: FragmentEncoder,
    gate: AvailabilityGate,
}

/// What to send back for a routed request.
pub enum Reply {
    Manifest(Bytes),
    Init(Bytes),
    /// Fragments of `segment`, to be sent once `delay` has elapsed.
    Segment {
        segment: u64,
        delay: Duration,
        fragments: SegmentFragments,
    },
    TooEarly {
        segment: u64,
        delay: Duration,
    },
    NotFound,
}

impl Simulator {
    pub fn new(timing: Timing, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            timing,
            manifest: build_manifest(&timing),
            init: build_init_segment(&timing),
            encoder: FragmentEncoder::new(timing),
            gate: AvailabilityGate::new(timing, clock),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, SimulatorError> {
        let timing = settings.timing.build()?;
        let mut simulator = Self::new(timing, clock);
        simulator.gate = simulator
            .gate
            .with_max_wait(settings.availability.max_wait);
        Ok(simulator)
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn gate(&self) -> &AvailabilityGate {
        &self.gate
    }

    pub fn encoder(&self) -> &FragmentEncoder {
        &self.encoder
    }

    pub fn manifest(&self) -> Bytes {
        self.manifest.clone()
    }

    pub fn init_segment(&self) -> Bytes {
        self.init.clone()
    }

    /// Resolves a route against the current wall clock. No bytes are encoded
    /// for segments until the returned iterator is polled.
    pub fn reply(&self, route: Route) -> Reply {
        match route {
            Route::Manifest => Reply::Manifest(self.manifest()),
            Route::Init => Reply::Init(self.init_segment()),
            Route::Segment(segment) => {
                let Some(fragments) = self.encoder.encode_segment(segment) else {
                    return Reply::NotFound;
                };
                if self.timing.segment_start(segment).is_none() {
                    return Reply::NotFound;
                }

                match self.gate.admit(segment) {
                    Admission::Wait(delay) => Reply::Segment {
                        segment,
                        delay,
                        fragments,
                    },
                    Admission::TooEarly(delay) => Reply::TooEarly { segment, delay },
                }
            }
            Route::NotFound => Reply::NotFound,
        }
    }
}
