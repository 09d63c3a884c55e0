//! Ghost replay: record the paddle track of a run, play back the last one

use serde::{Deserialize, Serialize};

use crate::consts::{GHOST_MIN_SAMPLES, GHOST_SAMPLE_INTERVAL_MS};

/// One recorded paddle position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhostSample {
    /// Seconds since run start
    pub t: f32,
    /// Paddle left edge
    pub x: f32,
}

/// A finished run's paddle track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GhostTrace {
    pub samples: Vec<GhostSample>,
}

impl GhostTrace {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Paddle x at `t`: the first sample at or after `t`, else the last one
    pub fn position_at(&self, t: f32) -> Option<f32> {
        self.samples
            .iter()
            .find(|s| s.t >= t)
            .or_else(|| self.samples.last())
            .map(|s| s.x)
    }

    /// Reject traces that could not have come from a real run
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.samples.is_empty() {
            return Err("no samples");
        }
        if self
            .samples
            .iter()
            .any(|s| !s.t.is_finite() || !s.x.is_finite())
        {
            return Err("non-finite sample");
        }
        if self.samples.windows(2).any(|w| w[1].t < w[0].t) {
            return Err("samples out of order");
        }
        Ok(())
    }
}

/// Rate-limited sampler for the current run
#[derive(Debug, Clone, Default)]
pub struct GhostRecorder {
    samples: Vec<GhostSample>,
    /// Tick timestamp of the last kept sample (ms)
    last_sample_ms: Option<f64>,
}

impl GhostRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Keep a sample if more than the sampling interval has passed
    pub fn record(&mut self, now_ms: f64, elapsed_secs: f32, x: f32) -> bool {
        if let Some(last) = self.last_sample_ms {
            if now_ms - last <= GHOST_SAMPLE_INTERVAL_MS {
                return false;
            }
        }
        self.samples.push(GhostSample { t: elapsed_secs, x });
        self.last_sample_ms = Some(now_ms);
        true
    }

    /// Close the recording. Short runs are dropped.
    pub fn finish(&mut self) -> Option<GhostTrace> {
        let samples = std::mem::take(&mut self.samples);
        self.last_sample_ms = None;
        if samples.len() > GHOST_MIN_SAMPLES {
            Some(GhostTrace { samples })
        } else {
            None
        }
    }
}
