//! Per-frame brightness statistics and the admission gate.
//!
//! Statistics are recomputed for every captured frame in a single linear
//! pass over the full-resolution plane. The gate then decides whether the
//! frame is worth the downstream resample/normalize/classify work.
//!
//! The gate is deliberately asymmetric: it rejects only degenerate
//! all-black frames and tolerates everything brighter, because the
//! deployment favors low-light usability over daytime-only admission.

use crate::plane::LumaPlane;

/// min/max/sum/mean over a byte plane. Ephemeral, one per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneStats {
    pub min: u8,
    pub max: u8,
    pub sum: u64,
    pub mean: u8,
}

impl PlaneStats {
    /// Single-pass stats. `mean` is truncating integer division.
    ///
    /// The `u64` accumulator cannot overflow for any plane addressable on
    /// this target (`count * 255` always fits).
    pub fn compute(plane: &LumaPlane) -> Self {
        let mut min = 255u8;
        let mut max = 0u8;
        let mut sum = 0u64;

        for &v in plane.as_slice() {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
            sum += u64::from(v);
        }

        let mean = (sum / plane.len() as u64) as u8;
        Self { min, max, sum, mean }
    }
}

/// Accept/reject policy applied before any expensive processing.
#[derive(Clone, Copy, Debug)]
pub struct GatePolicy {
    /// Frames with `mean` strictly below this floor are rejected.
    pub dark_floor: u8,
}

impl GatePolicy {
    pub fn new(dark_floor: u8) -> Self {
        Self { dark_floor }
    }

    /// True when the frame should proceed to resampling.
    ///
    /// The boundary is inclusive on the accept side: `mean == dark_floor`
    /// admits.
    pub fn admit(&self, stats: &PlaneStats) -> bool {
        stats.mean >= self.dark_floor
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        // Empirical floor for the target sensor: reject only absolute
        // zero-noise frames.
        Self { dark_floor: 2 }
    }
}
