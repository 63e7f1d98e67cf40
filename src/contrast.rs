//! Adaptive contrast stretch ("night boost") and int8 quantization.
//!
//! The physical sensor compresses dark-scene dynamic range so far that
//! the classifier's 8-bit input cannot discriminate classes reliably.
//! Stretching trades absolute-brightness fidelity for contrast, but only
//! when the scene is genuinely dark and has some structure to stretch:
//!
//! - bright scene (pre-resize mean above the threshold): pass through,
//!   quantize as `byte - 128`;
//! - dark scene with usable range: linear rescale so the observed min
//!   maps to 0 and the observed max to 255, written back into the plane
//!   so persisted frames show the boost, quantized from the rescaled
//!   value;
//! - dark but flat (uniform noise/fog): no stretch, plain `byte - 128`.
//!   Amplifying a flat frame would only turn noise into false structure.

use crate::plane::{LumaPlane, QuantTensor};

/// What the normalizer did to the frame, for driver logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContrastOutcome {
    /// Scene bright enough that no boost was applied.
    Bright,
    /// Dark scene stretched from the observed `[min, max]` range.
    Stretched { min: u8, max: u8 },
    /// Dark scene too flat to boost; quantized unmodified.
    Flat { min: u8, max: u8 },
}

/// Tunable thresholds for the two-mode policy.
#[derive(Clone, Copy, Debug)]
pub struct ContrastPolicy {
    /// Pre-resize mean above which the frame counts as bright.
    pub bright_mean: u8,
    /// Minimum `max - min` range worth stretching.
    pub flat_range: u8,
}

impl Default for ContrastPolicy {
    fn default() -> Self {
        // Empirical values for the target sensor and scenes.
        Self {
            bright_mean: 60,
            flat_range: 10,
        }
    }
}

impl ContrastPolicy {
    /// Normalize the ML plane in place and fill the quantized tensor.
    ///
    /// `raw_mean` is the mean of the *pre-resize* full-resolution frame;
    /// the branch decision deliberately keys on the raw scene brightness
    /// rather than the resampled plane.
    pub fn normalize(
        &self,
        plane: &mut LumaPlane,
        tensor: &mut QuantTensor,
        raw_mean: u8,
    ) -> ContrastOutcome {
        debug_assert_eq!(plane.len(), tensor.len());

        if raw_mean > self.bright_mean {
            quantize_passthrough(plane, tensor);
            return ContrastOutcome::Bright;
        }

        let (mut min, mut max) = (255u8, 0u8);
        for &v in plane.as_slice() {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }

        if max - min > self.flat_range {
            let scale = 255.0f32 / f32::from(max - min);
            let px = plane.as_mut_slice();
            let out = tensor.as_mut_slice();
            for (p, t) in px.iter_mut().zip(out.iter_mut()) {
                let val = f32::from(*p - min) * scale;
                *p = val as u8;
                *t = (val - 128.0) as i8;
            }
            ContrastOutcome::Stretched { min, max }
        } else {
            quantize_passthrough(plane, tensor);
            ContrastOutcome::Flat { min, max }
        }
    }
}

fn quantize_passthrough(plane: &LumaPlane, tensor: &mut QuantTensor) {
    let out = tensor.as_mut_slice();
    for (&p, t) in plane.as_slice().iter().zip(out.iter_mut()) {
        *t = (i16::from(p) - 128) as i8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ml_plane_with(fill: impl Fn(usize) -> u8) -> LumaPlane {
        let mut plane = LumaPlane::new_ml();
        for (i, p) in plane.as_mut_slice().iter_mut().enumerate() {
            *p = fill(i);
        }
        plane
    }

    #[test]
    fn bright_frame_passes_through() {
        let policy = ContrastPolicy::default();
        let mut plane = ml_plane_with(|i| (i % 256) as u8);
        let before = plane.as_slice().to_vec();
        let mut tensor = QuantTensor::new_ml();

        let outcome = policy.normalize(&mut plane, &mut tensor, 128);
        assert_eq!(outcome, ContrastOutcome::Bright);
        assert_eq!(plane.as_slice(), &before[..]);
        for (p, t) in before.iter().zip(tensor.as_slice()) {
            assert_eq!(i16::from(*t), i16::from(*p) - 128);
        }
    }

    #[test]
    fn bright_threshold_is_strictly_above() {
        // mean == 60 takes the dark branch.
        let policy = ContrastPolicy::default();
        let mut plane = ml_plane_with(|i| if i % 2 == 0 { 10 } else { 50 });
        let mut tensor = QuantTensor::new_ml();
        let outcome = policy.normalize(&mut plane, &mut tensor, 60);
        assert!(matches!(outcome, ContrastOutcome::Stretched { .. }));
    }

    #[test]
    fn dark_frame_with_range_stretches_to_full_scale() {
        let policy = ContrastPolicy::default();
        // Values 20..=80 spread across the plane.
        let mut plane = ml_plane_with(|i| 20 + (i % 61) as u8);
        let mut tensor = QuantTensor::new_ml();

        let outcome = policy.normalize(&mut plane, &mut tensor, 30);
        assert_eq!(outcome, ContrastOutcome::Stretched { min: 20, max: 80 });

        let stretched = plane.as_slice();
        let new_min = *stretched.iter().min().unwrap();
        let new_max = *stretched.iter().max().unwrap();
        assert!(new_min <= 1, "min should map to ~0, got {}", new_min);
        assert!(new_max >= 254, "max should map to ~255, got {}", new_max);

        // Tensor derives from the stretched value.
        for (p, t) in stretched.iter().zip(tensor.as_slice()) {
            let diff = i16::from(*p) - 128 - i16::from(*t);
            assert!(diff.abs() <= 1, "tensor drifted from plane: {}", diff);
        }
    }

    #[test]
    fn flat_dark_frame_is_not_amplified() {
        let policy = ContrastPolicy::default();
        // Range of 8, below the flat threshold of 10.
        let mut plane = ml_plane_with(|i| 30 + (i % 9) as u8);
        let before = plane.as_slice().to_vec();
        let mut tensor = QuantTensor::new_ml();

        let outcome = policy.normalize(&mut plane, &mut tensor, 33);
        assert_eq!(outcome, ContrastOutcome::Flat { min: 30, max: 38 });
        assert_eq!(plane.as_slice(), &before[..]);
        for (p, t) in before.iter().zip(tensor.as_slice()) {
            assert_eq!(i16::from(*t), i16::from(*p) - 128);
        }
    }

    #[test]
    fn range_boundary_of_ten_counts_as_flat() {
        let policy = ContrastPolicy::default();
        let mut plane = ml_plane_with(|i| 40 + (i % 11) as u8); // max - min == 10
        let mut tensor = QuantTensor::new_ml();
        let outcome = policy.normalize(&mut plane, &mut tensor, 45);
        assert_eq!(outcome, ContrastOutcome::Flat { min: 40, max: 50 });
    }
}
