//! Frame storage.
//!
//! The pipeline owns exactly three pixel buffers for its whole lifetime:
//!
//! - a full-resolution `LumaPlane` (the consumer-side snapshot, plus two
//!   more inside the exchange),
//! - the ML-resolution `LumaPlane` (96x96), overwritten by the resampler
//!   and mutated in place by the contrast normalizer,
//! - the `QuantTensor` handed to the classifier.
//!
//! All of them are allocated once at startup and overwritten per frame.
//! No per-frame allocation happens anywhere in the hot path.

/// Side length of the ML-resolution plane and tensor.
pub const ML_DIM: usize = 96;

/// A single-channel 2D grid of byte samples.
#[derive(Clone, Debug)]
pub struct LumaPlane {
    data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl LumaPlane {
    /// Allocate a zero-filled plane. Done once at startup.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0u8; width * height],
            width,
            height,
        }
    }

    /// Allocate the fixed ML-resolution plane.
    pub fn new_ml() -> Self {
        Self::new(ML_DIM, ML_DIM)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite every sample with `value`.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Copy another plane of identical geometry into this one.
    ///
    /// Used by the consumer to snapshot the published exchange slot.
    pub fn copy_from(&mut self, other: &LumaPlane) {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "plane geometry mismatch"
        );
        self.data.copy_from_slice(&other.data);
    }
}

/// The signed, zero-centered representation the classifier consumes.
#[derive(Clone, Debug)]
pub struct QuantTensor {
    data: Vec<i8>,
    pub dim: usize,
}

impl QuantTensor {
    pub fn new(dim: usize) -> Self {
        Self {
            data: vec![0i8; dim * dim],
            dim,
        }
    }

    pub fn new_ml() -> Self {
        Self::new(ML_DIM)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [i8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_allocate_expected_sizes() {
        let full = LumaPlane::new(320, 240);
        assert_eq!(full.len(), 320 * 240);
        assert_eq!(full.width, 320);
        assert_eq!(full.height, 240);

        let ml = LumaPlane::new_ml();
        assert_eq!(ml.len(), ML_DIM * ML_DIM);

        let tensor = QuantTensor::new_ml();
        assert_eq!(tensor.len(), ML_DIM * ML_DIM);
    }

    #[test]
    fn copy_from_snapshots_contents() {
        let mut src = LumaPlane::new(4, 2);
        src.as_mut_slice().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut dst = LumaPlane::new(4, 2);
        dst.copy_from(&src);
        assert_eq!(dst.as_slice(), src.as_slice());
    }

    #[test]
    #[should_panic(expected = "plane geometry mismatch")]
    fn copy_from_rejects_geometry_mismatch() {
        let src = LumaPlane::new(4, 2);
        let mut dst = LumaPlane::new(2, 4);
        dst.copy_from(&src);
    }
}
