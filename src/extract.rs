//! Luma extraction from packed 4:2:2 capture buffers.
//!
//! A 4:2:2 transfer interleaves two luma samples with one chroma pair:
//! `Y0 Cb Y1 Cr ...`, two bytes per pixel. The pipeline is grayscale-only,
//! so extraction keeps both luma samples per 4-byte group and drops the
//! chroma entirely.
//!
//! This runs inside the capture completion path, before the frame is
//! published to the consumer. The capture buffer may be overwritten as
//! soon as the next transfer starts, so extraction must fully consume it
//! here and never retain a reference.

use crate::plane::LumaPlane;

/// Extract the luma channel of a packed 4:2:2 buffer into `plane`.
///
/// `yuv` must be exactly `plane.width * plane.height * 2` bytes. A size
/// mismatch is a caller-contract violation, not a runtime error.
pub fn extract_luma(yuv: &[u8], plane: &mut LumaPlane) {
    assert_eq!(
        yuv.len(),
        plane.width * plane.height * 2,
        "capture buffer size does not match plane geometry"
    );
    // 4:2:2 packs two pixels per 4-byte group.
    assert_eq!(plane.len() % 2, 0, "4:2:2 plane needs an even pixel count");

    let out = plane.as_mut_slice();
    let mut y_idx = 0;
    for group in yuv.chunks_exact(4) {
        out[y_idx] = group[0]; // Y0
        out[y_idx + 1] = group[2]; // Y1
        y_idx += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_both_luma_samples_in_raster_order() {
        // 4x1 pixels: [Y0 Cb Y1 Cr] [Y2 Cb Y3 Cr]
        let yuv = [10, 99, 20, 99, 30, 88, 40, 88];
        let mut plane = LumaPlane::new(4, 1);
        extract_luma(&yuv, &mut plane);
        assert_eq!(plane.as_slice(), &[10, 20, 30, 40]);
    }

    #[test]
    fn extracted_plane_matches_indexing_property() {
        // plane[2k] == buffer[4k], plane[2k+1] == buffer[4k+2]
        let w = 8;
        let h = 4;
        let yuv: Vec<u8> = (0..w * h * 2).map(|i| (i % 251) as u8).collect();
        let mut plane = LumaPlane::new(w, h);
        extract_luma(&yuv, &mut plane);

        let out = plane.as_slice();
        assert_eq!(out.len(), w * h);
        for k in 0..w * h / 2 {
            assert_eq!(out[2 * k], yuv[4 * k]);
            assert_eq!(out[2 * k + 1], yuv[4 * k + 2]);
        }
    }

    #[test]
    #[should_panic(expected = "capture buffer size")]
    fn rejects_undersized_buffer() {
        let yuv = [0u8; 6];
        let mut plane = LumaPlane::new(4, 1);
        extract_luma(&yuv, &mut plane);
    }
}
