//! Bilinear downsample from capture resolution to the ML plane.
//!
//! For destination pixel `(j, i)` the fractional source coordinate is
//! `x = j * (src_w - 1) / dst_w`, `y = i * (src_h - 1) / dst_h`; the
//! integer parts pick the top-left neighbor, the fractional remainders
//! weight the 2x2 blend, and the result truncates to a byte.
//!
//! The neighbor reads at `sx + 1` / `sy + 1` are clamped to the last
//! valid column/row, so the far edge of the image never reads outside
//! the source plane.

use crate::plane::LumaPlane;

/// Downsample `src` into `dst` with bilinear interpolation.
///
/// Geometry is taken from the planes themselves; `dst` is overwritten
/// entirely.
pub fn resample_bilinear(src: &LumaPlane, dst: &mut LumaPlane) {
    let (src_w, src_h) = (src.width, src.height);
    let (dst_w, dst_h) = (dst.width, dst.height);
    assert!(src_w >= 2 && src_h >= 2, "source plane too small to sample");

    let x_ratio = (src_w - 1) as f32 / dst_w as f32;
    let y_ratio = (src_h - 1) as f32 / dst_h as f32;

    let src_px = src.as_slice();
    let dst_px = dst.as_mut_slice();

    for i in 0..dst_h {
        let fy = y_ratio * i as f32;
        let sy = fy as usize;
        let y_diff = fy - sy as f32;
        let sy1 = (sy + 1).min(src_h - 1);

        for j in 0..dst_w {
            let fx = x_ratio * j as f32;
            let sx = fx as usize;
            let x_diff = fx - sx as f32;
            let sx1 = (sx + 1).min(src_w - 1);

            let a = src_px[sy * src_w + sx] as f32; // top-left
            let b = src_px[sy * src_w + sx1] as f32; // top-right
            let c = src_px[sy1 * src_w + sx] as f32; // bottom-left
            let d = src_px[sy1 * src_w + sx1] as f32; // bottom-right

            let pixel = a * (1.0 - x_diff) * (1.0 - y_diff)
                + b * x_diff * (1.0 - y_diff)
                + c * (1.0 - x_diff) * y_diff
                + d * x_diff * y_diff;

            dst_px[i * dst_w + j] = pixel as u8;
        }
    }
}
