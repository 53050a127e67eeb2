// ============================================================================
// ADJUSTMENT OPERATIONS — per-pixel color math for the replay pipeline
// ============================================================================
//
// Each function takes the current working buffer and returns a new one; the
// pipeline owns sequencing. Per-pixel loops are parallelized by row via rayon.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// Apply a per-pixel transform function to the whole buffer.
/// `transform` receives (r, g, b, a) as f32 and returns (r, g, b, a) as f32;
/// results are rounded and clamped to 0..=255.
fn apply_pixel_transform<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];
    let stride = w * 4;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let a = row_in[pi + 3] as f32;
            let (nr, ng, nb, na) = transform(r, g, b, a);
            row_out[pi]     = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

/// Additive brightness: `c' = c + value` per RGB channel, saturating at the
/// ends of the 0..=255 range. Alpha is preserved.
pub fn brightness(src: &RgbaImage, value: i32) -> RgbaImage {
    let v = value as f32;
    apply_pixel_transform(src, |r, g, b, a| (r + v, g + v, b + v, a))
}

/// Contrast around the 128 midpoint using the standard correction factor
/// `259(v+255) / (255(259-v))`.
pub fn contrast(src: &RgbaImage, value: i32) -> RgbaImage {
    let v = value as f32;
    let factor = (259.0 * (v + 255.0)) / (255.0 * (259.0 - v));
    apply_pixel_transform(src, |r, g, b, a| {
        (
            factor * (r - 128.0) + 128.0,
            factor * (g - 128.0) + 128.0,
            factor * (b - 128.0) + 128.0,
            a,
        )
    })
}

/// Saturation: lerp each channel between its luma and itself.
/// `value` 0.0 = grayscale, 1.0 = identity, 2.0 = doubled.
pub fn saturation(src: &RgbaImage, value: f32) -> RgbaImage {
    apply_pixel_transform(src, |r, g, b, a| {
        let gray = 0.2989 * r + 0.5870 * g + 0.1140 * b;
        (
            gray + value * (r - gray),
            gray + value * (g - gray),
            gray + value * (b - gray),
            a,
        )
    })
}

/// Sharpen via a 3x3 cross kernel with strength `value / 100`.
/// `value` 0 is the identity and returns an untouched copy.
pub fn sharpness(src: &RgbaImage, value: i32) -> RgbaImage {
    if value == 0 {
        return src.clone();
    }
    let amount = value as f32 / 100.0;
    let kernel = [
        0.0, -amount, 0.0,
        -amount, 1.0 + 4.0 * amount, -amount,
        0.0, -amount, 0.0,
    ];
    convolve_3x3(src, &kernel)
}

/// 3x3 convolution over the RGB channels; alpha passes through unchanged.
///
/// Border pixels sample only in-bounds taps; out-of-bounds taps contribute
/// zero (no clamping, no reflection).
fn convolve_3x3(src: &RgbaImage, kernel: &[f32; 9]) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut r = 0.0f32;
            let mut g = 0.0f32;
            let mut b = 0.0f32;

            for ky in 0..3usize {
                for kx in 0..3usize {
                    let sy = y as isize + ky as isize - 1;
                    let sx = x as isize + kx as isize - 1;
                    if sy < 0 || sy >= h as isize || sx < 0 || sx >= w as isize {
                        continue;
                    }
                    let wt = kernel[ky * 3 + kx];
                    let off = sy as usize * stride + sx as usize * 4;
                    r += src_raw[off] as f32 * wt;
                    g += src_raw[off + 1] as f32 * wt;
                    b += src_raw[off + 2] as f32 * wt;
                }
            }

            let pi = x * 4;
            row_out[pi]     = r.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = g.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = b.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = src_raw[y * stride + pi + 3];
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}
