// ============================================================================
// TRANSFORM OPERATIONS — crop, resize, rotate, flip, translate
// ============================================================================
//
// Geometric operations that may change the working buffer's dimensions.
// Crop and resize outputs become the input dimensions of every subsequent
// step in the same replay.
// ============================================================================

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use super::FlipAxis;

/// Extract the `width`x`height` sub-rectangle at (`x`, `y`).
///
/// Regions of the requested rectangle that fall outside the source buffer
/// read as transparent, so the output always has exactly the requested
/// dimensions.
pub fn crop(src: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    let x_end = x.saturating_add(width).min(src.width());
    let y_end = y.saturating_add(height).min(src.height());
    for sy in y..y_end {
        for sx in x..x_end {
            out.put_pixel(sx - x, sy - y, *src.get_pixel(sx, sy));
        }
    }
    out
}

/// Scale the full buffer to (`width`, `height`) with bilinear resampling.
/// Aspect ratio is not preserved; callers pass the exact target dimensions.
pub fn resize(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(src, width, height, imageops::FilterType::Triangle)
}

/// Mirror the buffer about its vertical or horizontal axis. No dimension
/// change; mirroring is exact and self-inverse.
pub fn flip(src: &RgbaImage, axis: FlipAxis) -> RgbaImage {
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(src),
        FlipAxis::Vertical => imageops::flip_vertical(src),
    }
}

/// Shift content by (`dx`, `dy`). Pixels shifted out of the buffer are lost;
/// the revealed area is transparent.
pub fn translate(src: &RgbaImage, dx: i32, dy: i32) -> RgbaImage {
    let (w, h) = src.dimensions();
    let mut out = RgbaImage::new(w, h);
    for y in 0..h {
        let sy = y as i64 - dy as i64;
        if sy < 0 || sy >= h as i64 {
            continue;
        }
        for x in 0..w {
            let sx = x as i64 - dx as i64;
            if sx < 0 || sx >= w as i64 {
                continue;
            }
            out.put_pixel(x, y, *src.get_pixel(sx as u32, sy as u32));
        }
    }
    out
}

/// Rotate the buffer about its center by `angle` degrees (clockwise, y-down).
///
/// The output canvas is sized to the rotated bounding box
/// `(|w·cosθ|+|h·sinθ|, |w·sinθ|+|h·cosθ|)` so no content is clipped; the
/// area outside the rotated image is transparent. Sampling is bilinear with
/// transparent out-of-bounds taps, which degenerates to an exact pixel copy
/// at multiples of 90°.
pub fn rotate(src: &RgbaImage, angle: f32) -> RgbaImage {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let radians = (angle as f64).to_radians();
    let (sin, cos) = radians.sin_cos();
    let out_w = ((w as f64 * cos.abs()) + (h as f64 * sin.abs())).round().max(1.0) as u32;
    let out_h = ((w as f64 * sin.abs()) + (h as f64 * cos.abs())).round().max(1.0) as u32;

    let src_cx = w as f64 / 2.0;
    let src_cy = h as f64 / 2.0;
    let dst_cx = out_w as f64 / 2.0;
    let dst_cy = out_h as f64 / 2.0;

    let stride = out_w as usize * 4;
    let mut dst_raw = vec![0u8; out_w as usize * out_h as usize * 4];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        for x in 0..out_w as usize {
            let dx = x as f64 + 0.5 - dst_cx;
            let dy = y as f64 + 0.5 - dst_cy;
            // Inverse rotation maps each output pixel back into source space
            let sx = cos * dx + sin * dy + src_cx - 0.5;
            let sy = -sin * dx + cos * dy + src_cy - 0.5;
            let px = sample_bilinear(src, sx, sy);
            row_out[x * 4..x * 4 + 4].copy_from_slice(&px);
        }
    });

    RgbaImage::from_raw(out_w, out_h, dst_raw).unwrap()
}

/// Bilinear sample at a fractional source position. Taps outside the buffer
/// contribute transparent black.
fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> [u8; 4] {
    let w = src.width() as i64;
    let h = src.height() as i64;
    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;
    let fx = sx - x0 as f64;
    let fy = sy - y0 as f64;

    let mut acc = [0.0f64; 4];
    for (dy, wy) in [(0i64, 1.0 - fy), (1, fy)] {
        if wy <= 0.0 {
            continue;
        }
        for (dx, wx) in [(0i64, 1.0 - fx), (1, fx)] {
            let weight = wx * wy;
            if weight <= 0.0 {
                continue;
            }
            let xx = x0 + dx;
            let yy = y0 + dy;
            if xx < 0 || xx >= w || yy < 0 || yy >= h {
                continue;
            }
            let p = src.get_pixel(xx as u32, yy as u32).0;
            for c in 0..4 {
                acc[c] += p[c] as f64 * weight;
            }
        }
    }

    [
        acc[0].round().clamp(0.0, 255.0) as u8,
        acc[1].round().clamp(0.0, 255.0) as u8,
        acc[2].round().clamp(0.0, 255.0) as u8,
        acc[3].round().clamp(0.0, 255.0) as u8,
    ]
}
