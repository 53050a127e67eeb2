// ============================================================================
// WATERMARK OPERATION — text and image compositing
// ============================================================================

use ab_glyph::{Font, FontArc, ScaleFont, point};
use image::{Rgba, RgbaImage, imageops};

use super::{Watermark, WatermarkSource};
use crate::error::EditorError;

/// Font families tried in order when loading the default watermark font.
const FALLBACK_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"];

/// Composite `wm` onto a copy of `src`.
///
/// `(x, y)` is the text baseline origin for text watermarks and the top-left
/// corner for image watermarks. `opacity` 0–100 maps to a 0.0–1.0 global
/// alpha applied on top of the watermark's own alpha.
pub fn apply(
    src: &RgbaImage,
    wm: &Watermark,
    font: Option<&FontArc>,
) -> Result<RgbaImage, EditorError> {
    let alpha = (wm.opacity as f32 / 100.0).clamp(0.0, 1.0);
    let mut out = src.clone();

    match &wm.source {
        WatermarkSource::Text { content, color } => {
            let font = font.ok_or(EditorError::MissingFont)?;
            draw_text(&mut out, font, content, wm.size as f32, wm.x, wm.y, *color, alpha);
        }
        WatermarkSource::Image { path } => {
            let overlay = image::open(path)
                .map_err(|e| EditorError::WatermarkAsset {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
                .into_rgba8();
            let scaled = scale_to_width(&overlay, wm.size);
            blend_overlay(&mut out, &scaled, wm.x, wm.y, alpha);
        }
    }

    Ok(out)
}

/// Rasterize a single line of text at the given baseline origin and blend it
/// into `dst` with `color` fill.
fn draw_text(
    dst: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    font_size: f32,
    origin_x: i32,
    origin_y: i32,
    color: [u8; 3],
    alpha: f32,
) {
    let scaled = font.as_scaled(font_size);
    let mut cursor_x = origin_x as f32;
    let mut last_glyph = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(font_size, point(cursor_x, origin_y as f32));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px as u32 >= dst.width() || py as u32 >= dst.height() {
                    return;
                }
                let a = coverage * alpha;
                if a > 0.0 {
                    let pixel = dst.get_pixel_mut(px as u32, py as u32);
                    blend_pixel(pixel, color, a);
                }
            });
        }
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
}

/// Scale an overlay image to `width`, preserving its aspect ratio.
fn scale_to_width(overlay: &RgbaImage, width: u32) -> RgbaImage {
    if overlay.width() == 0 || overlay.height() == 0 || overlay.width() == width {
        return overlay.clone();
    }
    let height = ((width as f64 * overlay.height() as f64 / overlay.width() as f64).round()
        as u32)
        .max(1);
    imageops::resize(overlay, width, height, imageops::FilterType::Triangle)
}

/// Source-over blend of `overlay` onto `dst` at (`x`, `y`) with a global
/// alpha multiplier. Overlay pixels falling outside `dst` are clipped.
fn blend_overlay(dst: &mut RgbaImage, overlay: &RgbaImage, x: i32, y: i32, alpha: f32) {
    for (ox, oy, pixel) in overlay.enumerate_pixels() {
        let tx = x as i64 + ox as i64;
        let ty = y as i64 + oy as i64;
        if tx < 0 || ty < 0 || tx >= dst.width() as i64 || ty >= dst.height() as i64 {
            continue;
        }
        let a = (pixel[3] as f32 / 255.0) * alpha;
        if a > 0.0 {
            let target = dst.get_pixel_mut(tx as u32, ty as u32);
            blend_pixel(target, [pixel[0], pixel[1], pixel[2]], a);
        }
    }
}

/// Source-over blend of a solid color at alpha `a` onto one pixel.
fn blend_pixel(dst: &mut Rgba<u8>, color: [u8; 3], a: f32) {
    let sa = a.clamp(0.0, 1.0);
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let sc = color[c] as f32;
        let dc = dst[c] as f32;
        dst[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Load the first available fallback font from the system, falling back to
/// any sans-serif match. Returns `None` on font-less systems; text
/// watermarks are rejected up front in that case.
pub fn load_default_font() -> Option<FontArc> {
    for family in FALLBACK_FAMILIES {
        if let Some(font) = load_system_font(family) {
            return Some(font);
        }
    }
    load_generic_sans()
}

/// Load a font by family name from the system.
pub fn load_system_font(family: &str) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let handle = SystemSource::new()
        .select_best_match(
            &[FamilyName::Title(family.to_string())],
            &Properties::new(),
        )
        .ok()?;
    font_arc_from_handle(handle)
}

fn load_generic_sans() -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let handle = SystemSource::new()
        .select_best_match(&[FamilyName::SansSerif], &Properties::new())
        .ok()?;
    font_arc_from_handle(handle)
}

fn font_arc_from_handle(handle: font_kit::handle::Handle) -> Option<FontArc> {
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    FontArc::try_from_vec((*data).clone()).ok()
}
