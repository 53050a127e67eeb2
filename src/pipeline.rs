// ============================================================================
// EDIT PIPELINE — deterministic replay of operations against the original
// ============================================================================
//
// The pipeline is stateless between calls: every replay starts from the
// untouched original and folds the operations over it in order. Identical
// input and operation list always produce identical output, so undo/redo can
// be implemented purely as cursor moves over the operation log.
// ============================================================================

use ab_glyph::FontArc;
use image::RgbaImage;

use crate::error::EditorError;
use crate::ops::{self, EditOp};

/// Replays edit operations. Holds only the resources replay needs beyond the
/// operations themselves, currently just the font used for text watermarks.
#[derive(Clone, Default)]
pub struct Pipeline {
    font: Option<FontArc>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    pub fn set_font(&mut self, font: FontArc) {
        self.font = Some(font);
    }

    /// Whether text watermarks can be rendered.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Apply `ops` in order to a copy of `original`.
    ///
    /// Pixel operations cannot fail once their parameters are validated; the
    /// error paths are loading a watermark image from disk and rendering text
    /// without a font.
    pub fn replay(&self, original: &RgbaImage, ops: &[EditOp]) -> Result<RgbaImage, EditorError> {
        let mut current = original.clone();
        for op in ops {
            current = self.execute(&current, op)?;
        }
        Ok(current)
    }

    fn execute(&self, src: &RgbaImage, op: &EditOp) -> Result<RgbaImage, EditorError> {
        Ok(match op {
            EditOp::Brightness { value } => ops::adjustments::brightness(src, *value),
            EditOp::Contrast { value } => ops::adjustments::contrast(src, *value),
            EditOp::Saturation { value } => ops::adjustments::saturation(src, *value),
            EditOp::Sharpness { value } => ops::adjustments::sharpness(src, *value),
            EditOp::Crop { x, y, width, height } => {
                ops::transform::crop(src, *x, *y, *width, *height)
            }
            EditOp::Resize { width, height } => ops::transform::resize(src, *width, *height),
            EditOp::Rotate { angle } => ops::transform::rotate(src, *angle),
            EditOp::Flip { axis } => ops::transform::flip(src, *axis),
            EditOp::Translate { dx, dy } => ops::transform::translate(src, *dx, *dy),
            EditOp::Watermark(wm) => ops::watermark::apply(src, wm, self.font.as_ref())?,
        })
    }
}
