// ============================================================================
// EDIT OPERATIONS — the closed set of non-destructive edit records
// ============================================================================
//
// Every edit a user makes is captured as one `EditOp` value. Ops are immutable
// once created and self-contained: replaying the active prefix of the
// operation log against the untouched original reproduces the current image.
//
// Parameters are validated up front via `EditOp::validate()` — a malformed op
// is rejected before it can ever enter the log, so the replay pipeline only
// sees well-formed records.
// ============================================================================

pub mod adjustments;
pub mod transform;
pub mod watermark;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Mirror axis for flip operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Where the pixels of a watermark come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WatermarkSource {
    /// Rendered text, filled with `color`.
    Text {
        content: String,
        #[serde(default = "default_watermark_color")]
        color: [u8; 3],
    },
    /// An external image file, scaled to the watermark width.
    Image { path: PathBuf },
}

fn default_watermark_color() -> [u8; 3] {
    [255, 255, 255]
}

/// A text or image stamp composited onto the working buffer.
///
/// `size` is the font pixel height for text and the target width for images
/// (aspect ratio preserved). `opacity` is 0–100 and maps to alpha 0.0–1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(flatten)]
    pub source: WatermarkSource,
    pub x: i32,
    pub y: i32,
    pub size: u32,
    pub opacity: u8,
}

/// A single non-destructive edit operation.
///
/// The enum is closed on purpose: an "unknown operation" cannot exist at
/// runtime, and an unknown tag in a serialized edit plan fails
/// deserialization instead of being silently skipped during replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOp {
    /// Additive channel offset, -100..=100.
    Brightness { value: i32 },
    /// Contrast around the 128 midpoint, -100..=100.
    Contrast { value: i32 },
    /// Saturation multiplier, 0.0..=2.0 (1.0 = identity).
    Saturation { value: f32 },
    /// Sharpen strength, 0..=100 (0 = identity).
    Sharpness { value: i32 },
    /// Sub-rectangle extraction; changes the working dimensions.
    Crop { x: u32, y: u32, width: u32, height: u32 },
    /// Scale the whole buffer to the given dimensions.
    Resize { width: u32, height: u32 },
    /// Rotation about the center, in degrees; the output canvas grows to the
    /// rotated bounding box.
    Rotate { angle: f32 },
    Flip { axis: FlipAxis },
    /// Shift content by (dx, dy); revealed area is transparent.
    Translate { dx: i32, dy: i32 },
    Watermark(Watermark),
}

impl EditOp {
    /// Check all parameters against their documented ranges.
    ///
    /// Returns `InvalidOp` for anything out of range. Callers must reject the
    /// op before appending it to the operation log.
    pub fn validate(&self) -> Result<(), EditorError> {
        match self {
            EditOp::Brightness { value } | EditOp::Contrast { value } => {
                if !(-100..=100).contains(value) {
                    return Err(EditorError::InvalidOp(format!(
                        "{} value {} outside -100..=100",
                        self.kind(),
                        value
                    )));
                }
            }
            EditOp::Saturation { value } => {
                if !value.is_finite() || !(0.0..=2.0).contains(value) {
                    return Err(EditorError::InvalidOp(format!(
                        "saturation value {} outside 0.0..=2.0",
                        value
                    )));
                }
            }
            EditOp::Sharpness { value } => {
                if !(0..=100).contains(value) {
                    return Err(EditorError::InvalidOp(format!(
                        "sharpness value {} outside 0..=100",
                        value
                    )));
                }
            }
            EditOp::Crop { width, height, .. } | EditOp::Resize { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err(EditorError::InvalidOp(format!(
                        "{} dimensions {}x{} must be positive",
                        self.kind(),
                        width,
                        height
                    )));
                }
            }
            EditOp::Rotate { angle } => {
                if !angle.is_finite() {
                    return Err(EditorError::InvalidOp(format!(
                        "rotate angle {} is not finite",
                        angle
                    )));
                }
            }
            EditOp::Flip { .. } | EditOp::Translate { .. } => {}
            EditOp::Watermark(wm) => {
                if wm.size == 0 {
                    return Err(EditorError::InvalidOp(
                        "watermark size must be positive".to_string(),
                    ));
                }
                if wm.opacity > 100 {
                    return Err(EditorError::InvalidOp(format!(
                        "watermark opacity {} outside 0..=100",
                        wm.opacity
                    )));
                }
                if let WatermarkSource::Text { content, .. } = &wm.source
                    && content.is_empty()
                {
                    return Err(EditorError::InvalidOp(
                        "watermark text is empty".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Short kind name, used in messages and verbose CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            EditOp::Brightness { .. } => "brightness",
            EditOp::Contrast { .. } => "contrast",
            EditOp::Saturation { .. } => "saturation",
            EditOp::Sharpness { .. } => "sharpness",
            EditOp::Crop { .. } => "crop",
            EditOp::Resize { .. } => "resize",
            EditOp::Rotate { .. } => "rotate",
            EditOp::Flip { .. } => "flip",
            EditOp::Translate { .. } => "translate",
            EditOp::Watermark(..) => "watermark",
        }
    }

    /// Human-readable description for history listings.
    pub fn describe(&self) -> String {
        match self {
            EditOp::Brightness { value } => format!("Brightness {:+}", value),
            EditOp::Contrast { value } => format!("Contrast {:+}", value),
            EditOp::Saturation { value } => format!("Saturation {:.2}", value),
            EditOp::Sharpness { value } => format!("Sharpness {}", value),
            EditOp::Crop { x, y, width, height } => {
                format!("Crop {}x{} at ({}, {})", width, height, x, y)
            }
            EditOp::Resize { width, height } => format!("Resize to {}x{}", width, height),
            EditOp::Rotate { angle } => format!("Rotate {:.1}°", angle),
            EditOp::Flip { axis: FlipAxis::Horizontal } => "Flip horizontal".to_string(),
            EditOp::Flip { axis: FlipAxis::Vertical } => "Flip vertical".to_string(),
            EditOp::Translate { dx, dy } => format!("Move ({:+}, {:+})", dx, dy),
            EditOp::Watermark(wm) => match &wm.source {
                WatermarkSource::Text { content, .. } => format!("Watermark \"{}\"", content),
                WatermarkSource::Image { path } => {
                    format!("Watermark image {}", path.display())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_in_range_parameters() {
        assert!(EditOp::Brightness { value: -100 }.validate().is_ok());
        assert!(EditOp::Contrast { value: 100 }.validate().is_ok());
        assert!(EditOp::Saturation { value: 2.0 }.validate().is_ok());
        assert!(EditOp::Sharpness { value: 0 }.validate().is_ok());
        assert!(EditOp::Crop { x: 0, y: 0, width: 1, height: 1 }.validate().is_ok());
        assert!(EditOp::Translate { dx: -5, dy: 0 }.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(EditOp::Brightness { value: 101 }.validate().is_err());
        assert!(EditOp::Contrast { value: -101 }.validate().is_err());
        assert!(EditOp::Saturation { value: 2.5 }.validate().is_err());
        assert!(EditOp::Saturation { value: f32::NAN }.validate().is_err());
        assert!(EditOp::Sharpness { value: -1 }.validate().is_err());
        assert!(EditOp::Crop { x: 0, y: 0, width: 0, height: 10 }.validate().is_err());
        assert!(EditOp::Resize { width: 10, height: 0 }.validate().is_err());
        assert!(EditOp::Rotate { angle: f32::INFINITY }.validate().is_err());
    }

    #[test]
    fn rejects_malformed_watermarks() {
        let empty_text = EditOp::Watermark(Watermark {
            source: WatermarkSource::Text { content: String::new(), color: [255, 255, 255] },
            x: 0,
            y: 0,
            size: 24,
            opacity: 80,
        });
        assert!(empty_text.validate().is_err());

        let bad_opacity = EditOp::Watermark(Watermark {
            source: WatermarkSource::Text { content: "hi".to_string(), color: [0, 0, 0] },
            x: 0,
            y: 0,
            size: 24,
            opacity: 101,
        });
        assert!(bad_opacity.validate().is_err());
    }

    #[test]
    fn plan_json_round_trips() {
        let ops = vec![
            EditOp::Brightness { value: 20 },
            EditOp::Crop { x: 10, y: 10, width: 50, height: 50 },
            EditOp::Flip { axis: FlipAxis::Horizontal },
            EditOp::Watermark(Watermark {
                source: WatermarkSource::Text {
                    content: "draft".to_string(),
                    color: [255, 0, 0],
                },
                x: 12,
                y: 40,
                size: 32,
                opacity: 50,
            }),
        ];
        let json = serde_json::to_string(&ops).unwrap();
        let back: Vec<EditOp> = serde_json::from_str(&json).unwrap();
        assert_eq!(ops, back);
    }

    #[test]
    fn unknown_operation_tag_fails_deserialization() {
        let json = r#"[{"type":"vignette","value":3}]"#;
        assert!(serde_json::from_str::<Vec<EditOp>>(json).is_err());
    }

    #[test]
    fn watermark_color_defaults_to_white() {
        let json = r#"{"type":"watermark","kind":"text","content":"x","x":0,"y":0,"size":16,"opacity":100}"#;
        let op: EditOp = serde_json::from_str(json).unwrap();
        match op {
            EditOp::Watermark(Watermark {
                source: WatermarkSource::Text { color, .. },
                ..
            }) => assert_eq!(color, [255, 255, 255]),
            other => panic!("unexpected op: {:?}", other),
        }
    }
}
