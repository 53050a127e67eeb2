// ============================================================================
// VIEW STATE — zoom, pan and display rotation
// ============================================================================
//
// View parameters affect presentation only. They live outside the operation
// log: changing the zoom or panning never touches pixel data and is not
// undoable through edit history.
// ============================================================================

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_STEP: f32 = 1.2;

/// How the current image is presented: zoom factor, pan offset in screen
/// pixels, and a display-only rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub rotation: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            rotation: 0.0,
        }
    }
}

/// Where and how large the image appears inside a viewport, derived from a
/// `ViewState` by [`ViewState::placement`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl ViewState {
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_STEP);
    }

    /// Set the zoom factor, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Add to the display rotation, normalized into 0..360.
    pub fn rotate_by(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Center the image and pick the largest zoom at which it fits entirely
    /// inside a `viewport_w` x `viewport_h` viewport, clamped to the zoom
    /// range like any other zoom change.
    pub fn fit_to_screen(&mut self, viewport_w: f32, viewport_h: f32, img_w: u32, img_h: u32) {
        if img_w == 0 || img_h == 0 || viewport_w <= 0.0 || viewport_h <= 0.0 {
            return;
        }
        let ratio = (viewport_w / img_w as f32).min(viewport_h / img_h as f32);
        self.set_zoom(ratio);
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Compute the on-screen rectangle for an `img_w` x `img_h` image inside
    /// the viewport: scaled by zoom, centered, then offset by the pan.
    pub fn placement(&self, viewport_w: f32, viewport_h: f32, img_w: u32, img_h: u32) -> Placement {
        let width = img_w as f32 * self.zoom;
        let height = img_h as f32 * self.zoom;
        Placement {
            x: (viewport_w - width) / 2.0 + self.pan_x,
            y: (viewport_h - height) / 2.0 + self.pan_y,
            width,
            height,
            rotation: self.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity_view() {
        let v = ViewState::default();
        assert_eq!(v.zoom, 1.0);
        assert_eq!(v.pan_x, 0.0);
        assert_eq!(v.pan_y, 0.0);
        assert_eq!(v.rotation, 0.0);
    }

    #[test]
    fn zoom_clamps_at_both_ends() {
        let mut v = ViewState::default();
        for _ in 0..40 {
            v.zoom_in();
        }
        assert_eq!(v.zoom, MAX_ZOOM);
        for _ in 0..80 {
            v.zoom_out();
        }
        assert_eq!(v.zoom, MIN_ZOOM);

        v.set_zoom(99.0);
        assert_eq!(v.zoom, MAX_ZOOM);
        v.set_zoom(0.0);
        assert_eq!(v.zoom, MIN_ZOOM);
    }

    #[test]
    fn zoom_steps_are_multiplicative() {
        let mut v = ViewState::default();
        v.zoom_in();
        assert!((v.zoom - 1.2).abs() < 1e-6);
        v.zoom_out();
        assert!((v.zoom - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pan_accumulates() {
        let mut v = ViewState::default();
        v.pan_by(10.0, -5.0);
        v.pan_by(2.5, 5.0);
        assert_eq!(v.pan_x, 12.5);
        assert_eq!(v.pan_y, 0.0);
    }

    #[test]
    fn display_rotation_wraps_around() {
        let mut v = ViewState::default();
        v.rotate_by(270.0);
        v.rotate_by(180.0);
        assert_eq!(v.rotation, 90.0);
        v.rotate_by(-180.0);
        assert_eq!(v.rotation, 270.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut v = ViewState::default();
        v.zoom_in();
        v.pan_by(3.0, 4.0);
        v.rotate_by(90.0);
        v.reset();
        assert_eq!(v, ViewState::default());
    }

    #[test]
    fn fit_to_screen_picks_the_limiting_axis() {
        let mut v = ViewState::default();
        v.pan_by(50.0, 50.0);
        v.fit_to_screen(800.0, 600.0, 400, 400);
        assert!((v.zoom - 1.5).abs() < 1e-6);
        assert_eq!(v.pan_x, 0.0);
        assert_eq!(v.pan_y, 0.0);
    }

    #[test]
    fn fit_to_screen_respects_zoom_bounds() {
        let mut v = ViewState::default();
        // Tiny image in a huge viewport would need zoom > MAX_ZOOM.
        v.fit_to_screen(4000.0, 4000.0, 10, 10);
        assert_eq!(v.zoom, MAX_ZOOM);
        // Huge image in a tiny viewport would need zoom < MIN_ZOOM.
        v.fit_to_screen(10.0, 10.0, 4000, 4000);
        assert_eq!(v.zoom, MIN_ZOOM);
    }

    #[test]
    fn placement_centers_then_pans() {
        let mut v = ViewState::default();
        v.set_zoom(2.0);
        v.pan_by(10.0, -20.0);
        let p = v.placement(800.0, 600.0, 100, 50);
        assert_eq!(p.width, 200.0);
        assert_eq!(p.height, 100.0);
        assert_eq!(p.x, (800.0 - 200.0) / 2.0 + 10.0);
        assert_eq!(p.y, (600.0 - 100.0) / 2.0 - 20.0);
    }
}
