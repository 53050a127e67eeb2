// ============================================================================
// EDITOR — ties the session, operation log, pipeline and view together
// ============================================================================
//
// The editor owns all mutable editing state. Callers hold it behind `&mut`,
// so replays never overlap; every mutation completes (or rolls back) before
// the next one starts.
// ============================================================================

use std::path::Path;

use image::RgbaImage;
use uuid::Uuid;

use crate::error::EditorError;
use crate::history::OperationLog;
use crate::io::{self, SaveFormat};
use crate::ops::{EditOp, WatermarkSource};
use crate::pipeline::Pipeline;
use crate::session::SessionStore;
use crate::view::ViewState;

/// The editing façade: one active image, its operation log, and the replay
/// pipeline that materializes the current state.
pub struct Editor {
    session: SessionStore,
    pipeline: Pipeline,
    log: OperationLog,
    view: ViewState,
    original: Option<RgbaImage>,
    current: Option<RgbaImage>,
    comparing: bool,
}

impl Editor {
    /// Build an editor from its collaborators. The session may already hold
    /// assets (e.g. when restored from a session file); call
    /// [`Editor::open_active`] afterwards to start editing one.
    pub fn new(session: SessionStore, pipeline: Pipeline) -> Self {
        Self {
            session,
            pipeline,
            log: OperationLog::default(),
            view: ViewState::default(),
            original: None,
            current: None,
            comparing: false,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Import a file into the session and open its first asset.
    pub fn import_file(&mut self, path: &Path) -> Result<Vec<Uuid>, EditorError> {
        let ids = self.session.add_file(path)?;
        self.open_asset(ids[0])?;
        Ok(ids)
    }

    /// Import in-memory bytes into the session and open the first asset.
    pub fn import_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<Vec<Uuid>, EditorError> {
        let ids = self.session.add_bytes(name, bytes)?;
        self.open_asset(ids[0])?;
        Ok(ids)
    }

    /// Switch editing to the given asset.
    ///
    /// Edit history does not follow the user across assets: the operation log
    /// is cleared, the view resets, and the compare toggle turns off.
    pub fn open_asset(&mut self, id: Uuid) -> Result<(), EditorError> {
        self.session.set_active(id)?;
        let asset = self
            .session
            .get(id)
            .ok_or(EditorError::UnknownAsset(id))?;
        let decoded = asset.decode()?;

        log_info!(
            "editor: opened '{}' ({}x{})",
            asset.name,
            decoded.width(),
            decoded.height()
        );
        self.log.clear();
        self.view.reset();
        self.comparing = false;
        self.current = Some(decoded.clone());
        self.original = Some(decoded);
        Ok(())
    }

    /// Open whichever asset the session marks active.
    pub fn open_active(&mut self) -> Result<(), EditorError> {
        let id = self.session.active_id().ok_or(EditorError::NoActiveAsset)?;
        self.open_asset(id)
    }

    /// Validate, record, and apply one operation.
    ///
    /// The candidate prefix (what the log would hold after the append,
    /// eviction included) is replayed first; the op is only recorded once
    /// that replay succeeds, so a failure leaves the log, the redo tail and
    /// the current image untouched. Applying an edit always exits compare
    /// mode.
    pub fn apply(&mut self, op: EditOp) -> Result<(), EditorError> {
        let original = self.original.as_ref().ok_or(EditorError::NoActiveAsset)?;
        op.validate()?;
        if let EditOp::Watermark(wm) = &op
            && matches!(wm.source, WatermarkSource::Text { .. })
            && !self.pipeline.has_font()
        {
            return Err(EditorError::MissingFont);
        }

        let mut candidate = self.log.active_ops().to_vec();
        candidate.push(op.clone());
        if candidate.len() > self.log.capacity() {
            candidate.remove(0);
        }

        match self.pipeline.replay(original, &candidate) {
            Ok(img) => {
                self.log.append(op);
                self.current = Some(img);
                self.comparing = false;
                Ok(())
            }
            Err(e) => {
                log_warn!("editor: apply of {} failed: {}", op.kind(), e);
                Err(e)
            }
        }
    }

    /// Step back one operation. Returns `false` when there was nothing to
    /// undo. On replay failure the cursor is restored.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let original = self.original.as_ref().ok_or(EditorError::NoActiveAsset)?;
        if self.log.undo().is_none() {
            return Ok(false);
        }
        match self.pipeline.replay(original, self.log.active_ops()) {
            Ok(img) => {
                self.current = Some(img);
                self.comparing = false;
                Ok(true)
            }
            Err(e) => {
                self.log.redo();
                Err(e)
            }
        }
    }

    /// Step forward one operation. Returns `false` when there was nothing to
    /// redo. On replay failure the cursor is restored.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let original = self.original.as_ref().ok_or(EditorError::NoActiveAsset)?;
        if self.log.redo().is_none() {
            return Ok(false);
        }
        match self.pipeline.replay(original, self.log.active_ops()) {
            Ok(img) => {
                self.current = Some(img);
                self.comparing = false;
                Ok(true)
            }
            Err(e) => {
                self.log.undo();
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    /// Toggle the before/after comparison. While on, [`Editor::displayed`]
    /// shows the untouched original; the edited state is kept and comes back
    /// when toggled off.
    pub fn toggle_compare(&mut self) -> bool {
        self.comparing = !self.comparing;
        self.comparing
    }

    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    /// The image to present: the original while comparing, otherwise the
    /// current edited state.
    pub fn displayed(&self) -> Option<&RgbaImage> {
        if self.comparing {
            self.original.as_ref()
        } else {
            self.current.as_ref()
        }
    }

    /// The current edited state, regardless of the compare toggle.
    pub fn current(&self) -> Option<&RgbaImage> {
        self.current.as_ref()
    }

    /// Encode the current edited state to a file. Export always writes the
    /// edited image, even while the compare toggle shows the original.
    pub fn export_to(
        &self,
        path: &Path,
        format: SaveFormat,
        quality: u8,
    ) -> Result<(), EditorError> {
        let img = self.current.as_ref().ok_or(EditorError::NoActiveAsset)?;
        io::encode_and_write(img, path, format, quality)?;
        log_info!("editor: exported {} to {}", format.extension(), path.display());
        Ok(())
    }

    /// Encode the current edited state into memory.
    pub fn export_bytes(&self, format: SaveFormat, quality: u8) -> Result<Vec<u8>, EditorError> {
        let img = self.current.as_ref().ok_or(EditorError::NoActiveAsset)?;
        io::encode_to_vec(img, format, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DEFAULT_CAPACITY;
    use crate::ops::{FlipAxis, Watermark};
    use image::Rgba;

    fn editor_with_gradient() -> Editor {
        let img = RgbaImage::from_fn(10, 10, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 100, 255])
        });
        let bytes = io::encode_to_vec(&img, SaveFormat::Png, 100).unwrap();
        let mut editor = Editor::new(SessionStore::new(), Pipeline::new());
        editor.import_bytes("test.png", bytes).unwrap();
        editor
    }

    #[test]
    fn apply_requires_an_open_asset() {
        let mut editor = Editor::new(SessionStore::new(), Pipeline::new());
        assert!(matches!(
            editor.apply(EditOp::Brightness { value: 10 }),
            Err(EditorError::NoActiveAsset)
        ));
    }

    #[test]
    fn invalid_ops_never_enter_the_log() {
        let mut editor = editor_with_gradient();
        assert!(editor.apply(EditOp::Brightness { value: 500 }).is_err());
        assert!(editor.log().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn apply_undo_redo_round_trip() {
        let mut editor = editor_with_gradient();
        let before = editor.current().unwrap().clone();

        editor.apply(EditOp::Brightness { value: 30 }).unwrap();
        let after = editor.current().unwrap().clone();
        assert_ne!(before, after);

        assert!(editor.undo().unwrap());
        assert_eq!(editor.current().unwrap(), &before);
        assert!(editor.redo().unwrap());
        assert_eq!(editor.current().unwrap(), &after);
    }

    #[test]
    fn undo_redo_report_exhaustion() {
        let mut editor = editor_with_gradient();
        assert!(!editor.undo().unwrap());
        assert!(!editor.redo().unwrap());

        editor.apply(EditOp::Flip { axis: FlipAxis::Horizontal }).unwrap();
        assert!(editor.undo().unwrap());
        assert!(!editor.undo().unwrap());
    }

    #[test]
    fn new_edit_after_undo_discards_the_redo_branch() {
        let mut editor = editor_with_gradient();
        editor.apply(EditOp::Brightness { value: 10 }).unwrap();
        editor.apply(EditOp::Brightness { value: 20 }).unwrap();
        editor.undo().unwrap();

        editor.apply(EditOp::Contrast { value: 15 }).unwrap();
        assert!(!editor.can_redo());
        assert_eq!(editor.log().active_ops().len(), 2);
    }

    #[test]
    fn failed_apply_leaves_the_log_untouched() {
        let mut editor = editor_with_gradient();
        editor.apply(EditOp::Brightness { value: 10 }).unwrap();
        let state = editor.current().unwrap().clone();

        let bad = EditOp::Watermark(Watermark {
            source: WatermarkSource::Image {
                path: "/nonexistent/logo.png".into(),
            },
            x: 0,
            y: 0,
            size: 8,
            opacity: 80,
        });
        assert!(editor.apply(bad).is_err());
        assert_eq!(editor.log().active_ops().len(), 1);
        assert_eq!(editor.current().unwrap(), &state);
    }

    #[test]
    fn failed_apply_on_a_full_log_evicts_nothing() {
        let mut editor = editor_with_gradient();
        for i in 0..DEFAULT_CAPACITY {
            editor
                .apply(EditOp::Brightness { value: if i % 2 == 0 { 1 } else { -1 } })
                .unwrap();
        }
        let ops_before = editor.log().active_ops().to_vec();
        let state = editor.current().unwrap().clone();
        assert_eq!(ops_before.len(), DEFAULT_CAPACITY);

        let bad = EditOp::Watermark(Watermark {
            source: WatermarkSource::Image {
                path: "/nonexistent/logo.png".into(),
            },
            x: 0,
            y: 0,
            size: 8,
            opacity: 80,
        });
        assert!(editor.apply(bad).is_err());
        // The oldest entry must survive the failed append.
        assert_eq!(editor.log().active_ops(), ops_before.as_slice());
        assert_eq!(editor.current().unwrap(), &state);
    }

    #[test]
    fn text_watermark_is_rejected_without_a_font() {
        let mut editor = editor_with_gradient();
        let wm = EditOp::Watermark(Watermark {
            source: WatermarkSource::Text {
                content: "draft".to_string(),
                color: [255, 255, 255],
            },
            x: 2,
            y: 8,
            size: 6,
            opacity: 100,
        });
        assert!(matches!(editor.apply(wm), Err(EditorError::MissingFont)));
        assert!(editor.log().is_empty());
    }

    #[test]
    fn compare_toggle_flips_between_original_and_edited() {
        let mut editor = editor_with_gradient();
        let original = editor.current().unwrap().clone();
        editor.apply(EditOp::Brightness { value: 40 }).unwrap();
        let edited = editor.current().unwrap().clone();

        assert!(editor.toggle_compare());
        assert_eq!(editor.displayed().unwrap(), &original);
        // The edited state is retained underneath.
        assert_eq!(editor.current().unwrap(), &edited);
        assert!(!editor.toggle_compare());
        assert_eq!(editor.displayed().unwrap(), &edited);
    }

    #[test]
    fn applying_an_edit_exits_compare_mode() {
        let mut editor = editor_with_gradient();
        editor.apply(EditOp::Brightness { value: 10 }).unwrap();
        editor.toggle_compare();
        assert!(editor.is_comparing());
        editor.apply(EditOp::Brightness { value: -10 }).unwrap();
        assert!(!editor.is_comparing());
    }

    #[test]
    fn switching_assets_clears_history_and_view() {
        let mut editor = editor_with_gradient();
        editor.apply(EditOp::Brightness { value: 10 }).unwrap();
        editor.view_mut().zoom_in();

        let other = RgbaImage::from_pixel(4, 4, Rgba([5, 5, 5, 255]));
        let bytes = io::encode_to_vec(&other, SaveFormat::Png, 100).unwrap();
        editor.import_bytes("other.png", bytes).unwrap();

        assert!(!editor.can_undo());
        assert_eq!(editor.view(), &ViewState::default());
        assert_eq!(editor.current().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn export_writes_the_edited_state_even_while_comparing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut editor = editor_with_gradient();
        editor.apply(EditOp::Flip { axis: FlipAxis::Vertical }).unwrap();
        let edited = editor.current().unwrap().clone();
        editor.toggle_compare();

        editor.export_to(&path, SaveFormat::Png, 90).unwrap();
        let (_, written) = io::load_file(&path).unwrap();
        assert_eq!(written, edited);
    }
}
