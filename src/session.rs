// ============================================================================
// SESSION STORE — uploaded assets, thumbnails, and session persistence
// ============================================================================
//
// The store owns the original bytes of every uploaded asset. Originals are
// never modified by editing; the editor decodes a fresh copy whenever an
// asset becomes active.
// ============================================================================

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use image::{ImageFormat, RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EditorError;
use crate::io::{self, SaveFormat};

/// Maximum accepted upload size.
pub const MAX_ASSET_BYTES: usize = 50 * 1024 * 1024;
/// Longest side of a generated thumbnail.
pub const THUMBNAIL_MAX_DIM: u32 = 100;
/// JPEG quality used for thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 70;

/// Magic bytes at the start of a saved session file.
pub const SESSION_MAGIC: &[u8; 4] = b"EFS1";

/// One uploaded image (or one rendered document page).
///
/// `bytes` is the encoded original exactly as uploaded, except for document
/// pages which are stored as the PNG encoding of the rendered page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub bytes: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
}

impl Asset {
    /// Decode the stored original into an RGBA buffer.
    pub fn decode(&self) -> Result<RgbaImage, EditorError> {
        io::decode_image(&self.bytes)
    }
}

#[derive(Serialize, Deserialize)]
struct SessionFile {
    assets: Vec<Asset>,
    active: Option<Uuid>,
}

/// In-memory collection of uploaded assets plus the active selection.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    assets: Vec<Asset>,
    active: Option<Uuid>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest uploaded bytes under the given display name.
    ///
    /// Single images become one asset. Multi-page GIF documents become one
    /// asset per rendered page. Returns the ids of the new assets, first of
    /// which is made active.
    pub fn add_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<Vec<Uuid>, EditorError> {
        if bytes.len() > MAX_ASSET_BYTES {
            return Err(EditorError::FileTooLarge {
                size: bytes.len() as u64,
                max: MAX_ASSET_BYTES as u64,
            });
        }

        let format = io::sniff_format(&bytes)?;
        let new_ids = match format {
            ImageFormat::Gif => self.add_document(name, &bytes)?,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => {
                let decoded = io::decode_image(&bytes)?;
                let id = self.push_asset(name.to_string(), bytes, &decoded);
                vec![id]
            }
            other => {
                return Err(EditorError::UnsupportedFormat(format!("{:?}", other)));
            }
        };

        self.active = Some(new_ids[0]);
        log_info!("session: added {} asset(s) from '{}'", new_ids.len(), name);
        Ok(new_ids)
    }

    /// Ingest a file from disk. The file stem becomes the asset name.
    pub fn add_file(&mut self, path: &Path) -> Result<Vec<Uuid>, EditorError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        let mut bytes = Vec::new();
        BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
        self.add_bytes(&name, bytes)
    }

    /// Render each page of a multi-page document into its own asset.
    fn add_document(&mut self, name: &str, bytes: &[u8]) -> Result<Vec<Uuid>, EditorError> {
        let pages = io::decode_document_pages(bytes)?;
        let multi = pages.len() > 1;
        let mut ids = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            let page_name = if multi {
                format!("{} (page {})", name, i + 1)
            } else {
                name.to_string()
            };
            let encoded = io::encode_to_vec(page, SaveFormat::Png, 100)?;
            ids.push(self.push_asset(page_name, encoded, page));
        }
        Ok(ids)
    }

    fn push_asset(&mut self, name: String, bytes: Vec<u8>, decoded: &RgbaImage) -> Uuid {
        let id = Uuid::new_v4();
        let thumbnail = make_thumbnail(decoded);
        self.assets.push(Asset {
            id,
            name,
            bytes,
            thumbnail,
        });
        id
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn active_asset(&self) -> Option<&Asset> {
        self.active.and_then(|id| self.get(id))
    }

    /// Make `id` the active asset.
    pub fn set_active(&mut self, id: Uuid) -> Result<(), EditorError> {
        if self.get(id).is_none() {
            return Err(EditorError::UnknownAsset(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Remove an asset. If it was active, the first remaining asset (if any)
    /// becomes active.
    pub fn remove(&mut self, id: Uuid) -> Result<(), EditorError> {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        if self.assets.len() == before {
            return Err(EditorError::UnknownAsset(id));
        }
        if self.active == Some(id) {
            self.active = self.assets.first().map(|a| a.id);
        }
        Ok(())
    }

    /// Persist all assets and the active selection to a session file.
    pub fn save(&self, path: &Path) -> Result<(), EditorError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(SESSION_MAGIC)?;
        let payload = SessionFile {
            assets: self.assets.clone(),
            active: self.active,
        };
        bincode::serialize_into(&mut writer, &payload)
            .map_err(|e| EditorError::Session(format!("encode failed: {}", e)))?;
        writer.flush()?;
        log_info!("session: saved {} asset(s) to {}", self.assets.len(), path.display());
        Ok(())
    }

    /// Load a session file written by [`SessionStore::save`].
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != SESSION_MAGIC {
            return Err(EditorError::Session(
                "not a session file (bad magic)".to_string(),
            ));
        }
        let payload: SessionFile = bincode::deserialize_from(&mut reader)
            .map_err(|e| EditorError::Session(format!("decode failed: {}", e)))?;

        let mut store = Self {
            assets: payload.assets,
            active: payload.active,
        };
        // An active id not present in the asset list falls back to the first.
        if let Some(id) = store.active
            && store.get(id).is_none()
        {
            store.active = store.assets.first().map(|a| a.id);
        }
        Ok(store)
    }
}

/// Encode a thumbnail capped at [`THUMBNAIL_MAX_DIM`] on the longest side.
/// Returns `None` when thumbnail encoding fails; assets work without one.
fn make_thumbnail(img: &RgbaImage) -> Option<Vec<u8>> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let scale = (THUMBNAIL_MAX_DIM as f32 / w.max(h) as f32).min(1.0);
    let tw = ((w as f32 * scale).round() as u32).max(1);
    let th = ((h as f32 * scale).round() as u32).max(1);
    let small = imageops::resize(img, tw, th, imageops::FilterType::Triangle);
    io::encode_to_vec(&small, SaveFormat::Jpeg, THUMBNAIL_JPEG_QUALITY).ok()
}
