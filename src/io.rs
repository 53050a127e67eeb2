// ============================================================================
// IMAGE I/O — decoding uploads and encoding exports
// ============================================================================

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::error::EditorError;

/// Upscale factor applied to each page of a multi-page document when it is
/// rendered into a raster asset.
pub const PAGE_RENDER_SCALE: u32 = 3;

/// Export encodings the editor can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
        }
    }

    /// Parse a format name or file extension, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, EditorError> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(SaveFormat::Png),
            "jpg" | "jpeg" => Ok(SaveFormat::Jpeg),
            "webp" => Ok(SaveFormat::Webp),
            "bmp" => Ok(SaveFormat::Bmp),
            other => Err(EditorError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Decode an in-memory image into RGBA. The format is sniffed from the bytes;
/// the caller decides which sniffed formats it accepts.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, EditorError> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.into_rgba8())
}

/// Sniff the container format from the leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, EditorError> {
    image::guess_format(bytes).map_err(EditorError::Image)
}

/// Decode every page of a multi-page GIF document, composited per the GIF
/// disposal rules, and upscale each page by [`PAGE_RENDER_SCALE`] so page
/// assets hold enough resolution for further editing.
pub fn decode_document_pages(bytes: &[u8]) -> Result<Vec<RgbaImage>, EditorError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| EditorError::UnsupportedFormat(format!("bad GIF stream: {}", e)))?;

    let width = decoder.width() as u32;
    let height = decoder.height() as u32;

    let mut pages: Vec<RgbaImage> = Vec::new();
    // Running canvas for page composition; GIF frames can be partial.
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut prev_canvas = canvas.clone();

    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| EditorError::UnsupportedFormat(format!("GIF page decode error: {}", e)))?
    {
        let frame_x = frame.left as u32;
        let frame_y = frame.top as u32;
        let frame_w = frame.width as u32;
        let frame_h = frame.height as u32;
        let disposal = frame.dispose;

        if disposal == gif::DisposalMethod::Previous {
            prev_canvas = canvas.clone();
        }

        let frame_buf = &frame.buffer;
        for fy in 0..frame_h {
            for fx in 0..frame_w {
                let cx = frame_x + fx;
                let cy = frame_y + fy;
                if cx < width && cy < height {
                    let idx = ((fy * frame_w + fx) * 4) as usize;
                    if idx + 3 < frame_buf.len() && frame_buf[idx + 3] > 0 {
                        canvas.put_pixel(
                            cx,
                            cy,
                            Rgba([
                                frame_buf[idx],
                                frame_buf[idx + 1],
                                frame_buf[idx + 2],
                                frame_buf[idx + 3],
                            ]),
                        );
                    }
                }
            }
        }

        pages.push(upscale_page(&canvas));

        match disposal {
            gif::DisposalMethod::Background => {
                for fy in 0..frame_h {
                    for fx in 0..frame_w {
                        let cx = frame_x + fx;
                        let cy = frame_y + fy;
                        if cx < width && cy < height {
                            canvas.put_pixel(cx, cy, Rgba([0, 0, 0, 0]));
                        }
                    }
                }
            }
            gif::DisposalMethod::Previous => {
                canvas = prev_canvas.clone();
            }
            _ => {}
        }
    }

    if pages.is_empty() {
        return Err(EditorError::UnsupportedFormat(
            "document contains no pages".to_string(),
        ));
    }

    Ok(pages)
}

fn upscale_page(page: &RgbaImage) -> RgbaImage {
    image::imageops::resize(
        page,
        page.width() * PAGE_RENDER_SCALE,
        page.height() * PAGE_RENDER_SCALE,
        image::imageops::FilterType::Triangle,
    )
}

/// Encode and write an image to a file.
///
/// Standalone function with no shared state so exports can run from worker
/// threads. `quality` applies to JPEG only.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), EditorError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.save(path)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }

    Ok(())
}

/// Encode an image into an in-memory buffer. Same encoders as
/// [`encode_and_write`], for callers that never touch the filesystem.
pub fn encode_to_vec(
    image: &RgbaImage,
    format: SaveFormat,
    quality: u8,
) -> Result<Vec<u8>, EditorError> {
    let mut out = Cursor::new(Vec::new());

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut out);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.write_to(&mut out, image::ImageOutputFormat::WebP)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut out);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }

    Ok(out.into_inner())
}

/// Read a file and decode it, returning both the raw bytes and the RGBA
/// buffer.
pub fn load_file(path: &Path) -> Result<(Vec<u8>, RgbaImage), EditorError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut reader, &mut bytes)?;
    let img = decode_image(&bytes)?;
    Ok((bytes, img))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn parse_accepts_known_extensions() {
        assert_eq!(SaveFormat::parse("PNG").unwrap(), SaveFormat::Png);
        assert_eq!(SaveFormat::parse("jpeg").unwrap(), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::parse("jpg").unwrap(), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::parse("webp").unwrap(), SaveFormat::Webp);
        assert!(matches!(
            SaveFormat::parse("tiff"),
            Err(EditorError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn png_encode_round_trips_losslessly() {
        let img = checker(9, 7);
        let bytes = encode_to_vec(&img, SaveFormat::Png, 90).unwrap();
        assert_eq!(sniff_format(&bytes).unwrap(), ImageFormat::Png);
        let back = decode_image(&bytes).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn jpeg_encode_produces_decodable_output() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([120, 80, 40, 255]));
        let bytes = encode_to_vec(&img, SaveFormat::Jpeg, 90).unwrap();
        assert_eq!(sniff_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let back = decode_image(&bytes).unwrap();
        assert_eq!(back.dimensions(), (16, 16));
    }

    #[test]
    fn encode_and_write_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        encode_and_write(&checker(4, 4), &path, SaveFormat::Png, 90).unwrap();
        let (_, img) = load_file(&path).unwrap();
        assert_eq!(img, checker(4, 4));
    }

    #[test]
    fn decode_rejects_non_image_bytes() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn document_pages_decode_and_upscale() {
        // Two-frame 2x2 GIF built with the encoder; pages come back at x3.
        let mut buf = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut buf, 2, 2, &[]).unwrap();
            for shade in [0u8, 200] {
                let mut pixels = vec![shade; 2 * 2 * 4];
                for px in pixels.chunks_mut(4) {
                    px[3] = 255;
                }
                let frame = gif::Frame::from_rgba(2, 2, &mut pixels);
                encoder.write_frame(&frame).unwrap();
            }
        }
        let pages = decode_document_pages(&buf).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].dimensions(), (6, 6));
        assert_eq!(pages[1].dimensions(), (6, 6));
    }
}
