//! # Paletted Images
//!
//! Touch buttons can carry up to two bitmap images (e.g. a logo for the
//! pressed and released states). Firmware renders 8-bit paletted bitmaps:
//! a 256-entry RGB565 palette with index 0 reserved for transparency,
//! followed by one palette index per pixel.
//!
//! The image *record* packed into the main region is 12 bytes — dimensions
//! plus offsets to the palette and pixel payloads, which are interned in
//! the blob pool. Producing those payloads from a source picture is the
//! `image` crate's job; this module only indexes colours. Sources with more
//! than 255 distinct colours (index 0 is reserved) must be quantized before
//! they get here.

use std::path::Path;

use crate::error::PackError;
use crate::pack::{EntityId, OffsetTable, Package, Packable, Ref, TextBlob};

/// Palette slot count. Index 0 is the transparent colour.
pub const PALETTE_SIZE: usize = 256;

/// Source colour treated as transparent (magenta).
pub const TRANSPARENT_RGB: (u8, u8, u8) = (255, 0, 255);

fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// A paletted bitmap, packable as a 12-byte record plus two interned blobs.
pub struct RemoteImage {
    id: EntityId,
    name: String,
    width: u16,
    height: u16,
    palette: Ref,
    pixels: Ref,
    palette_blob: Option<TextBlob>,
    pixel_blob: Option<TextBlob>,
}

impl RemoteImage {
    /// Build an image from ready-made palette entries and pixel indices.
    ///
    /// This is the engine boundary: callers that quantize elsewhere hand
    /// over the finished arrays. The palette is padded (or truncated) to
    /// 256 entries.
    pub fn from_parts(
        name: &str,
        width: u16,
        height: u16,
        mut palette: Vec<u16>,
        pixels: Vec<u8>,
    ) -> Result<Self, PackError> {
        if pixels.len() != width as usize * height as usize {
            return Err(PackError::Image(format!(
                "image '{}': {} pixels for {}x{}",
                name,
                pixels.len(),
                width,
                height
            )));
        }
        palette.resize(PALETTE_SIZE, 0);

        let mut palette_bytes = Vec::with_capacity(PALETTE_SIZE * 2);
        for entry in &palette {
            palette_bytes.extend_from_slice(&entry.to_le_bytes());
        }
        // The firmware reads the palette as uint16_t*, so it must never
        // land at an odd offset in the blob pool
        let palette_blob = TextBlob::from_bytes(&format!("{name}-palette"), palette_bytes).aligned(2);
        let pixel_blob = TextBlob::from_bytes(&format!("{name}-pixels"), pixels);

        Ok(RemoteImage {
            id: EntityId::fresh(),
            name: name.to_string(),
            width,
            height,
            palette: Ref::to(palette_blob.id()),
            pixels: Ref::to(pixel_blob.id()),
            palette_blob: Some(palette_blob),
            pixel_blob: Some(pixel_blob),
        })
    }

    /// Index an RGB image's colours into a palette.
    ///
    /// Magenta pixels map to the transparent index 0. More than 255 other
    /// distinct colours is an error — quantization is not this crate's job.
    pub fn from_rgb8(name: &str, source: &image::RgbImage) -> Result<Self, PackError> {
        let (width, height) = source.dimensions();
        let mut palette: Vec<u16> = vec![rgb565(255, 0, 255)];
        let mut lookup = std::collections::HashMap::new();
        let mut pixels = Vec::with_capacity((width * height) as usize);

        for pixel in source.pixels() {
            let [r, g, b] = pixel.0;
            let index = if (r, g, b) == TRANSPARENT_RGB {
                0u8
            } else {
                let entry = rgb565(r, g, b);
                match lookup.get(&entry) {
                    Some(index) => *index,
                    None => {
                        if palette.len() >= PALETTE_SIZE {
                            return Err(PackError::Image(format!(
                                "image '{name}' has more than 255 distinct colours"
                            )));
                        }
                        let index = palette.len() as u8;
                        palette.push(entry);
                        lookup.insert(entry, index);
                        index
                    }
                }
            };
            pixels.push(index);
        }

        RemoteImage::from_parts(name, width as u16, height as u16, palette, pixels)
    }

    /// Load and index an image file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PackError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let source = image::open(path)
            .map_err(|e| PackError::Image(format!("{}: {e}", path.display())))?;
        RemoteImage::from_rgb8(&name, &source.to_rgb8())
    }
}

impl Packable for RemoteImage {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("Image '{}' ({}x{})", self.name, self.width, self.height)
    }

    fn size(&self) -> u32 {
        12
    }

    fn enqueue_children(&mut self, package: &mut Package) {
        if let Some(blob) = self.palette_blob.take() {
            package.append_text(blob);
        }
        if let Some(blob) = self.pixel_blob.take() {
            package.append_text(blob);
        }
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        self.palette.resolve(table, &owner, "palette");
        self.pixels.resolve(table, &owner, "pixels");
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.palette.offset().to_le_bytes());
        out.extend_from_slice(&self.pixels.offset().to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb565(0, 0, 255), 0x001F);
    }

    #[test]
    fn test_from_parts_rejects_size_mismatch() {
        let result = RemoteImage::from_parts("bad", 4, 4, vec![0; 256], vec![0; 15]);
        assert!(matches!(result, Err(PackError::Image(_))));
    }

    #[test]
    fn test_magenta_maps_to_transparent_index() {
        let mut source = image::RgbImage::new(2, 1);
        source.put_pixel(0, 0, image::Rgb([255, 0, 255]));
        source.put_pixel(1, 0, image::Rgb([10, 20, 30]));
        let img = RemoteImage::from_rgb8("icon", &source).unwrap();
        let blob = img.pixel_blob.as_ref().unwrap();
        let mut out = Vec::new();
        blob.encode(&mut out);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 1);
    }

    #[test]
    fn test_palette_blob_is_halfword_aligned() {
        let img = RemoteImage::from_parts("icon", 2, 2, vec![0xF800; 4], vec![0; 4]).unwrap();
        assert_eq!(img.palette_blob.as_ref().unwrap().alignment(), 2);
        assert_eq!(img.pixel_blob.as_ref().unwrap().alignment(), 1);
    }

    #[test]
    fn test_too_many_colours_is_an_error() {
        let mut source = image::RgbImage::new(16, 16);
        for (i, pixel) in source.pixels_mut().enumerate() {
            // 256 colours that stay distinct after RGB565 truncation
            *pixel = image::Rgb([((i % 32) * 8) as u8, ((i / 32) * 8) as u8, 0]);
        }
        assert!(matches!(
            RemoteImage::from_rgb8("noise", &source),
            Err(PackError::Image(_))
        ));
    }
}
