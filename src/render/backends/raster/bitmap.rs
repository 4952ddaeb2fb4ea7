use std::any::Any;

use crate::errors::{RenderError, Result};
use crate::geometry::UiRect;
use crate::render::backend::{BackendType, Bitmap, RenderObject};
use crate::render::types::BitmapAlphaType;

/// Flat ARGB32 pixel buffer, row-major, stride `width * 4` bytes.
///
/// The invariant `pixels.len() == width * height` holds at all times; a failed
/// [`Bitmap::init`] leaves the buffer at 0x0.
#[derive(Clone, Default)]
pub struct RasterBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    alpha_type: BitmapAlphaType,
}

impl std::fmt::Debug for RasterBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("alpha_type", &self.alpha_type)
            .finish()
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|n| n.checked_mul(4).is_some())
        .ok_or(RenderError::InvalidSize {
            width: width as i64,
            height: height as i64,
        })
}

impl RasterBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-filled (fully transparent) buffer.
    pub fn with_size(width: u32, height: u32) -> Result<Self> {
        let mut bitmap = Self::new();
        bitmap.init(width, height, None, 1.0, BitmapAlphaType::Premul)?;
        Ok(bitmap)
    }

    /// Wrap an existing pixel vector; its length must be `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        let count = pixel_count(width, height)?;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        if pixels.len() != count {
            return Err(RenderError::BufferTooSmall {
                needed: count * 4,
                actual: pixels.len() * 4,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            alpha_type: BitmapAlphaType::Premul,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn bounds(&self) -> UiRect {
        UiRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn bits(&self) -> &[u32] {
        &self.pixels
    }

    pub fn bits_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, argb: u32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels[idx] = argb;
    }

    /// Little-endian byte image of the pixels (B, G, R, A per pixel).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    /// Encode as an 8-bit RGBA PNG, for debugging snapshots.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Err(RenderError::EmptySurface);
        }
        let rgba: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|&p| [(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8])
            .collect();

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&rgba)?;
            writer.finish()?;
        }
        Ok(out)
    }

    fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
    }
}

impl RenderObject for RasterBitmap {
    fn backend_type(&self) -> BackendType {
        BackendType::Raster
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Bitmap for RasterBitmap {
    fn init(
        &mut self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
        _scale: f32,
        alpha_type: BitmapAlphaType,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            self.reset();
            return Err(RenderError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        let count = match pixel_count(width, height) {
            Ok(count) => count,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        let buffer = match pixels {
            Some(bytes) => {
                if bytes.len() < count * 4 {
                    self.reset();
                    return Err(RenderError::BufferTooSmall {
                        needed: count * 4,
                        actual: bytes.len(),
                    });
                }
                bytes[..count * 4]
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect()
            }
            None => vec![0u32; count],
        };

        self.width = width;
        self.height = height;
        self.pixels = buffer;
        self.alpha_type = alpha_type;
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn alpha_type(&self) -> BitmapAlphaType {
        self.alpha_type
    }

    fn lock_pixel_bits(&mut self) -> Option<&mut [u32]> {
        if self.pixels.is_empty() {
            None
        } else {
            Some(&mut self.pixels)
        }
    }

    fn unlock_pixel_bits(&mut self) {}

    fn clone_bitmap(&self) -> Box<dyn Bitmap> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes(w: u32, h: u32) -> Vec<u8> {
        (0..w * h * 4).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn init_round_trips_bytes() {
        let bytes = sample_bytes(5, 3);
        let mut bitmap = RasterBitmap::new();
        bitmap.init(5, 3, Some(&bytes), 1.0, BitmapAlphaType::Premul).unwrap();
        assert_eq!(bitmap.to_bytes(), bytes);
        assert_eq!(bitmap.bits().len(), 15);
    }

    #[test]
    fn zero_dimension_resets_the_buffer() {
        let mut bitmap = RasterBitmap::with_size(4, 4).unwrap();
        assert!(bitmap.init(0, 4, None, 1.0, BitmapAlphaType::Premul).is_err());
        assert_eq!((bitmap.width(), bitmap.height()), (0, 0));
        assert!(bitmap.lock_pixel_bits().is_none());
    }

    #[test]
    fn short_pixel_data_is_rejected() {
        let mut bitmap = RasterBitmap::new();
        let res = bitmap.init(4, 4, Some(&[0u8; 10]), 1.0, BitmapAlphaType::Premul);
        assert!(matches!(res, Err(RenderError::BufferTooSmall { needed: 64, actual: 10 })));
    }

    #[test]
    fn clone_is_deep() {
        let mut original = RasterBitmap::with_size(2, 2).unwrap();
        original.set_pixel(0, 0, 0xFF11_2233);
        let copy = original.clone_bitmap();
        let copy = copy.as_any().downcast_ref::<RasterBitmap>().unwrap();
        assert_eq!(copy.bits(), original.bits());

        original.set_pixel(0, 0, 0xFF00_0000);
        assert_eq!(copy.pixel(0, 0), Some(0xFF11_2233));
        assert_eq!(original.pixel(0, 0), Some(0xFF00_0000));
    }

    #[test]
    fn lock_gives_direct_access() {
        let mut bitmap = RasterBitmap::with_size(3, 1).unwrap();
        if let Some(bits) = bitmap.lock_pixel_bits() {
            bits[2] = 0x8000_00FF;
        }
        bitmap.unlock_pixel_bits();
        assert_eq!(bitmap.pixel(2, 0), Some(0x8000_00FF));
    }

    #[test]
    fn png_has_signature() {
        let bitmap = RasterBitmap::with_size(2, 2).unwrap();
        let png = bitmap.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert!(RasterBitmap::new().encode_png().is_err());
    }
}
