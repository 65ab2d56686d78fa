use std::io::Cursor;

use image::ImageFormat;

/// Longest edge of a stored portrait, in pixels.
pub const MAX_PORTRAIT_DIMENSION: u32 = 400;

#[derive(Debug, thiserror::Error)]
pub enum PortraitError {
    #[error("empty image data")]
    Empty,
    #[error("unrecognized image data: {0}")]
    Decode(#[from] image::ImageError),
}

/// Normalize uploaded portrait bytes into the stored representation.
///
/// Decodes any supported format, scales the image down so neither edge
/// exceeds [`MAX_PORTRAIT_DIMENSION`], and re-encodes as PNG.
pub fn normalize(data: &[u8]) -> Result<Vec<u8>, PortraitError> {
    if data.is_empty() {
        return Err(PortraitError::Empty);
    }
    let mut img = image::load_from_memory(data)?;
    if img.width() > MAX_PORTRAIT_DIMENSION || img.height() > MAX_PORTRAIT_DIMENSION {
        img = img.thumbnail(MAX_PORTRAIT_DIMENSION, MAX_PORTRAIT_DIMENSION);
    }
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(normalize(&[]), Err(PortraitError::Empty)));
    }

    #[test]
    fn test_rejects_non_image_input() {
        assert!(matches!(
            normalize(b"not an image"),
            Err(PortraitError::Decode(_))
        ));
    }

    #[test]
    fn test_large_image_is_scaled_down() {
        let out = normalize(&png_bytes(800, 600)).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert!(img.width() <= MAX_PORTRAIT_DIMENSION);
        assert!(img.height() <= MAX_PORTRAIT_DIMENSION);
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let out = normalize(&png_bytes(120, 160)).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (120, 160));
    }
}
