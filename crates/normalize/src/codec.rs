//! General codec: decode anything the `image` crate understands and write JPEG.
//!
//! Baseline JPEG goes through `image`'s encoder; progressive JPEG goes through
//! `mozjpeg`, which reports failures by unwinding, so that path runs under
//! `catch_unwind`.

use std::io::Cursor;
use std::panic;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbImage};

use crate::error::ConversionError;

/// Decode bytes in any supported raster format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ConversionError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ConversionError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| ConversionError::Decode(e.to_string()))
}

/// Encode as JPEG, dropping any alpha channel.
pub fn encode_jpeg(
    img: &DynamicImage,
    quality: u8,
    progressive: bool,
) -> Result<Vec<u8>, ConversionError> {
    let rgb = img.to_rgb8();
    if progressive {
        encode_progressive(&rgb, quality)
    } else {
        encode_baseline(&rgb, quality)
    }
}

/// Decode and re-encode in one pass.
pub fn reencode(bytes: &[u8], quality: u8, progressive: bool) -> Result<Vec<u8>, ConversionError> {
    let img = decode(bytes)?;
    encode_jpeg(&img, quality, progressive)
}

fn encode_baseline(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ConversionError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(rgb.clone())
        .write_with_encoder(encoder)
        .map_err(|e| ConversionError::Encode(e.to_string()))?;
    Ok(out)
}

fn encode_progressive(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ConversionError> {
    let (width, height) = rgb.dimensions();
    let pixels = rgb.as_raw();

    let result = panic::catch_unwind(|| {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(f32::from(quality));
        comp.set_progressive_mode();

        let mut started = comp
            .start_compress(Vec::new())
            .map_err(|e| format!("mozjpeg start failed: {e}"))?;
        started
            .write_scanlines(pixels)
            .map_err(|e| format!("mozjpeg: failed to write scanlines: {e}"))?;
        started
            .finish()
            .map_err(|e| format!("mozjpeg finish failed: {e}"))
    });

    match result {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(ConversionError::Encode(e)),
        Err(_) => Err(ConversionError::Encode(
            "mozjpeg panicked during encode".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_fixture(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 90, 200]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn baseline_reencode_produces_jpeg() {
        let jpeg = reencode(&png_fixture(16, 12), 90, false).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let back = decode(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (16, 12));
    }

    #[test]
    fn progressive_output_decodes() {
        let jpeg = reencode(&png_fixture(24, 24), 95, true).unwrap();
        // SOF2 marks a progressive frame.
        assert!(jpeg.windows(2).any(|w| w == [0xFF, 0xC2]));
        let back = decode(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (24, 24));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = reencode(b"definitely not an image", 90, false).unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)));
    }
}
