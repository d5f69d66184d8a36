//! Image payload decoding for image stamps.
//!
//! Signature and seal images arrive as PNG or JPEG bytes. Opacity is baked
//! into the alpha channel before the image reaches the engine, so the engine
//! only ever embeds an RGBA bitmap.

use super::placement::blends;
use crate::error::StampError;
use image::DynamicImage;
use tracing::debug;

/// Decode `bytes` and apply `opacity` when it is strictly between 0 and 1.
///
/// # Errors
/// [`StampError::Engine`] when the bytes are not a supported image.
pub fn decode_stamp_image(bytes: &[u8], opacity: f32) -> Result<DynamicImage, StampError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| StampError::engine("decode image", e))?;
    debug!(
        "Decoded stamp image {}x{} px (opacity {})",
        image.width(),
        image.height(),
        opacity
    );

    if !blends(opacity) {
        return Ok(image);
    }

    let mut rgba = image.into_rgba8();
    for pixel in rgba.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * opacity).round() as u8;
    }
    Ok(DynamicImage::ImageRgba8(rgba))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(alpha: u8) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([200, 10, 10, alpha])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode png");
        buf
    }

    #[test]
    fn opaque_image_is_untouched() {
        let img = decode_stamp_image(&png(255), 1.0).unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
        assert_eq!(img.to_rgba8().get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn fractional_opacity_scales_alpha() {
        let img = decode_stamp_image(&png(200), 0.5).unwrap();
        assert_eq!(img.to_rgba8().get_pixel(3, 1).0, [200, 10, 10, 100]);
    }

    #[test]
    fn out_of_range_opacity_means_opaque() {
        for opacity in [0.0, -1.0, 1.5] {
            let img = decode_stamp_image(&png(255), opacity).unwrap();
            assert_eq!(img.to_rgba8().get_pixel(1, 1)[3], 255, "opacity {opacity}");
        }
    }

    #[test]
    fn garbage_bytes_are_engine_error() {
        let err = decode_stamp_image(b"not an image", 1.0).unwrap_err();
        assert!(matches!(err, StampError::Engine { stage: "decode image", .. }));
    }
}
