//! PNG codec backed by the `image` crate.

use image::codecs::png::PngEncoder;
use image::{ColorType, ExtendedColorType, ImageEncoder, ImageFormat};

use super::image::{ColorFormat, Image, ImageCodec};

/// Decodes and encodes PNG files. Grayscale decodes to [`ColorFormat::Alpha`],
/// RGB to [`ColorFormat::Rgb`], everything else is expanded to RGBA.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn decode(&self, bytes: &[u8]) -> Option<Image> {
        let decoded = match image::load_from_memory_with_format(bytes, ImageFormat::Png) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::error!("PNG decode failed: {err}");
                return None;
            }
        };

        let (width, height) = (decoded.width(), decoded.height());
        let (format, pixels) = match decoded.color() {
            ColorType::L8 => (ColorFormat::Alpha, decoded.into_luma8().into_raw()),
            ColorType::Rgb8 => (ColorFormat::Rgb, decoded.into_rgb8().into_raw()),
            _ => (ColorFormat::Rgba, decoded.into_rgba8().into_raw()),
        };
        Image::from_pixels(width, height, format, pixels)
    }

    fn encode(&self, image: &Image) -> Option<Vec<u8>> {
        let color = match image.format() {
            ColorFormat::Rgba => ExtendedColorType::Rgba8,
            ColorFormat::Rgb => ExtendedColorType::Rgb8,
            ColorFormat::Alpha => ExtendedColorType::L8,
        };

        let mut out = Vec::new();
        let result = PngEncoder::new(&mut out).write_image(
            image.pixels(),
            image.width(),
            image.height(),
            color,
        );
        match result {
            Ok(()) => Some(out),
            Err(err) => {
                log::error!("PNG encode failed: {err}");
                None
            }
        }
    }
}
