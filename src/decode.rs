//! Turning an untrusted base64 payload into an RGB pixel grid

use crate::error::DecodeError;
use base64::{engine::general_purpose, Engine as _};
use image::error::{LimitError, LimitErrorKind};
use image::{ImageError, RgbImage};
use std::fmt::Debug;

/// A decoded image, always 8-bit RGB with non-zero dimensions
#[derive(Clone, PartialEq)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Row-major (H, W, 3) pixel buffer
    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }
}

impl Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DecodedImage {{ pixels: <data>, height: {}, width: {} }}",
            self.height(),
            self.width()
        )
    }
}

impl TryFrom<RgbImage> for DecodedImage {
    type Error = DecodeError;

    fn try_from(pixels: RgbImage) -> Result<Self, Self::Error> {
        if pixels.width() == 0 || pixels.height() == 0 {
            let err = LimitError::from_kind(LimitErrorKind::DimensionError);
            return Err(ImageError::Limits(err).into());
        }
        Ok(DecodedImage { pixels })
    }
}

/// The encoded body of a payload: the text after the last comma, so a
/// `data:image/png;base64,` prefix is skipped
fn encoded_body(payload: &str) -> &str {
    payload.rsplit(',').next().unwrap_or(payload).trim()
}

/// Decode a base64 payload (optionally data-URI prefixed) into an RGB image.
/// The container format is detected from the decoded bytes.
pub fn decode(payload: &str) -> Result<DecodedImage, DecodeError> {
    let body = encoded_body(payload);
    if body.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let bytes = general_purpose::STANDARD.decode(body)?;
    let format = image::guess_format(&bytes)?;
    let image = image::load_from_memory_with_format(&bytes, format)?;

    // Gray, alpha, 16-bit and BGR-stored sources all end up as 8-bit RGB
    image.to_rgb8().try_into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageOutputFormat) -> String {
        let mut bytes: Vec<u8> = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        general_purpose::STANDARD.encode(bytes)
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn test_png_is_rgb() {
        let payload = encode(solid(4, 3, [255, 0, 0]), ImageOutputFormat::Png);
        let image = decode(&payload).unwrap();
        assert_eq!((image.height(), image.width()), (3, 4));
        assert_eq!(*image.as_rgb().get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_bmp_is_rgb() {
        // BMP stores pixels as BGR on disk
        let payload = encode(solid(2, 2, [10, 20, 200]), ImageOutputFormat::Bmp);
        let image = decode(&payload).unwrap();
        assert_eq!(*image.as_rgb().get_pixel(1, 1), Rgb([10, 20, 200]));
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 128]));
        let payload = encode(DynamicImage::ImageRgba8(rgba), ImageOutputFormat::Png);
        let image = decode(&payload).unwrap();
        assert_eq!(*image.as_rgb().get_pixel(0, 1), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_data_uri_prefix() {
        let payload = encode(solid(1, 1, [1, 2, 3]), ImageOutputFormat::Png);
        let image = decode(&format!("data:image/png;base64,{payload}")).unwrap();
        assert_eq!(*image.as_rgb().get_pixel(0, 0), Rgb([1, 2, 3]));
    }

    #[test]
    fn test_last_segment_wins() {
        assert_eq!(encoded_body("a,b,c"), "c");
        assert_eq!(encoded_body("abc"), "abc");
        assert_eq!(encoded_body("data:image/png;base64,"), "");
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(decode(""), Err(DecodeError::EmptyInput)));
        assert!(matches!(decode("   "), Err(DecodeError::EmptyInput)));
        assert!(matches!(
            decode("data:image/png;base64,"),
            Err(DecodeError::EmptyInput)
        ));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            decode("not base64 at all!"),
            Err(DecodeError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_not_an_image() {
        let payload = general_purpose::STANDARD.encode(b"definitely not an image");
        assert!(matches!(decode(&payload), Err(DecodeError::InvalidImage(_))));
    }

    #[test]
    fn test_truncated_image() {
        let mut bytes: Vec<u8> = Vec::new();
        solid(8, 8, [9, 9, 9])
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes.truncate(bytes.len() / 2);
        let payload = general_purpose::STANDARD.encode(bytes);
        assert!(matches!(decode(&payload), Err(DecodeError::InvalidImage(_))));
    }

    #[test]
    fn test_zero_sized_image() {
        assert!(matches!(
            DecodedImage::try_from(RgbImage::new(0, 5)),
            Err(DecodeError::InvalidImage(_))
        ));
    }
}
