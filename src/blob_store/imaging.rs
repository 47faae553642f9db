/// Image decoding, thumbnailing and placeholders
use crate::config::ThumbnailConfig;
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Placeholder size in pixels
const PLACEHOLDER_WIDTH: u32 = 400;
const PLACEHOLDER_HEIGHT: u32 = 300;

/// Image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// What could be derived from an uploaded image
#[derive(Debug, Default)]
pub struct DerivedImage {
    pub dimensions: Option<ImageDimensions>,
    /// JPEG-encoded thumbnail
    pub thumbnail: Option<Vec<u8>>,
}

/// Decode once, then read dimensions and build the thumbnail
///
/// Undecodable input yields an empty result rather than an error.
pub fn derive(data: &[u8], options: &ThumbnailConfig) -> DerivedImage {
    let img = match image::load_from_memory(data) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("Failed to decode image: {}", e);
            return DerivedImage::default();
        }
    };

    let dimensions = Some(ImageDimensions {
        width: img.width(),
        height: img.height(),
    });

    let thumbnail = match encode_thumbnail(&img, options) {
        Ok(buf) => Some(buf),
        Err(e) => {
            tracing::warn!("Failed to encode thumbnail: {}", e);
            None
        }
    };

    DerivedImage {
        dimensions,
        thumbnail,
    }
}

#[cfg(test)]
pub(crate) fn extract_dimensions(data: &[u8]) -> Option<ImageDimensions> {
    match image::load_from_memory(data) {
        Ok(img) => Some(ImageDimensions {
            width: img.width(),
            height: img.height(),
        }),
        Err(e) => {
            tracing::warn!("Failed to extract image dimensions: {}", e);
            None
        }
    }
}

/// Shrink to fit `max_size`×`max_size`, preserving aspect ratio
///
/// Images already inside the box keep their size.
fn encode_thumbnail(img: &DynamicImage, options: &ThumbnailConfig) -> image::ImageResult<Vec<u8>> {
    let max = options.max_size;
    let thumb = if img.width() > max || img.height() > max {
        img.thumbnail(max, max)
    } else {
        img.clone()
    };

    // JPEG has no alpha channel
    let rgb = thumb.to_rgb8();

    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, options.quality);
        encoder.encode_image(&rgb)?;
    }

    Ok(buf)
}

/// Neutral grey placeholder encoded to match `content_type`
///
/// Unknown content types get a PNG.
pub fn placeholder(content_type: &str) -> Vec<u8> {
    let img = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, Rgb([243, 244, 246]));
    let img = DynamicImage::ImageRgb8(img);

    let format = match content_type {
        "image/jpeg" => ImageFormat::Jpeg,
        "image/gif" => ImageFormat::Gif,
        "image/webp" => ImageFormat::WebP,
        _ => ImageFormat::Png,
    };

    let mut buf = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut buf), format) {
        tracing::warn!("Failed to encode {:?} placeholder: {}", format, e);
        buf.clear();
        // PNG encoding of an RGB buffer does not fail in practice
        let _ = img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png);
    }
    buf
}

#[cfg(test)]
pub(crate) fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_landscape_thumbnail_fits_box() {
        let data = encode_test_image(1200, 600, ImageFormat::Png);
        let derived = derive(&data, &ThumbnailConfig::default());

        assert_eq!(
            derived.dimensions,
            Some(ImageDimensions { width: 1200, height: 600 })
        );

        let thumb = derived.thumbnail.expect("thumbnail");
        let dims = extract_dimensions(&thumb).unwrap();
        assert_eq!(dims.width, 300);
        assert_eq!(dims.height, 150);
        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let data = encode_test_image(40, 20, ImageFormat::Png);
        let derived = derive(&data, &ThumbnailConfig::default());

        let dims = extract_dimensions(&derived.thumbnail.unwrap()).unwrap();
        assert_eq!(dims, ImageDimensions { width: 40, height: 20 });
    }

    #[test]
    fn test_garbage_degrades_gracefully() {
        let derived = derive(b"definitely not an image", &ThumbnailConfig::default());
        assert!(derived.dimensions.is_none());
        assert!(derived.thumbnail.is_none());
        assert!(extract_dimensions(b"nope").is_none());
    }

    #[test]
    fn test_placeholder_matches_content_type() {
        assert_eq!(
            image::guess_format(&placeholder("image/jpeg")).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            image::guess_format(&placeholder("image/png")).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            image::guess_format(&placeholder("application/octet-stream")).unwrap(),
            ImageFormat::Png
        );
    }
}
