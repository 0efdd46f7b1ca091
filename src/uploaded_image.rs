use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::metadata_extractor::{ContainerExif, ExifSource, RawExif};

#[derive(Debug, thiserror::Error)]
pub enum ImageUploadError {
    #[error("Unsupported image format, expected JPEG or PNG")]
    UnsupportedFormat,
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A photograph as uploaded: the original bytes (which carry the EXIF block)
/// plus the decoded pixels.
pub struct UploadedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    image: DynamicImage,
}

impl UploadedImage {
    pub fn decode(bytes: Vec<u8>) -> Result<Self, ImageUploadError> {
        let format =
            image::guess_format(&bytes).map_err(|_| ImageUploadError::UnsupportedFormat)?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(ImageUploadError::UnsupportedFormat);
        }

        let image = image::load_from_memory_with_format(&bytes, format)?;
        Ok(Self {
            bytes,
            format,
            image,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Re-encodes as JPEG. The stored file carries no EXIF block.
    pub fn save_as_jpeg(&self, path: &Path) -> Result<(), ImageUploadError> {
        self.image
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg)?;
        Ok(())
    }
}

impl ExifSource for UploadedImage {
    fn raw_exif(&self) -> Option<RawExif> {
        ContainerExif::from_bytes(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    use crate::metadata_extractor::{CaptureRecord, MetadataExtractor};

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_jpeg_without_metadata() {
        let bytes = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))),
            ImageFormat::Jpeg,
        );
        let upload = UploadedImage::decode(bytes).unwrap();

        assert_eq!(upload.format(), ImageFormat::Jpeg);
        assert_eq!(upload.dimensions(), (8, 6));
        assert_eq!(MetadataExtractor::extract(&upload), CaptureRecord::default());
    }

    #[test]
    fn test_png_with_alpha_is_saved_as_jpeg() {
        let bytes = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128]))),
            ImageFormat::Png,
        );
        let upload = UploadedImage::decode(bytes).unwrap();
        assert_eq!(upload.format(), ImageFormat::Png);

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        upload.save_as_jpeg(&path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(matches!(
            UploadedImage::decode(b"plain text".to_vec()),
            Err(ImageUploadError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_rejects_truncated_jpeg() {
        let mut bytes = encode(
            DynamicImage::ImageRgb8(RgbImage::new(16, 16)),
            ImageFormat::Jpeg,
        );
        bytes.truncate(20);
        assert!(matches!(
            UploadedImage::decode(bytes),
            Err(ImageUploadError::Image(_))
        ));
    }
}
