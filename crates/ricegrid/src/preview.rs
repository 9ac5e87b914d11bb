//! Downscaled previews of source images.
//!
//! The preview is what the user clicks the reference points on. Its size, together
//! with the size of the source, defines the scale factors of a crop job.

use std::path::Path;

use log::debug;

use ricegrid_image::{Image, ImageSize};
use ricegrid_imgproc::{normalize::normalize_min_max_u8, resize::resize_area};
use ricegrid_io::{read_image_any, write_image, AnyImage, IoError};

use crate::{error::CropError, geometry::PreviewGeometry};

/// Longest side of a preview unless configured otherwise.
pub const DEFAULT_MAX_SIZE: usize = 2048;

/// Size of the preview of an `orig` sized image.
///
/// Images that fit into `max_size x max_size` keep their size, larger ones are scaled
/// down uniformly with truncated dimensions.
///
/// # Example
///
/// ```
/// use ricegrid::preview::preview_size;
///
/// let preview = preview_size([8000, 6000].into(), 2048);
/// assert_eq!((preview.width, preview.height), (2048.0, 1536.0));
/// ```
pub fn preview_size(orig: ImageSize, max_size: usize) -> PreviewGeometry {
    let longest = orig.width.max(orig.height);

    if longest > max_size {
        PreviewGeometry::new(
            (orig.width * max_size / longest).max(1) as f64,
            (orig.height * max_size / longest).max(1) as f64,
        )
    } else {
        PreviewGeometry::new(orig.width as f64, orig.height as f64)
    }
}

/// 8-bit preview pixels, alpha removed.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewImage {
    /// Grayscale preview.
    Gray(Image<u8, 1>),
    /// Color preview.
    Rgb(Image<u8, 3>),
}

impl PreviewImage {
    /// Size of the preview in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            PreviewImage::Gray(img) => img.size(),
            PreviewImage::Rgb(img) => img.size(),
        }
    }

    /// Encode the preview, the format follows the file extension.
    pub fn write(&self, file_path: impl AsRef<Path>) -> Result<(), IoError> {
        match self {
            PreviewImage::Gray(img) => write_image(file_path, img),
            PreviewImage::Rgb(img) => write_image(file_path, img),
        }
    }
}

/// A preview together with the sizes a crop request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// The preview pixels.
    pub image: PreviewImage,
    /// Width of the source image.
    pub orig_w: usize,
    /// Height of the source image.
    pub orig_h: usize,
    /// Width of the preview.
    pub preview_w: usize,
    /// Height of the preview.
    pub preview_h: usize,
}

impl Preview {
    /// Preview size in the form a [`crate::CropRequest`] expects.
    pub fn geometry(&self) -> PreviewGeometry {
        PreviewGeometry::new(self.preview_w as f64, self.preview_h as f64)
    }
}

/// Decode `file_path` and build its preview.
///
/// Sources that are not 8-bit are stretched from their observed range onto
/// `[0, 255]`, alpha is dropped and the image is shrunk with area averaging.
///
/// # Errors
///
/// Returns [`CropError::ImageLoad`] if the file cannot be decoded.
pub fn make_preview(file_path: impl AsRef<Path>, max_size: usize) -> Result<Preview, CropError> {
    let source = read_image_any(file_path.as_ref()).map_err(CropError::ImageLoad)?;
    let orig = source.size();
    if orig.is_empty() {
        return Err(CropError::Geometry(format!("source image is empty ({orig})")));
    }

    let geometry = preview_size(orig, max_size);
    let size = ImageSize {
        width: geometry.width as usize,
        height: geometry.height as usize,
    };
    debug!("preview of {} at {}", orig, size);

    let image = match source {
        AnyImage::Gray8(img) => PreviewImage::Gray(shrink(img, size)?),
        AnyImage::Gray16(img) => PreviewImage::Gray(shrink(stretch(&img.cast()?)?, size)?),
        AnyImage::Rgb8(img) => PreviewImage::Rgb(shrink(img, size)?),
        AnyImage::Rgb16(img) => PreviewImage::Rgb(shrink(stretch(&img.cast()?)?, size)?),
        AnyImage::Rgb32F(img) => PreviewImage::Rgb(shrink(stretch(&img)?, size)?),
        AnyImage::Rgba8(img) => PreviewImage::Rgb(shrink(drop_alpha(&img)?, size)?),
        AnyImage::Rgba16(img) => {
            PreviewImage::Rgb(shrink(stretch(&drop_alpha(&img.cast()?)?)?, size)?)
        }
        AnyImage::Rgba32F(img) => {
            PreviewImage::Rgb(shrink(stretch(&drop_alpha(&img)?)?, size)?)
        }
    };

    Ok(Preview {
        image,
        orig_w: orig.width,
        orig_h: orig.height,
        preview_w: size.width,
        preview_h: size.height,
    })
}

fn drop_alpha<T: Copy>(image: &Image<T, 4>) -> Result<Image<T, 3>, CropError> {
    let data = image
        .as_slice()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    Ok(Image::new(image.size(), data)?)
}

/// Stretch a non 8-bit image onto `[0, 255]`.
fn stretch<const C: usize>(image: &Image<f32, C>) -> Result<Image<u8, C>, CropError> {
    let mut stretched = Image::<u8, C>::from_size_val(image.size(), 0)?;
    normalize_min_max_u8(image, &mut stretched)?;
    Ok(stretched)
}

fn shrink<const C: usize>(image: Image<u8, C>, size: ImageSize) -> Result<Image<u8, C>, CropError> {
    if size == image.size() {
        return Ok(image);
    }

    let mut resized = Image::<u8, C>::from_size_val(size, 0)?;
    resize_area(&image, &mut resized)?;
    Ok(resized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_sizes() {
        let keep = preview_size([1000, 800].into(), 2048);
        assert_eq!(keep, PreviewGeometry::new(1000.0, 800.0));

        let exact = preview_size([2048, 100].into(), 2048);
        assert_eq!(exact, PreviewGeometry::new(2048.0, 100.0));

        // 2048 / 3000 * 1001 = 683.35
        let tall = preview_size([1001, 3000].into(), 2048);
        assert_eq!(tall, PreviewGeometry::new(683.0, 2048.0));
    }

    #[test]
    fn preview_of_u16_rgba() -> Result<(), CropError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("plate.png");

        // 8x4 rgba16 image, red ramps from 1000 to 8000
        let mut data = Vec::new();
        for _y in 0..4 {
            for x in 0..8u16 {
                data.extend_from_slice(&[1000 * (x + 1), 1000, 1000, 65535]);
            }
        }
        let buf = image::ImageBuffer::<image::Rgba<u16>, _>::from_raw(8, 4, data)
            .ok_or_else(|| CropError::Geometry("bad buffer".to_string()))?;
        buf.save(&file_path)
            .map_err(|e| CropError::Encode(IoError::ImageEncodeError(e)))?;

        let preview = make_preview(&file_path, 4)?;
        assert_eq!((preview.orig_w, preview.orig_h), (8, 4));
        assert_eq!((preview.preview_w, preview.preview_h), (4, 2));
        assert_eq!(preview.geometry(), PreviewGeometry::new(4.0, 2.0));

        match &preview.image {
            PreviewImage::Rgb(img) => {
                assert_eq!(img.size(), [4, 2].into());
                // alpha is dropped before the stretch, the flat channels sit at the bottom
                assert_eq!(img.get_pixel(0, 0)?[1], 0);
                assert!(img.get_pixel(3, 0)?[0] > img.get_pixel(0, 0)?[0]);
            }
            PreviewImage::Gray(_) => panic!("expected a color preview"),
        }

        let out = tmp_dir.path().join("preview.png");
        preview.image.write(&out).map_err(CropError::Encode)?;
        assert!(out.exists());
        Ok(())
    }
}
