use std::path::Path;

use image::DynamicImage;
use ricegrid_image::{Image, ImageSize, PixelFormat};

use crate::error::IoError;

/// A decoded image in whichever sample type and channel layout the source used.
///
/// Gray-alpha sources are widened to RGBA since the pipeline only handles 1, 3 or 4
/// channels.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyImage {
    /// 8-bit grayscale image
    Gray8(Image<u8, 1>),
    /// 8-bit RGB image
    Rgb8(Image<u8, 3>),
    /// 8-bit RGB image with alpha channel
    Rgba8(Image<u8, 4>),
    /// 16-bit grayscale image
    Gray16(Image<u16, 1>),
    /// 16-bit RGB image
    Rgb16(Image<u16, 3>),
    /// 16-bit RGB image with alpha channel
    Rgba16(Image<u16, 4>),
    /// 32-bit float RGB image
    Rgb32F(Image<f32, 3>),
    /// 32-bit float RGB image with alpha channel
    Rgba32F(Image<f32, 4>),
}

impl AnyImage {
    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            AnyImage::Gray8(img) => img.size(),
            AnyImage::Rgb8(img) => img.size(),
            AnyImage::Rgba8(img) => img.size(),
            AnyImage::Gray16(img) => img.size(),
            AnyImage::Rgb16(img) => img.size(),
            AnyImage::Rgba16(img) => img.size(),
            AnyImage::Rgb32F(img) => img.size(),
            AnyImage::Rgba32F(img) => img.size(),
        }
    }

    /// Get the sample type of the image.
    pub fn pixel_format(&self) -> PixelFormat {
        match self {
            AnyImage::Gray8(_) | AnyImage::Rgb8(_) | AnyImage::Rgba8(_) => PixelFormat::U8,
            AnyImage::Gray16(_) | AnyImage::Rgb16(_) | AnyImage::Rgba16(_) => PixelFormat::U16,
            AnyImage::Rgb32F(_) | AnyImage::Rgba32F(_) => PixelFormat::F32,
        }
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        match self {
            AnyImage::Gray8(_) | AnyImage::Gray16(_) => 1,
            AnyImage::Rgb8(_) | AnyImage::Rgb16(_) | AnyImage::Rgb32F(_) => 3,
            AnyImage::Rgba8(_) | AnyImage::Rgba16(_) | AnyImage::Rgba32F(_) => 4,
        }
    }
}

impl TryFrom<DynamicImage> for AnyImage {
    type Error = IoError;

    fn try_from(img: DynamicImage) -> Result<Self, Self::Error> {
        let size = ImageSize {
            width: img.width() as usize,
            height: img.height() as usize,
        };

        let image = match img {
            DynamicImage::ImageLuma8(buf) => AnyImage::Gray8(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageRgb8(buf) => AnyImage::Rgb8(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageRgba8(buf) => AnyImage::Rgba8(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageLumaA8(_) => {
                AnyImage::Rgba8(Image::new(size, img.into_rgba8().into_raw())?)
            }
            DynamicImage::ImageLuma16(buf) => AnyImage::Gray16(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageRgb16(buf) => AnyImage::Rgb16(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageRgba16(buf) => AnyImage::Rgba16(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageLumaA16(_) => {
                AnyImage::Rgba16(Image::new(size, img.into_rgba16().into_raw())?)
            }
            DynamicImage::ImageRgb32F(buf) => AnyImage::Rgb32F(Image::new(size, buf.into_raw())?),
            DynamicImage::ImageRgba32F(buf) => {
                AnyImage::Rgba32F(Image::new(size, buf.into_raw())?)
            }
            other => AnyImage::Rgba32F(Image::new(size, other.into_rgba32f().into_raw())?),
        };

        Ok(image)
    }
}

/// Reads an image from the given file path.
///
/// The method tries to read from any image format supported by the image crate and
/// keeps the sample type of the source (8-bit, 16-bit or float). Decoder memory
/// limits are lifted since scanned plates easily exceed the defaults.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Errors
///
/// Returns [`IoError::FileDoesNotExist`] for a missing file and
/// [`IoError::ImageDecodeError`] when the content cannot be decoded.
pub fn read_image_any(file_path: impl AsRef<Path>) -> Result<AnyImage, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let mut reader = image::ImageReader::open(file_path)?.with_guessed_format()?;
    reader.no_limits();

    AnyImage::try_from(reader.decode()?)
}

/// Writes an 8-bit image, choosing the encoder from the file extension.
///
/// `png` selects the PNG encoder, `tif` and `tiff` the TIFF encoder. Both are lossless
/// and consume samples in RGB(A) order.
///
/// # Errors
///
/// Returns [`IoError::InvalidFileExtension`] for any other extension.
pub fn write_image<const C: usize>(
    file_path: impl AsRef<Path>,
    image: &Image<u8, C>,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => crate::png::write_image_png(file_path, image),
        Some("tif") | Some("tiff") => crate::tiff::write_image_tiff(file_path, image),
        _ => Err(IoError::InvalidFileExtension(file_path.to_path_buf())),
    }
}

/// Encode an 8-bit image with the given format.
pub(crate) fn write_u8_impl<const C: usize>(
    file_path: &Path,
    image: &Image<u8, C>,
    format: image::ImageFormat,
) -> Result<(), IoError> {
    let color_type = match C {
        1 => image::ColorType::L8,
        2 => image::ColorType::La8,
        3 => image::ColorType::Rgb8,
        4 => image::ColorType::Rgba8,
        _ => return Err(IoError::UnsupportedChannels(C)),
    };

    image::save_buffer_with_format(
        file_path,
        image.as_slice(),
        image.width() as u32,
        image.height() as u32,
        color_type,
        format,
    )
    .map_err(IoError::ImageEncodeError)
}

#[cfg(test)]
mod tests {
    use super::{read_image_any, write_image, AnyImage};
    use crate::error::IoError;
    use ricegrid_image::{Image, PixelFormat};

    #[test]
    fn read_missing_file() {
        let res = read_image_any("/definitely/not/here.tif");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn read_corrupt_file() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("broken.png");
        std::fs::write(&file_path, b"this is not an image")?;

        let res = read_image_any(&file_path);
        assert!(matches!(res, Err(IoError::ImageDecodeError(_))));
        Ok(())
    }

    #[test]
    fn write_read_png_rgb8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("patch.png");

        let data = (0..4 * 3 * 3).map(|x| x as u8).collect::<Vec<_>>();
        let image = Image::<u8, 3>::new([4, 3].into(), data)?;
        write_image(&file_path, &image)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back.pixel_format(), PixelFormat::U8);
        assert_eq!(back, AnyImage::Rgb8(image));
        Ok(())
    }

    #[test]
    fn write_read_tiff_gray8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("patch.TIF");

        let image = Image::<u8, 1>::new([2, 2].into(), vec![1, 2, 3, 4])?;
        write_image(&file_path, &image)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back.num_channels(), 1);
        assert_eq!(back.size(), image.size());
        Ok(())
    }

    #[test]
    fn read_png_gray16() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray16.png");

        let buf = image::ImageBuffer::<image::Luma<u16>, _>::from_raw(2, 1, vec![100u16, 60000])
            .ok_or(IoError::UnsupportedChannels(1))?;
        buf.save(&file_path)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back.pixel_format(), PixelFormat::U16);
        match back {
            AnyImage::Gray16(img) => assert_eq!(img.as_slice(), &[100, 60000]),
            other => panic!("unexpected image type: {:?}", other.pixel_format()),
        }
        Ok(())
    }

    #[test]
    fn write_unknown_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let image = Image::<u8, 1>::new([1, 1].into(), vec![0])?;
        let res = write_image(tmp_dir.path().join("patch.bmp"), &image);
        assert!(matches!(res, Err(IoError::InvalidFileExtension(_))));
        Ok(())
    }
}
