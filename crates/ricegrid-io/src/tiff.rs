use std::path::Path;

use ricegrid_image::Image;

use crate::{error::IoError, functional::write_u8_impl};

/// Writes the given 8-bit image as TIFF to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the TIFF image, it must end in `.tif` or `.tiff`.
/// - `image` - The image data to encode.
pub fn write_image_tiff<const C: usize>(
    file_path: impl AsRef<Path>,
    image: &Image<u8, C>,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    if !file_path.extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("tiff") || ext.eq_ignore_ascii_case("tif")
    }) {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    write_u8_impl(file_path, image, image::ImageFormat::Tiff)
}
