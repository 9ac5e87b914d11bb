use std::path::Path;

use ricegrid_image::Image;

use crate::{error::IoError, functional::write_u8_impl};

/// Writes the given 8-bit image as PNG to the given file path.
///
/// One channel is written as grayscale, two as grayscale with alpha, three as RGB
/// and four as RGBA.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image, it must end in `.png`.
/// - `image` - The image data to encode.
pub fn write_image_png<const C: usize>(
    file_path: impl AsRef<Path>,
    image: &Image<u8, C>,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    // verify the file extension
    if !file_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
    {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    write_u8_impl(file_path, image, image::ImageFormat::Png)
}
