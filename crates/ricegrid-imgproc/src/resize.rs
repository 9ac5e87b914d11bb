use fast_image_resize as fr;

use ricegrid_image::{Image, ImageError};

fn pixel_type<const C: usize>() -> Result<fr::PixelType, ImageError> {
    match C {
        1 => Ok(fr::PixelType::U8),
        2 => Ok(fr::PixelType::U8x2),
        3 => Ok(fr::PixelType::U8x3),
        4 => Ok(fr::PixelType::U8x4),
        _ => Err(ImageError::ResizeError(format!("unsupported channel count {C}"))),
    }
}

/// Resize an 8-bit image by averaging the source area covered by each output pixel.
///
/// This is the resampling used to build previews. It runs a box convolution through
/// `fast_image_resize`, so every source pixel contributes to the output in proportion
/// to the area it shares with the output pixel footprint.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, its size is the target size.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] if either image has no pixels and
/// [`ImageError::ResizeError`] if the resizer rejects the buffers.
///
/// # Example
///
/// ```
/// use ricegrid_image::Image;
/// use ricegrid_imgproc::resize::resize_area;
///
/// let image = Image::<u8, 1>::new([4, 2].into(), vec![
///     0, 20, 40, 60,
///     20, 40, 60, 80,
/// ]).unwrap();
///
/// let mut resized = Image::<u8, 1>::from_size_val([2, 1].into(), 0).unwrap();
/// resize_area(&image, &mut resized).unwrap();
///
/// assert_eq!(resized.size(), [2, 1].into());
/// ```
pub fn resize_area<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
) -> Result<(), ImageError> {
    if src.size().is_empty() || dst.size().is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let pixel_type = pixel_type::<C>()?;

    let src_image = fr::images::ImageRef::new(
        src.width() as u32,
        src.height() as u32,
        src.as_slice(),
        pixel_type,
    )
    .map_err(|e| ImageError::ResizeError(e.to_string()))?;

    let (dst_width, dst_height) = (dst.width() as u32, dst.height() as u32);
    let mut dst_image =
        fr::images::Image::from_slice_u8(dst_width, dst_height, dst.as_slice_mut(), pixel_type)
            .map_err(|e| ImageError::ResizeError(e.to_string()))?;

    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Box));

    fr::Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| ImageError::ResizeError(e.to_string()))?;

    Ok(())
}
