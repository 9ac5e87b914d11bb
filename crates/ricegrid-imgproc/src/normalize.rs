//! Intensity normalization into the 8-bit output range.
//!
//! Scanned plates often come as 16-bit or floating point rasters. Before a tile can be
//! encoded as an 8-bit image its intensities are either cast (sources that already
//! hold 8-bit values) or stretched from the observed `[min, max]` onto `[0, 255]`.

use ricegrid_image::{Image, ImageError};

use crate::parallel;

/// Find the minimum and maximum values in an image.
///
/// All channels are pooled together.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] if the image has no samples.
///
/// # Example
///
/// ```
/// use ricegrid_image::{Image, ImageSize};
/// use ricegrid_imgproc::normalize::find_min_max;
///
/// let image_data = vec![0u8, 1, 0, 1, 2, 3, 0, 1, 0, 1, 2, 3];
/// let image = Image::<u8, 3>::new(
///     ImageSize {
///         width: 2,
///         height: 2,
///     },
///     image_data,
/// )
/// .unwrap();
///
/// let (min, max) = find_min_max(&image).unwrap();
/// assert_eq!(min, 0);
/// assert_eq!(max, 3);
/// ```
pub fn find_min_max<T, const C: usize>(image: &Image<T, C>) -> Result<(T, T), ImageError>
where
    T: Copy + PartialOrd,
{
    let mut iter = image.as_slice().iter();

    let first_element = match iter.next() {
        Some(x) => *x,
        None => return Err(ImageError::EmptyImage),
    };

    let (min, max) = iter.fold((first_element, first_element), |(min, max), &x| {
        (if x < min { x } else { min }, if x > max { x } else { max })
    });

    Ok((min, max))
}

/// Convert an image to 8 bits by saturating each sample.
///
/// Values are truncated towards zero and clamped to `[0, 255]`.
///
/// # Errors
///
/// Returns [`ImageError::InvalidImageSize`] if the images differ in size.
pub fn cast_u8<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<u8, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        src_pixel
            .iter()
            .zip(dst_pixel.iter_mut())
            .for_each(|(&src_val, dst_val)| *dst_val = src_val as u8);
    });

    Ok(())
}

/// Stretch the intensities of an image onto `[0, 255]` and store them as 8 bits.
///
/// The observed range `[min, max]` is mapped linearly onto `[0, 255]` and truncated.
/// A flat image (`max == min`) has no range to stretch and is cast with [`cast_u8`].
///
/// # Errors
///
/// Returns an error if the images differ in size or are empty.
///
/// # Example
///
/// ```
/// use ricegrid_image::Image;
/// use ricegrid_imgproc::normalize::normalize_min_max_u8;
///
/// let image = Image::<f32, 1>::new([3, 1].into(), vec![1000.0, 1500.0, 2000.0]).unwrap();
/// let mut image_u8 = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// normalize_min_max_u8(&image, &mut image_u8).unwrap();
///
/// assert_eq!(image_u8.as_slice(), &[0, 127, 255]);
/// ```
pub fn normalize_min_max_u8<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<u8, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (min_val, max_val) = find_min_max(src)?;

    if max_val <= min_val {
        return cast_u8(src, dst);
    }

    let range = max_val - min_val;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        src_pixel
            .iter()
            .zip(dst_pixel.iter_mut())
            .for_each(|(&src_val, dst_val)| {
                *dst_val = ((src_val - min_val) * 255.0 / range) as u8;
            });
    });

    Ok(())
}
