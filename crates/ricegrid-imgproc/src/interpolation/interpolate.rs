use super::bilinear::bilinear_interpolation;
use super::lanczos::lanczos_interpolation;
use ricegrid_image::Image;

/// Interpolation mode for the warp operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation, kept as a cheaper baseline for benchmarks
    Bilinear,
    /// Lanczos interpolation with a window of 4 pixels on each side
    #[default]
    Lanczos4,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated pixel values, one per channel.
///
/// The coordinates must lie inside the image, neighbours that fall outside are
/// clamped to the border.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> [f32; C] {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Lanczos4 => lanczos_interpolation(image, u, v),
    }
}
