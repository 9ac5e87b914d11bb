use ricegrid_image::{Image, ImageError};

use crate::interpolation::{interpolate_pixel, InterpolationMode};
use crate::parallel;

/// Determinants below this magnitude are treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Inverts a 2x3 affine transformation matrix.
///
/// Arguments:
///
/// * `m` - The 2x3 affine transformation matrix in row-major order.
///
/// Returns:
///
/// The inverted 2x3 affine transformation matrix. A singular matrix inverts to zeros.
pub fn invert_affine_transform(m: &[f64; 6]) -> [f64; 6] {
    let (a, b, c, d, e, f) = (m[0], m[1], m[2], m[3], m[4], m[5]);

    // follow OpenCV: check for determinant == 0
    // https://github.com/opencv/opencv/blob/4.9.0/modules/imgproc/src/imgwarp.cpp#L2765
    let determinant = a * e - b * d;
    let inv_determinant = if determinant != 0.0 {
        1.0 / determinant
    } else {
        0.0
    };

    let new_a = e * inv_determinant;
    let new_b = -b * inv_determinant;
    let new_d = -d * inv_determinant;
    let new_e = a * inv_determinant;
    let new_c = -(new_a * c + new_b * f);
    let new_f = -(new_d * c + new_e * f);

    [new_a, new_b, new_c, new_d, new_e, new_f]
}

/// Applies an affine transformation to a point.
pub fn transform_point(x: f64, y: f64, m: &[f64; 6]) -> (f64, f64) {
    let u = m[0] * x + m[1] * y + m[2];
    let v = m[3] * x + m[4] * y + m[5];
    (u, v)
}

/// Solve the 3x3 system `[x_i, y_i, 1] . [p, q, r] = rhs_i` with Cramer's rule.
fn solve_row(src: &[[f64; 2]; 3], rhs: [f64; 3]) -> Option<[f64; 3]> {
    let [[x0, y0], [x1, y1], [x2, y2]] = *src;

    let det = x0 * (y1 - y2) - y0 * (x1 - x2) + (x1 * y2 - x2 * y1);
    if det.abs() < SINGULAR_EPS {
        return None;
    }

    let [r0, r1, r2] = rhs;
    let p = r0 * (y1 - y2) - y0 * (r1 - r2) + (r1 * y2 - r2 * y1);
    let q = x0 * (r1 - r2) - r0 * (x1 - x2) + (x1 * r2 - x2 * r1);
    let r = x0 * (y1 * r2 - y2 * r1) - y0 * (x1 * r2 - x2 * r1) + r0 * (x1 * y2 - x2 * y1);

    Some([p / det, q / det, r / det])
}

/// Computes the affine transform that maps three source points onto three destination points.
///
/// The six parameters cover rotation, non-uniform scale, shear and translation.
///
/// # Arguments
///
/// * `src` - Three points `[x, y]` in the source image.
/// * `dst` - The three points they must land on.
///
/// # Returns
///
/// The 2x3 matrix in row-major order, or `None` when the source points are collinear.
///
/// # Example
///
/// ```
/// use ricegrid_imgproc::warp::get_affine_transform;
///
/// let collinear = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
/// let dst = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
///
/// assert!(get_affine_transform(&collinear, &dst).is_none());
/// ```
pub fn get_affine_transform(src: &[[f64; 2]; 3], dst: &[[f64; 2]; 3]) -> Option<[f64; 6]> {
    let [a, b, c] = solve_row(src, [dst[0][0], dst[1][0], dst[2][0]])?;
    let [d, e, f] = solve_row(src, [dst[0][1], dst[1][1], dst[2][1]])?;
    Some([a, b, c, d, e, f])
}

/// Applies an affine transformation to an image.
///
/// Every destination pixel is mapped back through the inverse transform and sampled
/// from `src`. Pixels whose source position falls outside `src` are set to zero.
///
/// # Arguments
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (height, width, channels).
/// * `m` - The 2x3 affine transformation matrix mapping `src` onto `dst`.
/// * `interpolation` - The interpolation mode to use.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] when `src` has no pixels.
///
/// # Example
///
/// ```
/// use ricegrid_image::{Image, ImageSize};
/// use ricegrid_imgproc::interpolation::InterpolationMode;
/// use ricegrid_imgproc::warp::warp_affine;
///
/// let src = Image::<_, 3>::from_size_val(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     1f32,
/// ).unwrap();
///
/// let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let new_size = ImageSize {
///     width: 4,
///     height: 5,
/// };
///
/// let mut dst = Image::<_, 3>::from_size_val(new_size, 0.0).unwrap();
///
/// warp_affine(&src, &mut dst, &m, InterpolationMode::Lanczos4).unwrap();
///
/// assert_eq!(dst.as_slice(), src.as_slice());
/// ```
pub fn warp_affine<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    m: &[f64; 6],
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if src.size().is_empty() {
        return Err(ImageError::EmptyImage);
    }

    // invert affine transform matrix to find corresponding positions in src from dst
    let m_inv = invert_affine_transform(m);
    let (src_cols, src_rows) = (src.cols() as f64, src.rows() as f64);

    parallel::par_iter_rows_indexed(dst, |x, y, dst_pixel| {
        let (u, v) = transform_point(x as f64, y as f64, &m_inv);
        if u >= 0.0 && u < src_cols && v >= 0.0 && v < src_rows {
            let pixel = interpolate_pixel(src, u as f32, v as f32, interpolation);
            dst_pixel.copy_from_slice(&pixel);
        } else {
            dst_pixel.fill(0.0);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ricegrid_image::{Image, ImageError, ImageSize};

    use super::InterpolationMode;

    #[test]
    fn affine_transform_from_points() {
        let src = [[3.0, 4.0], [13.0, 4.0], [3.0, 24.0]];
        let dst = [[0.0, 0.0], [5.0, 0.0], [0.0, 40.0]];

        let m = super::get_affine_transform(&src, &dst).unwrap();

        for (s, d) in src.iter().zip(dst.iter()) {
            let (u, v) = super::transform_point(s[0], s[1], &m);
            assert_relative_eq!(u, d[0], epsilon = 1e-9);
            assert_relative_eq!(v, d[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn affine_transform_rotated_frame() {
        // a frame rotated by 90 degrees: x axis along +y, y axis along -x
        let src = [[10.0, 10.0], [10.0, 20.0], [5.0, 10.0]];
        let dst = [[0.0, 0.0], [10.0, 0.0], [0.0, 5.0]];

        let m = super::get_affine_transform(&src, &dst).unwrap();
        assert_relative_eq!(m[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(m[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(m[3], -1.0, epsilon = 1e-12);
        assert_relative_eq!(m[4], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn affine_transform_degenerate() {
        let src = [[1.0, 1.0], [1.0, 1.0], [4.0, 2.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert!(super::get_affine_transform(&src, &dst).is_none());
    }

    #[test]
    fn invert_roundtrip() {
        let m = [0.8, -0.6, 12.0, 0.6, 0.8, -3.0];
        let m_inv = super::invert_affine_transform(&m);
        let (u, v) = super::transform_point(7.0, 9.0, &m);
        let (x, y) = super::transform_point(u, v, &m_inv);
        assert_relative_eq!(x, 7.0, epsilon = 1e-9);
        assert_relative_eq!(y, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn warp_affine_smoke_ch3() -> Result<(), ImageError> {
        let image = Image::<_, 3>::new(
            ImageSize {
                width: 4,
                height: 5,
            },
            vec![0f32; 4 * 5 * 3],
        )?;

        let new_size = ImageSize {
            width: 2,
            height: 3,
        };

        let mut image_transformed = Image::<_, 3>::from_size_val(new_size, 0.0)?;

        super::warp_affine(
            &image,
            &mut image_transformed,
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            InterpolationMode::Lanczos4,
        )?;

        assert_eq!(image_transformed.num_channels(), 3);
        assert_eq!(image_transformed.size().width, 2);
        assert_eq!(image_transformed.size().height, 3);

        Ok(())
    }

    #[test]
    fn warp_affine_correctness_translation() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 4,
                height: 5,
            },
            (0..20).map(|x| x as f32).collect(),
        )?;

        let mut image_transformed = Image::<_, 1>::from_size_val([2, 2].into(), -1.0)?;

        // crop the 2x2 block starting at (1, 2) by shifting it to the origin
        super::warp_affine(
            &image,
            &mut image_transformed,
            &[1.0, 0.0, -1.0, 0.0, 1.0, -2.0],
            InterpolationMode::Lanczos4,
        )?;

        assert_eq!(image_transformed.as_slice(), &[9.0, 10.0, 13.0, 14.0]);

        Ok(())
    }

    #[test]
    fn warp_affine_outside_is_zero() -> Result<(), ImageError> {
        let image = Image::<_, 1>::from_size_val([2, 2].into(), 5.0f32)?;
        let mut image_transformed = Image::<_, 1>::from_size_val([4, 1].into(), -1.0)?;

        super::warp_affine(
            &image,
            &mut image_transformed,
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            InterpolationMode::Bilinear,
        )?;

        assert_eq!(image_transformed.as_slice(), &[5.0, 5.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn warp_affine_correctness_rot90() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0f32, 1.0f32, 2.0f32, 3.0f32],
        )?;

        let mut image_transformed = Image::<_, 1>::from_size_val(image.size(), 0.0)?;

        // dst (x, y) samples src (1 - y, x)
        let m = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0];

        super::warp_affine(&image, &mut image_transformed, &m, InterpolationMode::Lanczos4)?;

        assert_eq!(image_transformed.as_slice(), &[1.0f32, 3.0, 0.0, 2.0]);

        Ok(())
    }

    #[test]
    fn warp_affine_empty_source() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([0, 0].into(), vec![])?;
        let mut dst = Image::<f32, 1>::from_size_val([1, 1].into(), 0.0)?;
        let res = super::warp_affine(
            &image,
            &mut dst,
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            InterpolationMode::Lanczos4,
        );
        assert_eq!(res, Err(ImageError::EmptyImage));
        Ok(())
    }
}
