use std::f32::consts::PI;

use ricegrid_image::Image;

/// Half width of the Lanczos window in pixels.
const LANCZOS_A: usize = 4;

/// Number of taps per axis.
const TAPS: usize = 2 * LANCZOS_A;

/// Evaluate `sinc(x) * sinc(x / a)` for the Lanczos window.
fn lanczos_kernel(x: f32) -> f32 {
    let a = LANCZOS_A as f32;
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }
    let px = PI * x;
    a * px.sin() * (px / a).sin() / (px * px)
}

/// Normalized weights for the taps at `floor(x) - 3 ..= floor(x) + 4`.
///
/// An exact grid position gets a single unit weight so that sampling on the grid
/// reproduces the source values.
fn lanczos_weights(frac: f32) -> [f32; TAPS] {
    let mut weights = [0.0; TAPS];

    if frac == 0.0 {
        weights[LANCZOS_A - 1] = 1.0;
        return weights;
    }

    let mut sum = 0.0;
    for (i, w) in weights.iter_mut().enumerate() {
        let offset = i as f32 - (LANCZOS_A as f32 - 1.0);
        *w = lanczos_kernel(frac - offset);
        sum += *w;
    }

    weights.iter_mut().for_each(|w| *w /= sum);

    weights
}

/// Kernel for Lanczos interpolation over an 8x8 neighbourhood.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values. Taps outside the image repeat the border pixel.
pub(crate) fn lanczos_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows() as isize, image.cols() as isize);

    let (u0, v0) = (u.floor(), v.floor());
    let weights_x = lanczos_weights(u - u0);
    let weights_y = lanczos_weights(v - v0);

    let first_x = u0 as isize - (LANCZOS_A as isize - 1);
    let first_y = v0 as isize - (LANCZOS_A as isize - 1);

    let data = image.as_slice();

    let mut pixel = [0.0; C];
    for (j, &wy) in weights_y.iter().enumerate() {
        if wy == 0.0 {
            continue;
        }
        let y = (first_y + j as isize).clamp(0, rows - 1) as usize;

        let mut row = [0.0; C];
        for (i, &wx) in weights_x.iter().enumerate() {
            if wx == 0.0 {
                continue;
            }
            let x = (first_x + i as isize).clamp(0, cols - 1) as usize;
            let base = (y * cols as usize + x) * C;
            for k in 0..C {
                row[k] += wx * data[base + k];
            }
        }

        for k in 0..C {
            pixel[k] += wy * row[k];
        }
    }

    pixel
}
