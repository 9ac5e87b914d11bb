//! Three point affine rectification.
//!
//! The user clicks an origin `p1`, the end of the horizontal edge `p2` and any point
//! `p3` on the opposite edge. The local frame spanned by `p1 -> p2` and its
//! perpendicular is mapped onto the axes of a new image whose width is the edge length
//! and whose height is the perpendicular distance of `p3` from that edge.

use log::debug;

use ricegrid_image::{Image, ImageSize, PixelFormat};
use ricegrid_imgproc::{
    interpolation::InterpolationMode,
    warp::{get_affine_transform, warp_affine},
};

use crate::{
    error::CropError,
    geometry::{Point2, PreviewGeometry},
};

/// Lengths below this are treated as zero.
const MIN_EXTENT: f64 = 1e-6;

/// Ratio between the source image and the preview the points were picked on.
///
/// # Errors
///
/// Returns [`CropError::Config`] for an invalid preview and [`CropError::Geometry`]
/// for an empty source image.
///
/// # Example
///
/// ```
/// use ricegrid::{rectify::scale_factors, PreviewGeometry};
///
/// let preview = PreviewGeometry::new(2000.0, 1000.0);
/// let (sx, sy) = scale_factors([4000, 3000].into(), preview).unwrap();
/// assert_eq!((sx, sy), (2.0, 3.0));
/// ```
pub fn scale_factors(orig: ImageSize, preview: PreviewGeometry) -> Result<(f64, f64), CropError> {
    preview.validate()?;
    if orig.is_empty() {
        return Err(CropError::Geometry(format!("source image is empty ({orig})")));
    }
    Ok((
        orig.width as f64 / preview.width,
        orig.height as f64 / preview.height,
    ))
}

/// The affine transform and output size of a rectification.
///
/// A plan only needs the size of the source image, so it can be computed and
/// validated before the pixels are touched.
#[derive(Debug, Clone, PartialEq)]
pub struct RectifyPlan {
    matrix: [f64; 6],
    size: ImageSize,
    scale: (f64, f64),
    dist_x: f64,
    dist_y: f64,
    unit_x: Point2,
    unit_y: Point2,
}

impl RectifyPlan {
    /// Compute the rectification for three reference points in preview space.
    ///
    /// # Arguments
    ///
    /// * `orig_size` - Size of the full resolution source image.
    /// * `points` - Origin, end of the horizontal edge and a point on the opposite edge.
    /// * `preview` - Size of the preview the points were picked on.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::Geometry`] when `p1` and `p2` coincide, when `p3` lies on
    /// the line through them or when the rectified area is smaller than a pixel.
    pub fn new(
        orig_size: ImageSize,
        points: &[Point2; 3],
        preview: PreviewGeometry,
    ) -> Result<Self, CropError> {
        let scale = scale_factors(orig_size, preview)?;

        if points.iter().any(|p| !p.is_finite()) {
            return Err(CropError::Geometry(
                "reference points must be finite".to_string(),
            ));
        }

        let [p1, p2, p3] = points.map(|p| p.scale(scale.0, scale.1));

        let v12 = p2 - p1;
        let dist_x = v12.norm();
        if dist_x < MIN_EXTENT {
            return Err(CropError::Geometry(
                "the first two reference points coincide".to_string(),
            ));
        }

        let unit_x = v12 / dist_x;
        let unit_y = unit_x.perp();

        // the third point may lie on either side of the edge
        let dist_y = (p3 - p1).dot(&unit_y).abs();
        if dist_y < MIN_EXTENT {
            return Err(CropError::Geometry(
                "the third reference point lies on the line through the first two".to_string(),
            ));
        }

        let size = ImageSize {
            width: dist_x.round() as usize,
            height: dist_y.round() as usize,
        };
        if size.is_empty() {
            return Err(CropError::Geometry(format!(
                "rectified area {dist_x:.3}x{dist_y:.3} is smaller than one pixel"
            )));
        }

        let src: [[f64; 2]; 3] = [p1.into(), p2.into(), (p1 + unit_y * dist_y).into()];
        let dst = [[0.0, 0.0], [dist_x, 0.0], [0.0, dist_y]];
        let matrix = get_affine_transform(&src, &dst).ok_or_else(|| {
            CropError::Geometry("reference points do not span a plane".to_string())
        })?;

        debug!(
            "rectify: scale=({:.4}, {:.4}) dist=({:.2}, {:.2}) size={} unit_x=({:.4}, {:.4})",
            scale.0, scale.1, dist_x, dist_y, size, unit_x.x, unit_x.y
        );

        Ok(Self {
            matrix,
            size,
            scale,
            dist_x,
            dist_y,
            unit_x,
            unit_y,
        })
    }

    /// The 2x3 matrix mapping source pixels onto rectified pixels.
    pub fn matrix(&self) -> &[f64; 6] {
        &self.matrix
    }

    /// Size of the rectified image, `(round(dist_x), round(dist_y))`.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// `(scale_x, scale_y)` from preview to source pixels.
    pub fn scale(&self) -> (f64, f64) {
        self.scale
    }

    /// Length of the horizontal edge in source pixels.
    pub fn dist_x(&self) -> f64 {
        self.dist_x
    }

    /// Perpendicular extent in source pixels.
    pub fn dist_y(&self) -> f64 {
        self.dist_y
    }

    /// Unit vector along the horizontal edge.
    pub fn unit_x(&self) -> Point2 {
        self.unit_x
    }

    /// Unit vector perpendicular to the horizontal edge.
    pub fn unit_y(&self) -> Point2 {
        self.unit_y
    }

    /// Resample `image` into the rectified frame with Lanczos-4 interpolation.
    ///
    /// Samples are rounded and clamped to the range of `format`, so the result holds
    /// the values a warp performed on the source sample type would produce. Areas that
    /// map outside the source are zero.
    pub fn warp<const C: usize>(
        &self,
        image: &Image<f32, C>,
        format: PixelFormat,
    ) -> Result<RectifiedImage<C>, CropError> {
        let mut rectified = Image::from_size_val(self.size, 0.0f32)?;
        warp_affine(image, &mut rectified, &self.matrix, InterpolationMode::Lanczos4)?;

        if format != PixelFormat::F32 {
            rectified
                .as_slice_mut()
                .iter_mut()
                .for_each(|v| *v = format.saturate(*v));
        }

        Ok(RectifiedImage {
            image: rectified,
            format,
        })
    }
}

/// An axis aligned image produced by [`RectifyPlan::warp`].
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedImage<const C: usize> {
    /// The resampled pixels.
    pub image: Image<f32, C>,
    /// Sample type of the source the pixels were resampled from.
    pub format: PixelFormat,
}

impl<const C: usize> RectifiedImage<C> {
    /// Size of the rectified image in pixels.
    pub fn size(&self) -> ImageSize {
        self.image.size()
    }
}

/// Plan and apply a rectification in one step.
///
/// Returns the rectified image together with `(scale_x, scale_y)`.
pub fn rectify<const C: usize>(
    image: &Image<f32, C>,
    format: PixelFormat,
    points: &[Point2; 3],
    preview: PreviewGeometry,
) -> Result<(RectifiedImage<C>, (f64, f64)), CropError> {
    let plan = RectifyPlan::new(image.size(), points, preview)?;
    let rectified = plan.warp(image, format)?;
    Ok((rectified, plan.scale()))
}
