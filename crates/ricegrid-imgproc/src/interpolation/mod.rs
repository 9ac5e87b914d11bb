//! Pixel interpolation methods for image transformations.
//!
//! This module provides the interpolation kernels used when resampling images during
//! geometric transformations like warping.
//!
//! # Interpolation Modes
//!
//! - **Bilinear**: Linear interpolation between adjacent pixels, the cheap baseline the
//!   warp benchmark compares against
//! - **Lanczos4**: Windowed sinc over an 8x8 neighbourhood, used to rectify scans
//!   without aliasing when the warp up- or down-scales

mod bilinear;
pub(crate) mod interpolate;
mod lanczos;

pub use interpolate::{interpolate_pixel, InterpolationMode};
