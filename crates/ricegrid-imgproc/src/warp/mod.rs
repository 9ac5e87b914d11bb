//! Geometric image transformations using affine warps.
//!
//! This module provides functions for applying 2D affine transformations to images:
//!
//! - Affine transform estimation from three point correspondences
//! - Affine transform inversion
//! - Image warping through an affine transform
//!
//! # Examples
//!
//! Mapping a triangle onto the axis-aligned unit corner:
//!
//! ```
//! use ricegrid_imgproc::warp::{get_affine_transform, transform_point};
//!
//! let src = [[10.0, 10.0], [20.0, 10.0], [10.0, 30.0]];
//! let dst = [[0.0, 0.0], [10.0, 0.0], [0.0, 20.0]];
//! let m = get_affine_transform(&src, &dst).unwrap();
//!
//! assert_eq!(transform_point(20.0, 30.0, &m), (10.0, 20.0));
//! ```

mod affine;

pub use affine::{get_affine_transform, invert_affine_transform, transform_point, warp_affine};
