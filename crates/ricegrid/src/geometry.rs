use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// A point with `f64` coordinates.
///
/// Reference points arrive in preview pixel space and are scaled into source pixel
/// space before any geometry is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate in pixels.
    pub x: f64,
    /// Vertical coordinate in pixels.
    pub y: f64,
}

impl Point2 {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale both coordinates independently.
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length of the vector.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// The vector rotated by 90 degrees, `(-y, x)`.
    pub fn perp(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point2 {
    type Output = Point2;

    fn mul(self, rhs: f64) -> Point2 {
        Point2::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Div<f64> for Point2 {
    type Output = Point2;

    fn div(self, rhs: f64) -> Point2 {
        Point2::new(self.x / rhs, self.y / rhs)
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Point2::new(p[0], p[1])
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

/// Size of the preview the reference points were picked on.
///
/// Serialized as `{"w": .., "h": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewGeometry {
    /// Preview width in pixels.
    #[serde(rename = "w")]
    pub width: f64,
    /// Preview height in pixels.
    #[serde(rename = "h")]
    pub height: f64,
}

impl PreviewGeometry {
    /// Create a new preview geometry.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check that both dimensions are positive and finite.
    pub fn validate(&self) -> Result<(), CropError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.width) || !valid(self.height) {
            return Err(CropError::Config(format!(
                "preview size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vector_ops() {
        let a = Point2::new(3.0, 4.0);
        let b = Point2::new(1.0, 1.0);
        assert_eq!(a - b, Point2::new(2.0, 3.0));
        assert_eq!(a + b * 2.0, Point2::new(5.0, 6.0));
        assert_relative_eq!(a.norm(), 5.0);
        assert_relative_eq!(a.dot(&a.perp()), 0.0);
        assert_eq!(a.scale(2.0, 0.5), Point2::new(6.0, 2.0));
    }

    #[test]
    fn preview_from_json() -> Result<(), serde_json::Error> {
        let preview: PreviewGeometry = serde_json::from_str(r#"{"w": 1024, "h": 768}"#)?;
        assert_eq!(preview, PreviewGeometry::new(1024.0, 768.0));
        assert!(preview.validate().is_ok());
        assert!(PreviewGeometry::new(0.0, 768.0).validate().is_err());
        assert!(PreviewGeometry::new(f64::NAN, 1.0).validate().is_err());
        Ok(())
    }
}
