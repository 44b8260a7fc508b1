//! Plain 2D vector math.

use serde::{Deserialize, Serialize};

/// Direction used whenever a direction has to be derived from a zero-length
/// vector (for example between two concentric circles). Points to the lower
/// right of the screen.
pub const DEFAULT_DIRECTION: Vector = Vector { x: 1.0, y: 1.0 };

/// A 2D vector / point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    /// Create a vector from coordinates that are known to be finite.
    ///
    /// Computed coordinates go through here; untrusted input goes through
    /// [`Vector::try_new`].
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite() && y.is_finite(), "non-finite vector ({}, {})", x, y);
        Self { x, y }
    }

    /// Create a vector from untrusted coordinates, rejecting NaN and infinities.
    pub fn try_new(x: f64, y: f64) -> Result<Self, String> {
        if !x.is_finite() || !y.is_finite() {
            return Err(format!("invalid vector coordinates ({}, {})", x, y));
        }
        Ok(Self { x, y })
    }

    /// The vector pointing from `from` to `to`
    pub fn between(from: Vector, to: Vector) -> Self {
        to.sub(from)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(self, other: Vector) -> f64 {
        Vector::between(self, other).length()
    }

    pub fn add(self, other: Vector) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vector) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Point into the opposite direction
    pub fn revert(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    pub fn revert_if(self, condition: bool) -> Self {
        if condition {
            self.revert()
        } else {
            self
        }
    }

    /// Rotated by 90 degrees (clockwise on screen, where y grows downwards)
    pub fn orthogonal(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn is_null(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Replace a zero-length vector by [`DEFAULT_DIRECTION`].
    pub fn or_default_if_null(self) -> Self {
        if self.is_null() {
            DEFAULT_DIRECTION
        } else {
            self
        }
    }

    /// Rescale the vector to the given length.
    ///
    /// A zero-length vector has no direction, so [`DEFAULT_DIRECTION`] is used
    /// instead of producing NaN coordinates.
    pub fn norm(self, scale: f64) -> Self {
        let direction = self.or_default_if_null();
        let length = direction.length();
        direction.scale(scale / length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_rejects_non_finite() {
        assert!(Vector::try_new(1.0, 2.0).is_ok());
        assert!(Vector::try_new(f64::NAN, 2.0).is_err());
        assert!(Vector::try_new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-finite vector")]
    fn test_new_asserts_finite_coordinates() {
        Vector::new(0.0, 1.0).scale(f64::INFINITY);
    }

    #[test]
    fn test_norm_rescales() {
        let v = Vector::new(3.0, 4.0).norm(10.0);
        assert!((v.x - 6.0).abs() < 1e-9);
        assert!((v.y - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_norm_of_zero_vector_uses_default_direction() {
        let v = Vector::ZERO.norm(2.0_f64.sqrt());
        assert!((v.x - 1.0).abs() < 1e-9);
        assert!((v.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_is_perpendicular() {
        let v = Vector::new(2.0, -5.0);
        let o = v.orthogonal();
        assert_eq!(v.x * o.x + v.y * o.y, 0.0);
        assert_eq!(o.length(), v.length());
    }

    #[test]
    fn test_distance() {
        assert_eq!(Vector::new(1.0, 1.0).distance_to(Vector::new(4.0, 5.0)), 5.0);
    }
}
